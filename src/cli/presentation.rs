//! CLI presentation: text and json formatters per command family.

mod config;
mod media;

pub use config::{format_config_show, format_validation_result};
pub use media::{
    format_generate_result_json, format_generate_result_text, format_strip_result_json,
    format_strip_result_text, GenerateReport, SlotReport, StripReport,
};
