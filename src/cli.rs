//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands};
pub use presentation::{
    format_config_show, format_generate_result_json, format_generate_result_text,
    format_strip_result_json, format_strip_result_text, format_validation_result,
    GenerateReport, SlotReport, StripReport,
};
pub use route::RunContext;
