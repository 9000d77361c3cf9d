//! Config command presentation: show and validate.

use crate::config::{ValidationError, VitrineConfig};
use crate::error::MediaError;

const REDACTED: &str = "********";

/// Render the merged configuration with the credential masked.
pub fn format_config_show(config: &VitrineConfig, format: &str) -> Result<String, MediaError> {
    let mut shown = config.clone();
    if shown.service.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
        shown.service.api_key = Some(REDACTED.to_string());
    }
    match format {
        "json" => serde_json::to_string_pretty(&shown)
            .map_err(|e| MediaError::ConfigError(format!("Failed to render config: {}", e))),
        "toml" => toml::to_string_pretty(&shown)
            .map_err(|e| MediaError::ConfigError(format!("Failed to render config: {}", e))),
        other => Err(MediaError::ConfigError(format!(
            "Unknown format '{}' (use toml or json)",
            other
        ))),
    }
}

pub fn format_validation_result(result: &Result<(), Vec<ValidationError>>) -> String {
    match result {
        Ok(()) => "Configuration is valid".to_string(),
        Err(errors) => {
            let mut output = format!("Configuration has {} error(s):", errors.len());
            for error in errors {
                output.push_str(&format!("\n  - {}", error));
            }
            output
        }
    }
}
