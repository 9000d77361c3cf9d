//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::MediaError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &MediaError) -> String {
    match e {
        MediaError::ConfigError(msg) => format!("Configuration error: {}", msg),
        MediaError::GenerationFailed { attempts } => format!(
            "Image generation failed after {} attempt(s); see logs for per-attempt causes",
            attempts
        ),
        other => format!("Error ({}): {}", other.category(), other),
    }
}
