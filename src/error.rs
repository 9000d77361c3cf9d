//! Error types for the Vitrine media pipeline.

use crate::reveal::ElementId;
use thiserror::Error;

/// Errors raised by the media pipeline, the image service, and configuration.
#[derive(Debug, Clone, Error)]
pub enum MediaError {
    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Service request failed: {0}")]
    ServiceRequestFailed(String),

    #[error("Service authentication failed: {0}")]
    ServiceAuthFailed(String),

    #[error("Service rate limit exceeded: {0}")]
    ServiceRateLimit(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Response is missing the image payload")]
    MissingPayload,

    #[error("Failed to decode image payload: {0}")]
    Decode(String),

    #[error("Generation failed for prompt after {attempts} attempt(s)")]
    GenerationFailed { attempts: u32 },

    #[error("Invalid visibility threshold: {0} (must be within 0.0..=1.0)")]
    InvalidThreshold(f64),

    #[error("Element already registered: {0}")]
    AlreadyRegistered(ElementId),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl MediaError {
    /// Short, stable label for log fields.
    ///
    /// Every failure from the image service counts against the same retry
    /// budget; the category only distinguishes them in diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            MediaError::ServiceError(_) => "service",
            MediaError::ServiceRequestFailed(_) => "status",
            MediaError::ServiceAuthFailed(_) => "auth",
            MediaError::ServiceRateLimit(_) => "rate_limit",
            MediaError::Transport(_) => "transport",
            MediaError::MalformedResponse(_) => "malformed",
            MediaError::MissingPayload => "missing_payload",
            MediaError::Decode(_) => "decode",
            MediaError::GenerationFailed { .. } => "exhausted",
            MediaError::InvalidThreshold(_) => "threshold",
            MediaError::AlreadyRegistered(_) => "registration",
            MediaError::ConfigError(_) => "config",
            MediaError::Io(_) => "io",
        }
    }
}

impl From<config::ConfigError> for MediaError {
    fn from(err: config::ConfigError) -> Self {
        MediaError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for MediaError {
    fn from(err: std::io::Error) -> Self {
        MediaError::Io(err.to_string())
    }
}
