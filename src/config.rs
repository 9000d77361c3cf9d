//! Configuration System
//!
//! Layered configuration for the image pipeline: service endpoint and credential,
//! retry budget, sharing mode, reveal and marquee timing, and logging. Sources
//! merge in a fixed order with environment variable overrides on top.

use crate::cell::SharingMode;
use crate::generation::RetryPolicy;
use crate::logging::LoggingConfig;
use crate::marquee::MarqueeTiming;
use crate::provider::ServiceConfig;
use crate::reveal::RevealConfig;
use serde::{Deserialize, Serialize};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Environment variable carrying the service credential.
pub const API_KEY_ENV: &str = "VITRINE_API_KEY";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VitrineConfig {
    /// Whether cells on the same prompt share one request sequence
    #[serde(default)]
    pub sharing: SharingMode,

    /// Remote image service
    #[serde(default)]
    pub service: ServiceConfig,

    /// Retry budget and backoff base
    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub reveal: RevealConfig,

    #[serde(default)]
    pub marquee: MarqueeTiming,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Service(String),
    Retry(String),
    Reveal(String),
    Marquee(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Service(msg) => write!(f, "Service: {}", msg),
            ValidationError::Retry(msg) => write!(f, "Retry: {}", msg),
            ValidationError::Reveal(msg) => write!(f, "Reveal: {}", msg),
            ValidationError::Marquee(msg) => write!(f, "Marquee: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl VitrineConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.service.validate() {
            errors.push(ValidationError::Service(e));
        }
        if let Err(e) = self.retry.validate() {
            errors.push(ValidationError::Retry(e));
        }
        if let Err(e) = self.reveal.validate() {
            errors.push(ValidationError::Reveal(e));
        }
        if let Err(e) = self.marquee.validate() {
            errors.push(ValidationError::Marquee(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
