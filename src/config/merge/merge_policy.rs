//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key; absent sections fall back
/// to the serde defaults of their structs.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("sharing", "independent")?
        .set_default("retry.max_retries", 5)?
        .set_default("retry.base_delay_ms", 1000)?
        .set_default("reveal.threshold", 0.1)
}
