//! Environment source: VITRINE__SECTION__KEY variables.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

/// Add `VITRINE__*` overrides, e.g. `VITRINE__RETRY__MAX_RETRIES=3`.
///
/// Single-underscore variables such as `VITRINE_API_KEY` and `VITRINE_LOG`
/// are not matched here.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("VITRINE")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
