//! Reveal-on-visibility: one-shot entrance transitions gated on viewport presence.

pub mod gate;
pub mod notifier;
pub mod transition;

pub use gate::{RevealGate, RevealState};
pub use notifier::{
    ElementId, GeometryProbe, Rect, ViewportObserver, VisibilityCallback, VisibilityNotifier,
    WatchHandle,
};
pub use transition::{Ease, RevealFrame, RevealTransition};

use serde::{Deserialize, Serialize};

/// Reveal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealConfig {
    /// Fraction of the element's area that must be visible, 0.0..=1.0
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Length of the entrance transition
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,

    /// Initial downward offset, in pixels
    #[serde(default = "default_offset_px")]
    pub offset_px: f64,
}

fn default_threshold() -> f64 {
    0.1
}

fn default_duration_ms() -> u64 {
    1200
}

fn default_offset_px() -> f64 {
    80.0
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            duration_ms: default_duration_ms(),
            offset_px: default_offset_px(),
        }
    }
}

impl RevealConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !notifier::is_valid_threshold(self.threshold) {
            return Err(format!(
                "threshold {} must be within 0.0..=1.0",
                self.threshold
            ));
        }
        if !self.offset_px.is_finite() {
            return Err("offset_px must be finite".to_string());
        }
        Ok(())
    }

    pub fn transition(&self) -> RevealTransition {
        RevealTransition::new(
            std::time::Duration::from_millis(self.duration_ms),
            self.offset_px,
            Ease::CssEaseOut,
        )
    }
}
