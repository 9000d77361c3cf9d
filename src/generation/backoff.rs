//! Exponential backoff schedule.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for a generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts is `max_retries + 1`
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles for each later one
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after `attempt` failed, or `None` once the budget is spent.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Some(Duration::from_millis(
            self.base_delay_ms.saturating_mul(factor),
        ))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Full schedule of retry delays.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_retries)
            .filter_map(|attempt| self.delay_after(attempt))
            .collect()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_retries > 16 {
            return Err(format!(
                "max_retries {} is too large (at most 16)",
                self.max_retries
            ));
        }
        Ok(())
    }
}
