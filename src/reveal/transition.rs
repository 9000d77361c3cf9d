//! Entrance transition curve: translate up from an offset while fading in.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing function
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Ease {
    Linear,
    OutCubic,
    /// CSS `ease-out`, i.e. `cubic-bezier(0, 0, 0.58, 1)`
    CssEaseOut,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::CssEaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
        }
    }
}

/// Evaluate a CSS cubic-bezier timing function at progress `x`.
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
    if x <= 0.0 || x >= 1.0 {
        return x;
    }
    let sample = |a: f64, b: f64, s: f64| {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * a + 3.0 * inv * s * s * b + s * s * s
    };
    // x(s) is monotonic on [0, 1] for x1, x2 within [0, 1]
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    let mut s = x;
    for _ in 0..48 {
        let sx = sample(x1, x2, s);
        if (sx - x).abs() < 1e-9 {
            break;
        }
        if sx < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    sample(y1, y2, s)
}

/// Visual state of a revealed subtree at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RevealFrame {
    pub opacity: f64,
    /// Downward offset in pixels; 0 when settled
    pub translate_y: f64,
}

/// Reveal transition parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealTransition {
    pub duration: Duration,
    pub offset_px: f64,
    pub ease: Ease,
}

impl RevealTransition {
    pub fn new(duration: Duration, offset_px: f64, ease: Ease) -> Self {
        Self {
            duration,
            offset_px,
            ease,
        }
    }

    /// Frame while still hidden.
    pub fn hidden(&self) -> RevealFrame {
        RevealFrame {
            opacity: 0.0,
            translate_y: self.offset_px,
        }
    }

    /// Frame `elapsed` after the reveal started.
    pub fn frame(&self, elapsed: Duration) -> RevealFrame {
        let progress = if self.duration.is_zero() {
            1.0
        } else {
            elapsed.as_secs_f64() / self.duration.as_secs_f64()
        };
        let eased = self.ease.apply(progress);
        RevealFrame {
            opacity: eased,
            translate_y: self.offset_px * (1.0 - eased),
        }
    }

    pub fn is_complete(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}
