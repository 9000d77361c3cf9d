//! Endless strips: a prompt list duplicated into 2N cells that scroll without a seam.
//!
//! The strip holds the list concatenated with itself. Translating by exactly
//! one copy's extent per cycle lands slot `i + N` where slot `i` started, so
//! the wrap back to zero is invisible.

use crate::cell::{CellState, CellView, MediaCell, MediaPipeline};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Scroll direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

/// Speed tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedTier {
    Slow,
    #[default]
    Normal,
}

impl std::str::FromStr for SpeedTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "slow" => Ok(SpeedTier::Slow),
            "normal" => Ok(SpeedTier::Normal),
            other => Err(format!("Invalid speed tier: {}", other)),
        }
    }
}

/// Cycle lengths per tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarqueeTiming {
    #[serde(default = "default_slow_secs")]
    pub slow_secs: u64,

    #[serde(default = "default_normal_secs")]
    pub normal_secs: u64,

    /// Reverse strips run at this length whatever their tier
    #[serde(default = "default_reverse_secs")]
    pub reverse_secs: u64,
}

fn default_slow_secs() -> u64 {
    80
}

fn default_normal_secs() -> u64 {
    50
}

fn default_reverse_secs() -> u64 {
    60
}

impl Default for MarqueeTiming {
    fn default() -> Self {
        Self {
            slow_secs: default_slow_secs(),
            normal_secs: default_normal_secs(),
            reverse_secs: default_reverse_secs(),
        }
    }
}

impl MarqueeTiming {
    pub fn validate(&self) -> Result<(), String> {
        for (name, secs) in [
            ("slow_secs", self.slow_secs),
            ("normal_secs", self.normal_secs),
            ("reverse_secs", self.reverse_secs),
        ] {
            if secs == 0 {
                return Err(format!("{} must be greater than 0", name));
            }
        }
        Ok(())
    }

    pub fn cycle(&self, direction: Direction, speed: SpeedTier) -> Duration {
        let secs = match (direction, speed) {
            (Direction::Reverse, _) => self.reverse_secs,
            (Direction::Forward, SpeedTier::Slow) => self.slow_secs,
            (Direction::Forward, SpeedTier::Normal) => self.normal_secs,
        };
        Duration::from_secs(secs)
    }
}

/// Position in the duplicated sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoopSlot {
    pub index: usize,
    /// Index into the original prompt list
    pub prompt_index: usize,
    /// 0 for the first copy, 1 for the duplicate
    pub pass: usize,
}

/// Expand `prompt_count` prompts into the 2N slot layout.
pub fn loop_slots(prompt_count: usize) -> Vec<LoopSlot> {
    (0..prompt_count * 2)
        .map(|index| LoopSlot {
            index,
            prompt_index: index % prompt_count,
            pass: index / prompt_count,
        })
        .collect()
}

/// Looping strip of media cells
pub struct LoopCompositor {
    pipeline: MediaPipeline,
    prompts: Arc<[String]>,
    slots: Vec<LoopSlot>,
    cells: Vec<MediaCell>,
    direction: Direction,
    speed: SpeedTier,
    timing: MarqueeTiming,
}

impl LoopCompositor {
    /// Mount one cell per slot. Must be called from within a tokio runtime.
    pub fn mount(
        pipeline: &MediaPipeline,
        prompts: Arc<[String]>,
        direction: Direction,
        speed: SpeedTier,
        timing: MarqueeTiming,
    ) -> Self {
        let mut compositor = Self {
            pipeline: pipeline.clone(),
            prompts,
            slots: Vec::new(),
            cells: Vec::new(),
            direction,
            speed,
            timing,
        };
        compositor.build();
        compositor
    }

    fn build(&mut self) {
        self.slots = loop_slots(self.prompts.len());
        self.cells = self
            .slots
            .iter()
            .map(|slot| MediaCell::mount(self.prompts[slot.prompt_index].as_str(), &self.pipeline))
            .collect();
        debug!(
            prompts = self.prompts.len(),
            slots = self.slots.len(),
            direction = ?self.direction,
            "Loop compositor built"
        );
    }

    /// Replace the prompt list. Rebuilds only when `prompts` is a different
    /// list than the current one; returns whether it did.
    pub fn set_prompts(&mut self, prompts: Arc<[String]>) -> bool {
        if Arc::ptr_eq(&self.prompts, &prompts) {
            return false;
        }
        self.unmount();
        self.prompts = prompts;
        self.build();
        true
    }

    pub fn prompts(&self) -> &Arc<[String]> {
        &self.prompts
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[LoopSlot] {
        &self.slots
    }

    pub fn cells(&self) -> &[MediaCell] {
        &self.cells
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn speed(&self) -> SpeedTier {
        self.speed
    }

    pub fn refresh_all(&mut self) {
        for cell in &mut self.cells {
            cell.refresh();
        }
    }

    /// Wait for every cell to reach Ready or Error.
    pub async fn settle_all(&mut self) {
        join_all(self.cells.iter_mut().map(|cell| cell.settle())).await;
    }

    pub fn is_settled(&self) -> bool {
        self.cells.iter().all(|cell| cell.state().is_settled())
    }

    pub fn states(&self) -> Vec<&CellState> {
        self.cells.iter().map(MediaCell::state).collect()
    }

    pub fn views(&self) -> Vec<CellView> {
        self.cells.iter().map(MediaCell::view).collect()
    }

    pub fn cycle_duration(&self) -> Duration {
        self.timing.cycle(self.direction, self.speed)
    }

    /// Strip offset `elapsed` into the animation, for a copy `copy_extent` long.
    pub fn translation_at(&self, elapsed: Duration, copy_extent: f64) -> f64 {
        let cycle = self.cycle_duration().as_secs_f64();
        if cycle <= 0.0 {
            return 0.0;
        }
        let progress = (elapsed.as_secs_f64() % cycle) / cycle;
        match self.direction {
            Direction::Forward => -copy_extent * progress,
            Direction::Reverse => -copy_extent * (1.0 - progress),
        }
    }

    /// Slot at the leading edge when the strip is translated by `offset`.
    pub fn slot_at(&self, offset: f64, slot_extent: f64) -> Option<&LoopSlot> {
        if self.slots.is_empty() || slot_extent <= 0.0 || !offset.is_finite() {
            return None;
        }
        let raw = (-offset / slot_extent).floor() as i64;
        let index = raw.rem_euclid(self.slots.len() as i64) as usize;
        self.slots.get(index)
    }

    /// Unmount every cell. Pending requests and retry timers are cancelled.
    pub fn unmount(&mut self) {
        for cell in &mut self.cells {
            cell.unmount();
        }
        self.cells.clear();
        self.slots.clear();
    }
}
