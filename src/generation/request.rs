//! Generation request state published by a client to its subscribers.

use crate::asset::GeneratedAsset;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Outcome status of a generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Succeeded,
    Failed,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// One prompt's request sequence. `attempt` counts from 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub attempt: u32,
    pub status: RequestStatus,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            attempt: 0,
            status: RequestStatus::Pending,
        }
    }

    /// Total number of calls issued so far, counting the current one.
    pub fn attempts_made(&self, phase: &GenerationPhase) -> u32 {
        match phase {
            GenerationPhase::Idle => 0,
            _ => self.attempt + 1,
        }
    }
}

/// Where the retry state machine currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum GenerationPhase {
    Idle,
    Requesting,
    RetryWait {
        #[serde(rename = "delay_ms", serialize_with = "serialize_millis")]
        delay: Duration,
    },
    Succeeded,
    Failed,
}

fn serialize_millis<S: serde::Serializer>(delay: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(delay.as_millis() as u64)
}

impl GenerationPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, GenerationPhase::Succeeded | GenerationPhase::Failed)
    }
}

/// Point-in-time view of a client.
#[derive(Debug, Clone)]
pub struct GenerationSnapshot {
    pub request: GenerationRequest,
    pub phase: GenerationPhase,
    pub asset: Option<Arc<GeneratedAsset>>,
    /// Category of the most recent failure, for diagnostics only
    pub last_error: Option<&'static str>,
    /// Backoff delays scheduled so far, in order
    pub scheduled_delays: Vec<Duration>,
}

impl GenerationSnapshot {
    pub fn idle(prompt: impl Into<String>) -> Self {
        Self {
            request: GenerationRequest::new(prompt),
            phase: GenerationPhase::Idle,
            asset: None,
            last_error: None,
            scheduled_delays: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.request.status.is_terminal()
    }

    pub fn attempts_made(&self) -> u32 {
        self.request.attempts_made(&self.phase)
    }
}
