//! Media cells: presentation state bound to one generation sequence.

use crate::asset::GeneratedAsset;
use crate::coalesce::{CoalescingHub, SharedLease};
use crate::generation::{GenerationClient, GenerationSnapshot, RequestStatus, RetryPolicy};
use crate::provider::ImageService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// How cells asking for the same prompt obtain their images
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharingMode {
    /// Every cell runs its own request sequence
    #[default]
    Independent,
    /// Cells with the same prompt share one sequence and one asset
    Coalesced,
}

/// Hands each cell its generation source
#[derive(Clone)]
pub struct MediaPipeline {
    service: Arc<dyn ImageService>,
    policy: RetryPolicy,
    hub: Option<Arc<CoalescingHub>>,
}

impl MediaPipeline {
    pub fn new(service: Arc<dyn ImageService>, policy: RetryPolicy, mode: SharingMode) -> Self {
        let hub = match mode {
            SharingMode::Independent => None,
            SharingMode::Coalesced => Some(Arc::new(CoalescingHub::new(
                Arc::clone(&service),
                policy,
            ))),
        };
        Self {
            service,
            policy,
            hub,
        }
    }

    pub fn mode(&self) -> SharingMode {
        if self.hub.is_some() {
            SharingMode::Coalesced
        } else {
            SharingMode::Independent
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn hub(&self) -> Option<&Arc<CoalescingHub>> {
        self.hub.as_ref()
    }

    /// Start (or join) the request sequence for `prompt`.
    pub fn source_for(&self, prompt: &str) -> MediaSource {
        match &self.hub {
            Some(hub) => MediaSource::Shared(hub.acquire(prompt)),
            None => {
                let mut client =
                    GenerationClient::new(prompt, Arc::clone(&self.service), self.policy);
                client.activate();
                MediaSource::Owned(client)
            }
        }
    }
}

/// Where a cell's snapshots come from. Dropping it tears the sequence down.
pub enum MediaSource {
    Owned(GenerationClient),
    Shared(SharedLease),
}

impl MediaSource {
    pub fn subscribe(&self) -> watch::Receiver<GenerationSnapshot> {
        match self {
            MediaSource::Owned(client) => client.subscribe(),
            MediaSource::Shared(lease) => lease.subscribe(),
        }
    }
}

/// Presentation state of a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellState {
    Loading,
    Ready(Arc<GeneratedAsset>),
    Error,
}

impl CellState {
    pub fn label(&self) -> &'static str {
        match self {
            CellState::Loading => "loading",
            CellState::Ready(_) => "ready",
            CellState::Error => "error",
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, CellState::Loading)
    }
}

/// What a cell renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellView {
    Placeholder,
    ErrorMarker { label: &'static str },
    Image { src: String, alt: String },
}

/// One image slot
pub struct MediaCell {
    prompt: String,
    pipeline: MediaPipeline,
    source: Option<MediaSource>,
    receiver: Option<watch::Receiver<GenerationSnapshot>>,
    state: CellState,
    attempts: u32,
}

impl MediaCell {
    /// Mount a cell and start fetching its image.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(prompt: impl Into<String>, pipeline: &MediaPipeline) -> Self {
        let mut cell = Self {
            prompt: prompt.into(),
            pipeline: pipeline.clone(),
            source: None,
            receiver: None,
            state: CellState::Loading,
            attempts: 0,
        };
        cell.activate();
        cell
    }

    fn activate(&mut self) {
        let source = self.pipeline.source_for(&self.prompt);
        self.receiver = Some(source.subscribe());
        self.source = Some(source);
        self.state = CellState::Loading;
        self.attempts = 0;
    }

    /// Change the prompt. Starts a new sequence only when the prompt differs;
    /// returns whether it did.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) -> bool {
        let prompt = prompt.into();
        if prompt == self.prompt && self.is_mounted() {
            return false;
        }
        debug!(mounted = self.is_mounted(), "Media cell prompt changed");
        self.teardown();
        self.prompt = prompt;
        self.activate();
        true
    }

    /// Pull the latest snapshot into the cell. Does nothing once unmounted.
    pub fn refresh(&mut self) -> &CellState {
        if let Some(receiver) = self.receiver.as_mut() {
            let snapshot = receiver.borrow_and_update();
            self.attempts = snapshot.attempts_made();
            self.state = match (snapshot.request.status, snapshot.asset.as_ref()) {
                (RequestStatus::Succeeded, Some(asset)) => CellState::Ready(Arc::clone(asset)),
                (RequestStatus::Failed, _) => CellState::Error,
                _ => CellState::Loading,
            };
        }
        &self.state
    }

    /// Wait until the cell is Ready or Error (or was unmounted).
    pub async fn settle(&mut self) -> &CellState {
        if let Some(receiver) = self.receiver.as_mut() {
            let _ = receiver.wait_for(|snapshot| snapshot.is_terminal()).await;
        }
        self.refresh()
    }

    pub fn state(&self) -> &CellState {
        &self.state
    }

    pub fn view(&self) -> CellView {
        match &self.state {
            CellState::Loading => CellView::Placeholder,
            CellState::Error => CellView::ErrorMarker { label: "Error" },
            CellState::Ready(asset) => CellView::Image {
                src: asset.data_uri(),
                alt: self.prompt.clone(),
            },
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Attempts observed at the last refresh.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_mounted(&self) -> bool {
        self.source.is_some()
    }

    /// Cancel any pending request or retry timer and freeze the cell state.
    pub fn unmount(&mut self) {
        if self.is_mounted() {
            debug!("Media cell unmounted");
        }
        self.teardown();
    }

    fn teardown(&mut self) {
        self.receiver = None;
        self.source = None;
    }
}

impl Drop for MediaCell {
    fn drop(&mut self) {
        self.teardown();
    }
}
