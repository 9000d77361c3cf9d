//! Generation client: one prompt, one request sequence, one terminal outcome.
//!
//! The retry chain runs as a single spawned task that walks
//! Idle → Requesting → RetryWait → Requesting → … → Succeeded | Failed and publishes
//! every transition on a watch channel. The client owns the task handle; `cancel`
//! (or dropping the client) stops the task and suppresses any later publication.

use crate::coalesce::PromptKey;
use crate::generation::backoff::RetryPolicy;
use crate::generation::request::{
    GenerationPhase, GenerationRequest, GenerationSnapshot, RequestStatus,
};
use crate::provider::ImageService;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Publishes snapshots until the owning client is cancelled.
#[derive(Clone)]
struct Publisher {
    state: Arc<watch::Sender<GenerationSnapshot>>,
    cancelled: Arc<AtomicBool>,
}

impl Publisher {
    /// Apply `update` unless the client was cancelled. Returns false once cancelled.
    ///
    /// The flag is read under the channel's write lock, so a publication can never
    /// land after `GenerationClient::cancel` returns.
    fn publish(&self, update: impl FnOnce(&mut GenerationSnapshot)) -> bool {
        let cancelled = &self.cancelled;
        let mut applied = false;
        self.state.send_if_modified(|snapshot| {
            if cancelled.load(Ordering::Acquire) {
                return false;
            }
            update(snapshot);
            applied = true;
            true
        });
        applied
    }
}

/// Generation client for a single prompt
pub struct GenerationClient {
    prompt: String,
    service: Arc<dyn ImageService>,
    policy: RetryPolicy,
    publisher: Publisher,
    task: Option<JoinHandle<()>>,
}

impl GenerationClient {
    /// Create an idle client. Nothing is requested until `activate`.
    pub fn new(
        prompt: impl Into<String>,
        service: Arc<dyn ImageService>,
        policy: RetryPolicy,
    ) -> Self {
        let prompt = prompt.into();
        let (state, _) = watch::channel(GenerationSnapshot::idle(prompt.clone()));
        Self {
            prompt,
            service,
            policy,
            publisher: Publisher {
                state: Arc::new(state),
                cancelled: Arc::new(AtomicBool::new(false)),
            },
            task: None,
        }
    }

    /// Start the request sequence. Idempotent; does nothing after `cancel`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn activate(&mut self) {
        if self.task.is_some() || self.is_cancelled() {
            return;
        }
        let run = AttemptLoop {
            prompt: self.prompt.clone(),
            service: Arc::clone(&self.service),
            policy: self.policy,
            publisher: self.publisher.clone(),
        };
        self.task = Some(tokio::spawn(run.drive()));
    }

    /// Stop the sequence. Any pending retry timer or in-flight call is abandoned
    /// and no snapshot changes after this returns.
    pub fn cancel(&mut self) {
        let cancelled = &self.publisher.cancelled;
        self.publisher.state.send_if_modified(|_| {
            cancelled.store(true, Ordering::Release);
            false
        });
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(
                prompt_key = %PromptKey::of(&self.prompt).short(),
                "Generation client cancelled"
            );
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationSnapshot> {
        self.publisher.state.subscribe()
    }

    pub fn snapshot(&self) -> GenerationSnapshot {
        self.publisher.state.borrow().clone()
    }

    pub fn request(&self) -> GenerationRequest {
        self.publisher.state.borrow().request.clone()
    }

    pub fn phase(&self) -> GenerationPhase {
        self.publisher.state.borrow().phase
    }

    pub fn status(&self) -> RequestStatus {
        self.publisher.state.borrow().request.status
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.publisher.cancelled.load(Ordering::Acquire)
    }

    /// Wait for Succeeded or Failed. Returns the current snapshot if the client
    /// was never activated or has been cancelled.
    pub async fn wait_terminal(&self) -> GenerationSnapshot {
        if self.task.is_none() || self.is_cancelled() {
            return self.snapshot();
        }
        let mut receiver = self.subscribe();
        let settled = match receiver.wait_for(|snapshot| snapshot.is_terminal()).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        settled
    }
}

impl Drop for GenerationClient {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct AttemptLoop {
    prompt: String,
    service: Arc<dyn ImageService>,
    policy: RetryPolicy,
    publisher: Publisher,
}

impl AttemptLoop {
    async fn drive(self) {
        let prompt_key = PromptKey::of(&self.prompt).short();
        let mut attempt: u32 = 0;

        loop {
            if !self.publisher.publish(|snapshot| {
                snapshot.request.attempt = attempt;
                snapshot.phase = GenerationPhase::Requesting;
            }) {
                return;
            }
            debug!(
                prompt_key = %prompt_key,
                attempt,
                service = self.service.service_name(),
                "Requesting generated image"
            );

            match self.service.generate(&self.prompt).await {
                Ok(asset) => {
                    let asset = Arc::new(asset);
                    let fingerprint = asset.fingerprint();
                    if self.publisher.publish(|snapshot| {
                        snapshot.request.status = RequestStatus::Succeeded;
                        snapshot.phase = GenerationPhase::Succeeded;
                        snapshot.asset = Some(asset);
                    }) {
                        info!(
                            prompt_key = %prompt_key,
                            attempts = attempt + 1,
                            fingerprint = %&fingerprint[..16],
                            "Generated image ready"
                        );
                    }
                    return;
                }
                Err(err) => match self.policy.delay_after(attempt) {
                    Some(delay) => {
                        if !self.publisher.publish(|snapshot| {
                            snapshot.phase = GenerationPhase::RetryWait { delay };
                            snapshot.last_error = Some(err.category());
                            snapshot.scheduled_delays.push(delay);
                        }) {
                            return;
                        }
                        warn!(
                            prompt_key = %prompt_key,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            category = err.category(),
                            error = %err,
                            "Generation attempt failed, retrying"
                        );
                        sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        if self.publisher.publish(|snapshot| {
                            snapshot.request.status = RequestStatus::Failed;
                            snapshot.phase = GenerationPhase::Failed;
                            snapshot.last_error = Some(err.category());
                        }) {
                            error!(
                                prompt_key = %prompt_key,
                                attempts = attempt + 1,
                                category = err.category(),
                                error = %err,
                                "Generation failed permanently"
                            );
                        }
                        return;
                    }
                },
            }
        }
    }
}
