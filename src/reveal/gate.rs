//! Reveal gate: Hidden until the wrapped element is first seen, then Visible for good.

use crate::error::MediaError;
use crate::reveal::notifier::{ElementId, VisibilityNotifier, WatchHandle};
use crate::reveal::transition::{RevealFrame, RevealTransition};
use crate::reveal::RevealConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Visibility of a gated subtree. `visible` only ever goes false → true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RevealState {
    pub visible: bool,
    pub revealed_at: Option<Instant>,
}

impl RevealState {
    fn mark_visible(&mut self, at: Instant) -> bool {
        if self.visible {
            return false;
        }
        self.visible = true;
        self.revealed_at = Some(at);
        true
    }
}

/// Gate wrapping one element
pub struct RevealGate {
    watch: WatchHandle,
    notifier: Arc<dyn VisibilityNotifier>,
    state: Arc<Mutex<RevealState>>,
    transition: RevealTransition,
}

impl RevealGate {
    /// Register `element` with `notifier` using the configured threshold.
    pub fn attach(
        notifier: Arc<dyn VisibilityNotifier>,
        element: ElementId,
        config: &RevealConfig,
    ) -> Result<Self, MediaError> {
        Self::attach_with_hook(notifier, element, config, |_| {})
    }

    /// Like `attach`, additionally running `hook` when the element is revealed.
    pub fn attach_with_hook<F>(
        notifier: Arc<dyn VisibilityNotifier>,
        element: ElementId,
        config: &RevealConfig,
        hook: F,
    ) -> Result<Self, MediaError>
    where
        F: FnOnce(ElementId) + Send + 'static,
    {
        let state = Arc::new(Mutex::new(RevealState::default()));
        let target = Arc::clone(&state);
        let watch = notifier.register(
            element,
            config.threshold,
            Box::new(move |element| {
                let newly = target.lock().mark_visible(Instant::now());
                if newly {
                    debug!(element = %element, "Reveal triggered");
                    hook(element);
                }
            }),
        )?;

        Ok(Self {
            watch,
            notifier,
            state,
            transition: config.transition(),
        })
    }

    pub fn element(&self) -> ElementId {
        self.watch.element
    }

    pub fn is_visible(&self) -> bool {
        self.state.lock().visible
    }

    pub fn state(&self) -> RevealState {
        *self.state.lock()
    }

    pub fn transition(&self) -> RevealTransition {
        self.transition
    }

    /// Frame to draw at `now`.
    pub fn frame_at(&self, now: Instant) -> RevealFrame {
        match self.state.lock().revealed_at {
            Some(at) => self.transition.frame(now.saturating_duration_since(at)),
            None => self.transition.hidden(),
        }
    }

    /// Frame to draw `elapsed` after the reveal; the hidden frame if not revealed.
    pub fn frame_after(&self, elapsed: Duration) -> RevealFrame {
        if self.is_visible() {
            self.transition.frame(elapsed)
        } else {
            self.transition.hidden()
        }
    }
}

impl Drop for RevealGate {
    fn drop(&mut self) {
        self.notifier.deregister(self.watch);
    }
}
