//! Visibility notification: register an element with a threshold, get exactly one
//! callback the first time that fraction of it is inside the viewport.
//!
//! `ViewportObserver` is the shared implementation. It works from element geometry:
//! hosts push bounds and viewport changes, or hand it a `GeometryProbe` to poll.
//! Callbacks are `FnOnce` and run after the observer lock is released.

use crate::error::MediaError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};

/// Identifier of an observed element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Axis-aligned rectangle in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Fraction of `self` inside `viewport`. A zero-area element counts as fully
    /// visible when its origin lies inside the viewport.
    pub fn intersection_ratio(&self, viewport: &Rect) -> f64 {
        let area = self.area();
        if area == 0.0 {
            let inside = self.x >= viewport.x
                && self.x <= viewport.x + viewport.width
                && self.y >= viewport.y
                && self.y <= viewport.y + viewport.height;
            return if inside { 1.0 } else { 0.0 };
        }
        let w = (self.x + self.width).min(viewport.x + viewport.width) - self.x.max(viewport.x);
        let h = (self.y + self.height).min(viewport.y + viewport.height) - self.y.max(viewport.y);
        if w <= 0.0 || h <= 0.0 {
            return 0.0;
        }
        (w * h / area).clamp(0.0, 1.0)
    }
}

pub(crate) fn is_valid_threshold(threshold: f64) -> bool {
    (0.0..=1.0).contains(&threshold)
}

/// One registration of an element. Deregistering through a handle only removes
/// the watch it was issued for, never a later registration of the same element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchHandle {
    pub element: ElementId,
    generation: u64,
}

/// Fire-once visibility callback
pub type VisibilityCallback = Box<dyn FnOnce(ElementId) + Send>;

/// Capability to watch elements for their first visibility
pub trait VisibilityNotifier: Send + Sync {
    /// Watch `element`; `callback` runs once when its visible fraction first
    /// reaches `threshold`, after which the element is no longer watched.
    fn register(
        &self,
        element: ElementId,
        threshold: f64,
        callback: VisibilityCallback,
    ) -> Result<WatchHandle, MediaError>;

    /// Stop the watch issued as `handle`. Returns whether it was still pending.
    fn deregister(&self, handle: WatchHandle) -> bool;

    fn is_registered(&self, element: ElementId) -> bool;
}

/// Source of geometry for polling
pub trait GeometryProbe {
    fn viewport(&self) -> Rect;

    fn bounds(&self, element: ElementId) -> Option<Rect>;
}

struct Watch {
    generation: u64,
    threshold: f64,
    callback: VisibilityCallback,
}

struct ObserverState {
    viewport: Rect,
    bounds: HashMap<ElementId, Rect>,
    watches: HashMap<ElementId, Watch>,
    next_generation: u64,
}

impl ObserverState {
    /// Remove and return every watch whose threshold is met.
    fn take_due(&mut self) -> Vec<(ElementId, VisibilityCallback)> {
        let due: Vec<ElementId> = self
            .watches
            .iter()
            .filter(|(element, watch)| {
                self.bounds.get(element).is_some_and(|rect| {
                    let ratio = rect.intersection_ratio(&self.viewport);
                    trace!(element = %element, ratio, "Visibility evaluated");
                    ratio > 0.0 && ratio >= watch.threshold
                })
            })
            .map(|(element, _)| *element)
            .collect();

        due.into_iter()
            .filter_map(|element| {
                self.watches
                    .remove(&element)
                    .map(|watch| (element, watch.callback))
            })
            .collect()
    }
}

/// Shared geometry-backed visibility notifier
pub struct ViewportObserver {
    state: Mutex<ObserverState>,
}

impl ViewportObserver {
    pub fn new(viewport: Rect) -> Self {
        Self {
            state: Mutex::new(ObserverState {
                viewport,
                bounds: HashMap::new(),
                watches: HashMap::new(),
                next_generation: 0,
            }),
        }
    }

    /// Record where `element` is laid out. Returns the number of callbacks fired.
    pub fn set_bounds(&self, element: ElementId, bounds: Rect) -> usize {
        self.update(|state| {
            state.bounds.insert(element, bounds);
        })
    }

    /// Forget an element's geometry (it left the layout).
    pub fn remove_element(&self, element: ElementId) {
        let mut state = self.state.lock();
        state.bounds.remove(&element);
        state.watches.remove(&element);
    }

    /// Move the viewport. Returns the number of callbacks fired.
    pub fn scroll_to(&self, viewport: Rect) -> usize {
        self.update(|state| state.viewport = viewport)
    }

    /// Scroll vertically by `dy` pixels.
    pub fn scroll_by(&self, dy: f64) -> usize {
        self.update(|state| state.viewport = state.viewport.translated(0.0, dy))
    }

    /// Re-read viewport and bounds of every watched element from `probe`.
    pub fn poll(&self, probe: &dyn GeometryProbe) -> usize {
        self.update(|state| {
            state.viewport = probe.viewport();
            let watched: Vec<ElementId> = state.watches.keys().copied().collect();
            for element in watched {
                match probe.bounds(element) {
                    Some(rect) => {
                        state.bounds.insert(element, rect);
                    }
                    None => {
                        state.bounds.remove(&element);
                    }
                }
            }
        })
    }

    pub fn viewport(&self) -> Rect {
        self.state.lock().viewport
    }

    /// Number of elements still waiting for their first visibility.
    pub fn watched_count(&self) -> usize {
        self.state.lock().watches.len()
    }

    fn update(&self, change: impl FnOnce(&mut ObserverState)) -> usize {
        let due = {
            let mut state = self.state.lock();
            change(&mut state);
            state.take_due()
        };
        Self::deliver(due)
    }

    fn deliver(due: Vec<(ElementId, VisibilityCallback)>) -> usize {
        let fired = due.len();
        for (element, callback) in due {
            debug!(element = %element, "Element became visible");
            callback(element);
        }
        fired
    }
}

impl VisibilityNotifier for ViewportObserver {
    fn register(
        &self,
        element: ElementId,
        threshold: f64,
        callback: VisibilityCallback,
    ) -> Result<WatchHandle, MediaError> {
        if !is_valid_threshold(threshold) {
            return Err(MediaError::InvalidThreshold(threshold));
        }
        let (handle, due) = {
            let mut state = self.state.lock();
            if state.watches.contains_key(&element) {
                return Err(MediaError::AlreadyRegistered(element));
            }
            let generation = state.next_generation;
            state.next_generation += 1;
            state.watches.insert(
                element,
                Watch {
                    generation,
                    threshold,
                    callback,
                },
            );
            (
                WatchHandle {
                    element,
                    generation,
                },
                state.take_due(),
            )
        };
        Self::deliver(due);
        Ok(handle)
    }

    fn deregister(&self, handle: WatchHandle) -> bool {
        let mut state = self.state.lock();
        let owned = state
            .watches
            .get(&handle.element)
            .is_some_and(|watch| watch.generation == handle.generation);
        if owned {
            state.watches.remove(&handle.element);
        }
        owned
    }

    fn is_registered(&self, element: ElementId) -> bool {
        self.state.lock().watches.contains_key(&element)
    }
}
