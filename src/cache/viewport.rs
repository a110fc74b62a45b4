//! Scroll-driven "load more" detection.
//!
//! A zero-height sentinel sits after the last rendered item. Whenever the
//! sentinel is inside the viewport (optionally widened by a root margin) and
//! the collection is idle in `Loaded`, the next page is requested. The check
//! is level-triggered: callers evaluate it on every scroll or layout change.

use crate::application::error::ApiError;

use super::collection::InfiniteCollection;
use super::entry::{CollectionState, FetchOutcome};

/// The visible window of the scroll content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_offset: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(scroll_offset: f32, height: f32) -> Self {
        Self {
            scroll_offset,
            height: height.max(0.0),
        }
    }

    pub fn bottom(&self) -> f32 {
        self.scroll_offset + self.height
    }
}

/// Zero-height marker positioned within the scroll content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sentinel {
    pub offset: f32,
}

impl Sentinel {
    pub fn new(offset: f32) -> Self {
        Self { offset }
    }

    /// Whether the sentinel lies within `viewport` grown by `root_margin` on
    /// both edges.
    pub fn intersects(&self, viewport: &Viewport, root_margin: f32) -> bool {
        let top = viewport.scroll_offset - root_margin;
        let bottom = viewport.bottom() + root_margin;
        (top..=bottom).contains(&self.offset)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    NotVisible,
    /// Visible, but the collection was not `Loaded` (first load not started,
    /// a fetch in flight, failed, or exhausted).
    Idle(CollectionState),
    Fetched(FetchOutcome),
    Failed(ApiError),
}

pub struct ViewportTrigger<T> {
    collection: InfiniteCollection<T>,
    sentinel: Sentinel,
    root_margin: f32,
}

impl<T: Send + Sync> ViewportTrigger<T> {
    pub fn new(collection: InfiniteCollection<T>, sentinel: Sentinel, root_margin: f32) -> Self {
        Self {
            collection,
            sentinel,
            root_margin: root_margin.max(0.0),
        }
    }

    /// Move the sentinel, typically to the new end of content after a page
    /// was rendered.
    pub fn set_sentinel(&mut self, sentinel: Sentinel) {
        self.sentinel = sentinel;
    }

    pub fn sentinel(&self) -> Sentinel {
        self.sentinel
    }

    pub fn collection(&self) -> &InfiniteCollection<T> {
        &self.collection
    }

    pub async fn evaluate(&self, viewport: &Viewport) -> TriggerOutcome {
        let in_view = self.sentinel.intersects(viewport, self.root_margin);
        self.evaluate_visibility(in_view).await
    }

    /// Same as `evaluate` for callers that compute intersection themselves.
    pub async fn evaluate_visibility(&self, in_view: bool) -> TriggerOutcome {
        if !in_view {
            return TriggerOutcome::NotVisible;
        }
        let state = self.collection.state();
        if state != CollectionState::Loaded {
            return TriggerOutcome::Idle(state);
        }
        match self.collection.get_next_page().await {
            Ok(outcome) => TriggerOutcome::Fetched(outcome),
            Err(err) => TriggerOutcome::Failed(err),
        }
    }
}
