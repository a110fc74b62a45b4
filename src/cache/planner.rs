//! Invalidation plan generation.
//!
//! Merges a batch of cache events into a deduplicated list of key patterns.

use std::collections::HashSet;
use std::fmt;

use super::events::{CacheEvent, EventKind};
use super::keys::{CacheKey, KeyPattern, names};

/// Key patterns to invalidate, in first-seen order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub patterns: Vec<KeyPattern>,
    /// Set when the batch contained `SessionEnded`; `patterns` is then `[All]`.
    pub clear_all: bool,
}

impl fmt::Display for InvalidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InvalidationPlan {{ clear_all: {}, patterns: [", self.clear_all)?;
        for (index, pattern) in self.patterns.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{pattern}")?;
        }
        f.write_str("] }")
    }
}

fn exact(name: &'static str, id: i64) -> KeyPattern {
    KeyPattern::Exact(CacheKey::new(name).with(id))
}

/// Patterns made stale by one event.
pub fn patterns_for(kind: &EventKind) -> Vec<KeyPattern> {
    let post_feeds = || {
        vec![
            KeyPattern::collection(names::POSTS),
            KeyPattern::collection(names::MY_POSTS),
            KeyPattern::collection(names::USER_POSTS),
        ]
    };
    let listing_feeds = || {
        vec![
            KeyPattern::collection(names::LISTINGS),
            KeyPattern::collection(names::MY_LISTINGS),
        ]
    };

    match kind {
        EventKind::PostCreated => post_feeds(),
        EventKind::PostEdited { post_id } => {
            let mut patterns = post_feeds();
            patterns.push(exact(names::POST, *post_id));
            patterns
        }
        EventKind::PostDeleted { post_id } => {
            let mut patterns = post_feeds();
            patterns.push(exact(names::POST, *post_id));
            patterns.push(KeyPattern::Prefix(
                CacheKey::new(names::POST_COMMENTS).with(*post_id),
            ));
            patterns
        }
        EventKind::CommentCreated { post_id } | EventKind::CommentDeleted { post_id } => vec![
            KeyPattern::Prefix(CacheKey::new(names::POST_COMMENTS).with(*post_id)),
            exact(names::POST, *post_id),
        ],
        EventKind::ListingCreated => listing_feeds(),
        EventKind::ListingEdited { listing_id }
        | EventKind::ListingDeleted { listing_id }
        | EventKind::ListingSold { listing_id } => {
            let mut patterns = listing_feeds();
            patterns.push(exact(names::LISTING, *listing_id));
            patterns
        }
        EventKind::VehicleCreated => vec![KeyPattern::collection(names::MY_VEHICLES)],
        EventKind::VehicleEdited { vehicle_id } | EventKind::VehicleDeleted { vehicle_id } => vec![
            KeyPattern::collection(names::MY_VEHICLES),
            exact(names::VEHICLE, *vehicle_id),
        ],
        EventKind::EventCreated => vec![KeyPattern::collection(names::EVENTS)],
        EventKind::EventEdited { event_id } | EventKind::EventDeleted { event_id } => vec![
            KeyPattern::collection(names::EVENTS),
            exact(names::EVENT, *event_id),
        ],
        EventKind::SessionEnded => vec![KeyPattern::All],
    }
}

impl InvalidationPlan {
    /// Merge events into a plan.
    ///
    /// Duplicate event ids and duplicate patterns are dropped. A
    /// `SessionEnded` anywhere in the batch collapses the plan to `All`.
    pub fn from_events(events: Vec<CacheEvent>) -> Self {
        let mut seen_ids = HashSet::new();
        let mut seen_patterns = HashSet::new();
        let mut plan = Self::default();

        for event in events.into_iter().filter(|event| seen_ids.insert(event.id)) {
            if event.kind == EventKind::SessionEnded {
                plan.clear_all = true;
            }
            for pattern in patterns_for(&event.kind) {
                if seen_patterns.insert(pattern.clone()) {
                    plan.patterns.push(pattern);
                }
            }
        }

        if plan.clear_all {
            plan.patterns = vec![KeyPattern::All];
        }
        plan
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
