//! Cache event system.
//!
//! Mutations publish events describing what changed on the backend; the
//! consumer turns them into invalidations.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::gauge;
use motorhub_api_types::{EventId, ListingId, PostId, VehicleId};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::lock::mutex_lock;

const SOURCE: &str = "cache::events";
const METRIC_EVENT_QUEUE_LEN: &str = "motorhub_cache_event_queue_len";

/// Monotonic epoch for ordering events within this process.
pub type Epoch = u64;

#[derive(Debug, Clone)]
pub struct CacheEvent {
    /// Unique identifier for idempotency (UUIDv4).
    pub id: Uuid,
    pub epoch: Epoch,
    pub kind: EventKind,
    pub timestamp: OffsetDateTime,
}

impl CacheEvent {
    pub fn new(kind: EventKind, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            kind,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Confirmed backend writes that make cached collections stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    // Community
    PostCreated,
    PostEdited { post_id: PostId },
    PostDeleted { post_id: PostId },
    CommentCreated { post_id: PostId },
    CommentDeleted { post_id: PostId },

    // Marketplace
    ListingCreated,
    ListingEdited { listing_id: ListingId },
    ListingDeleted { listing_id: ListingId },
    ListingSold { listing_id: ListingId },
    VehicleCreated,
    VehicleEdited { vehicle_id: VehicleId },
    VehicleDeleted { vehicle_id: VehicleId },

    // Calendar
    EventCreated,
    EventEdited { event_id: EventId },
    EventDeleted { event_id: EventId },

    /// Logout or a rejected token; nothing cached belongs to anyone anymore.
    SessionEnded,
}

/// In-memory FIFO of pending cache events.
pub struct EventQueue {
    queue: Mutex<VecDeque<CacheEvent>>,
    epoch_counter: AtomicU64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            epoch_counter: AtomicU64::new(0),
        }
    }

    pub fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }

    pub fn publish(&self, kind: EventKind) {
        let epoch = self.next_epoch();
        let event = CacheEvent::new(kind, epoch);

        info!(
            event_id = %event.id,
            event_epoch = event.epoch,
            event_kind = ?event.kind,
            "Cache event enqueued"
        );

        let mut queue = mutex_lock(&self.queue, SOURCE, "publish");
        queue.push_back(event);
        gauge!(METRIC_EVENT_QUEUE_LEN).set(queue.len() as f64);
    }

    /// Drain up to `limit` events in FIFO order.
    pub fn drain(&self, limit: usize) -> Vec<CacheEvent> {
        let mut queue = mutex_lock(&self.queue, SOURCE, "drain");
        let count = limit.min(queue.len());
        let events = queue.drain(..count).collect();
        gauge!(METRIC_EVENT_QUEUE_LEN).set(queue.len() as f64);
        events
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.queue, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        mutex_lock(&self.queue, SOURCE, "clear").clear();
        gauge!(METRIC_EVENT_QUEUE_LEN).set(0.0);
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    #[test]
    fn event_creation() {
        let event = CacheEvent::new(EventKind::PostCreated, 42);

        assert_eq!(event.epoch, 42);
        assert_eq!(event.kind, EventKind::PostCreated);
        assert!(!event.id.is_nil());
    }

    #[test]
    fn epoch_monotonicity() {
        let queue = EventQueue::new();

        let e1 = queue.next_epoch();
        let e2 = queue.next_epoch();
        assert!(e1 < e2);
    }

    #[test]
    fn publish_and_drain_in_order() {
        let queue = EventQueue::new();

        queue.publish(EventKind::PostCreated);
        queue.publish(EventKind::CommentCreated { post_id: 7 });
        queue.publish(EventKind::SessionEnded);
        assert_eq!(queue.len(), 3);

        let events = queue.drain(2);
        assert_eq!(events.len(), 2);
        assert_eq!(queue.len(), 1);
        assert_eq!(events[0].kind, EventKind::PostCreated);
        assert_eq!(events[1].kind, EventKind::CommentCreated { post_id: 7 });
        assert!(events[0].epoch < events[1].epoch);
    }

    #[test]
    fn drain_more_than_available() {
        let queue = EventQueue::new();
        queue.publish(EventKind::ListingCreated);

        assert_eq!(queue.drain(100).len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn clear_queue() {
        let queue = EventQueue::new();
        queue.publish(EventKind::EventCreated);
        queue.publish(EventKind::VehicleCreated);

        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn event_queue_recovers_from_poisoned_lock() {
        let queue = EventQueue::new();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = queue.queue.lock().expect("queue lock should be acquired");
            panic!("poison queue lock");
        }));

        queue.publish(EventKind::PostCreated);
        assert_eq!(queue.len(), 1);
    }
}
