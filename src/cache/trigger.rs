//! Cache trigger service.
//!
//! Publishes invalidation events after confirmed writes and, by default,
//! consumes them right away so the next read sees fresh data.

use std::sync::Arc;

use motorhub_api_types::{EventId, ListingId, PostId, VehicleId};
use tracing::debug;

use super::config::CacheConfig;
use super::consumer::CacheConsumer;
use super::events::{EventKind, EventQueue};

pub struct CacheTrigger {
    config: CacheConfig,
    queue: Arc<EventQueue>,
    consumer: Arc<CacheConsumer>,
}

impl CacheTrigger {
    pub fn new(config: CacheConfig, queue: Arc<EventQueue>, consumer: Arc<CacheConsumer>) -> Self {
        Self {
            config,
            queue,
            consumer,
        }
    }

    /// Publish an event and optionally consume immediately.
    ///
    /// Without `consume_now` the event waits for the next explicit
    /// `consumer().consume()`.
    pub fn trigger(&self, kind: EventKind, consume_now: bool) {
        if !self.config.is_enabled() {
            debug!(event_kind = ?kind, "Cache trigger skipped: cache disabled");
            return;
        }

        self.queue.publish(kind);

        if consume_now {
            self.consumer.consume();
        }
    }

    pub fn post_created(&self) {
        self.trigger(EventKind::PostCreated, true);
    }

    pub fn post_edited(&self, post_id: PostId) {
        self.trigger(EventKind::PostEdited { post_id }, true);
    }

    pub fn post_deleted(&self, post_id: PostId) {
        self.trigger(EventKind::PostDeleted { post_id }, true);
    }

    pub fn comment_created(&self, post_id: PostId) {
        self.trigger(EventKind::CommentCreated { post_id }, true);
    }

    pub fn comment_deleted(&self, post_id: PostId) {
        self.trigger(EventKind::CommentDeleted { post_id }, true);
    }

    pub fn listing_created(&self) {
        self.trigger(EventKind::ListingCreated, true);
    }

    pub fn listing_edited(&self, listing_id: ListingId) {
        self.trigger(EventKind::ListingEdited { listing_id }, true);
    }

    pub fn listing_deleted(&self, listing_id: ListingId) {
        self.trigger(EventKind::ListingDeleted { listing_id }, true);
    }

    pub fn listing_sold(&self, listing_id: ListingId) {
        self.trigger(EventKind::ListingSold { listing_id }, true);
    }

    pub fn vehicle_created(&self) {
        self.trigger(EventKind::VehicleCreated, true);
    }

    pub fn vehicle_edited(&self, vehicle_id: VehicleId) {
        self.trigger(EventKind::VehicleEdited { vehicle_id }, true);
    }

    pub fn vehicle_deleted(&self, vehicle_id: VehicleId) {
        self.trigger(EventKind::VehicleDeleted { vehicle_id }, true);
    }

    pub fn event_created(&self) {
        self.trigger(EventKind::EventCreated, true);
    }

    pub fn event_edited(&self, event_id: EventId) {
        self.trigger(EventKind::EventEdited { event_id }, true);
    }

    pub fn event_deleted(&self, event_id: EventId) {
        self.trigger(EventKind::EventDeleted { event_id }, true);
    }

    /// Session teardown always clears the cache, even when event-driven
    /// invalidation is disabled: cached data belongs to the old user.
    pub fn session_ended(&self) {
        self.queue.publish(EventKind::SessionEnded);
        self.consumer.consume();
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    pub fn consumer(&self) -> &Arc<CacheConsumer> {
        &self.consumer
    }
}
