//! Cache consumer.
//!
//! Drains the event queue, plans the batch and invalidates matching entries
//! in every registered store.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::config::CacheConfig;
use super::events::EventQueue;
use super::planner::InvalidationPlan;
use super::registry::CacheRegistry;

const METRIC_CACHE_CONSUME_MS: &str = "motorhub_cache_consume_ms";
const METRIC_CACHE_INVALIDATED_TOTAL: &str = "motorhub_cache_invalidated_total";

pub struct CacheConsumer {
    config: CacheConfig,
    registry: Arc<CacheRegistry>,
    queue: Arc<EventQueue>,
}

impl CacheConsumer {
    pub fn new(config: CacheConfig, registry: Arc<CacheRegistry>, queue: Arc<EventQueue>) -> Self {
        Self {
            config,
            registry,
            queue,
        }
    }

    /// Consume every pending event, one batch at a time.
    ///
    /// Returns the number of entries invalidated across all stores.
    #[instrument(skip(self))]
    pub fn consume(&self) -> usize {
        let mut total = 0;
        loop {
            let events = self.queue.drain(self.config.consume_batch_limit());
            if events.is_empty() {
                return total;
            }
            total += self.consume_batch(events);
        }
    }

    fn consume_batch(&self, events: Vec<super::events::CacheEvent>) -> usize {
        let started_at = Instant::now();
        let event_count = events.len();
        let event_ids: Vec<Uuid> = events.iter().map(|event| event.id).collect();
        let plan = InvalidationPlan::from_events(events);

        info!(
            event_count,
            event_ids = ?event_ids,
            plan = %plan,
            "Cache consumption starting"
        );

        let mut invalidated = 0;
        for pattern in &plan.patterns {
            for (store, count) in self.registry.invalidate(pattern) {
                debug!(store, %pattern, count, "Store entries invalidated");
                counter!(METRIC_CACHE_INVALIDATED_TOTAL, "store" => store).increment(count as u64);
                invalidated += count;
            }
        }

        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_CACHE_CONSUME_MS).record(elapsed_ms);
        info!(
            event_count,
            invalidated,
            elapsed_ms,
            "Cache consumption completed"
        );
        invalidated
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    pub fn registry(&self) -> &Arc<CacheRegistry> {
        &self.registry
    }
}
