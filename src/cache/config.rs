//! Cache configuration.
//!
//! Controls collection/query store capacity, search debouncing, viewport
//! prefetch margin and optimistic rollback via the `[cache]` section of
//! `motorhub.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_COLLECTION_LIMIT: usize = 64;
const DEFAULT_QUERY_LIMIT: usize = 256;
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
const DEFAULT_CONSUME_BATCH_LIMIT: usize = 100;
const DEFAULT_VIEWPORT_ROOT_MARGIN: f32 = 0.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Disables invalidation events when false; collections still work but
    /// are never marked stale by mutations.
    pub enabled: bool,
    /// Maximum collection entries kept per store.
    pub collection_limit: usize,
    /// Maximum single-value query entries kept per store.
    pub query_limit: usize,
    /// Quiescence window for text-search filters.
    pub search_debounce_ms: u64,
    /// Undo optimistic toggles when the server call fails.
    pub rollback_on_failure: bool,
    /// Maximum invalidation events per consumption batch.
    pub consume_batch_limit: usize,
    /// Extra distance around the viewport within which the sentinel counts
    /// as visible.
    pub viewport_root_margin: f32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            collection_limit: DEFAULT_COLLECTION_LIMIT,
            query_limit: DEFAULT_QUERY_LIMIT,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            rollback_on_failure: true,
            consume_batch_limit: DEFAULT_CONSUME_BATCH_LIMIT,
            viewport_root_margin: DEFAULT_VIEWPORT_ROOT_MARGIN,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            collection_limit: settings.collection_limit.get(),
            query_limit: settings.query_limit.get(),
            search_debounce_ms: u64::try_from(settings.search_debounce.as_millis())
                .unwrap_or(u64::MAX),
            rollback_on_failure: settings.rollback_on_failure,
            consume_batch_limit: settings.consume_batch_limit.get(),
            viewport_root_margin: settings.viewport_root_margin,
        }
    }
}

impl CacheConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Collection limit as NonZeroUsize, clamping to 1 if zero.
    pub fn collection_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.collection_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Query limit as NonZeroUsize, clamping to 1 if zero.
    pub fn query_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.query_limit).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Batch limit for the consumer; zero would stall the queue, so clamp to 1.
    pub fn consume_batch_limit(&self) -> usize {
        self.consume_batch_limit.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert!(config.rollback_on_failure);
        assert_eq!(config.collection_limit, 64);
        assert_eq!(config.query_limit, 256);
        assert_eq!(config.search_debounce(), Duration::from_millis(300));
        assert_eq!(config.consume_batch_limit, 100);
        assert!(config.viewport_root_margin.abs() < f32::EPSILON);
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            collection_limit: 0,
            query_limit: 0,
            consume_batch_limit: 0,
            ..Default::default()
        };
        assert_eq!(config.collection_limit_non_zero().get(), 1);
        assert_eq!(config.query_limit_non_zero().get(), 1);
        assert_eq!(config.consume_batch_limit(), 1);
    }

    #[test]
    fn deserializes_partial_table_with_defaults() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"search_debounce_ms": 500, "rollback_on_failure": false}"#)
                .expect("partial config");
        assert_eq!(config.search_debounce(), Duration::from_millis(500));
        assert!(!config.rollback_on_failure);
        assert_eq!(config.collection_limit, 64);
    }
}
