//! Single-value query storage.
//!
//! Holds non-paginated reads (entity details, the events of one month, the
//! current user's vehicles) keyed like collections so the same invalidation
//! patterns reach them.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use lru::LruCache;
use metrics::counter;
use tracing::debug;

use crate::application::error::ApiError;

use super::item::{Contains, Identified, ItemSnapshots};
use super::keys::{CacheKey, KeyPattern};
use super::lock::{rw_read, rw_write};
use super::registry::Invalidate;

const METRIC_QUERY_HIT_TOTAL: &str = "motorhub_query_hit_total";
const METRIC_QUERY_MISS_TOTAL: &str = "motorhub_query_miss_total";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Empty,
    Loading,
    Ready,
    Error,
}

struct QueryEntry<V> {
    value: Option<Arc<V>>,
    state: QueryState,
    error: Option<ApiError>,
    generation: u64,
}

pub struct QueryStore<V> {
    label: &'static str,
    entries: RwLock<LruCache<CacheKey, QueryEntry<V>>>,
    generations: AtomicU64,
}

impl<V> QueryStore<V> {
    pub fn new(label: &'static str, capacity: NonZeroUsize) -> Self {
        Self {
            label,
            entries: RwLock::new(LruCache::new(capacity)),
            generations: AtomicU64::new(0),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn state(&self, key: &CacheKey) -> QueryState {
        rw_read(&self.entries, self.label, "state")
            .peek(key)
            .map_or(QueryState::Empty, |entry| entry.state)
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<V>> {
        rw_write(&self.entries, self.label, "get")
            .get(key)
            .and_then(|entry| entry.value.clone())
    }

    pub fn last_error(&self, key: &CacheKey) -> Option<ApiError> {
        rw_read(&self.entries, self.label, "last_error")
            .peek(key)
            .and_then(|entry| entry.error.clone())
    }

    /// Store a server-confirmed value, replacing whatever was cached.
    pub fn set(&self, key: CacheKey, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let entry = QueryEntry {
            value: Some(value.clone()),
            state: QueryState::Ready,
            error: None,
            generation: self.next_generation(),
        };
        rw_write(&self.entries, self.label, "set").put(key, entry);
        value
    }

    /// Return the cached value for `key`, or run `fetch` and cache its result.
    ///
    /// Concurrent loads of the same key each issue their own request; the
    /// last one to finish wins. A load whose entry was invalidated while it
    /// was in flight still returns its value but does not cache it.
    pub async fn load<F, Fut>(&self, key: &CacheKey, fetch: F) -> Result<Arc<V>, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>>,
    {
        if let Some(value) = self.get(key) {
            counter!(METRIC_QUERY_HIT_TOTAL, "store" => self.label).increment(1);
            return Ok(value);
        }
        counter!(METRIC_QUERY_MISS_TOTAL, "store" => self.label).increment(1);

        let generation = self.next_generation();
        {
            let mut entries = rw_write(&self.entries, self.label, "load");
            let previous = entries.pop(key);
            entries.put(
                key.clone(),
                QueryEntry {
                    value: None,
                    state: QueryState::Loading,
                    error: previous.and_then(|entry| entry.error),
                    generation,
                },
            );
        }

        let result = fetch().await.map(Arc::new);

        let mut entries = rw_write(&self.entries, self.label, "load");
        match entries.peek_mut(key) {
            Some(entry) if entry.generation == generation => match &result {
                Ok(value) => {
                    entry.value = Some(value.clone());
                    entry.state = QueryState::Ready;
                    entry.error = None;
                }
                Err(err) => {
                    entry.state = QueryState::Error;
                    entry.error = Some(err.clone());
                }
            },
            _ => {
                debug!(store = self.label, key = %key, "Stale query response not cached");
            }
        }
        result
    }

    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.remove_matching(&KeyPattern::Exact(key.clone())) > 0
    }

    fn remove_matching(&self, pattern: &KeyPattern) -> usize {
        let mut entries = rw_write(&self.entries, self.label, "invalidate");
        let matched: Vec<CacheKey> = entries
            .iter()
            .filter(|(key, _)| pattern.matches(key))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &matched {
            entries.pop(key);
        }
        matched.len()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, self.label, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Send + Sync> Invalidate for QueryStore<V> {
    fn label(&self) -> &'static str {
        self.label
    }

    fn invalidate_matching(&self, pattern: &KeyPattern) -> usize {
        let count = self.remove_matching(pattern);
        if count > 0 {
            debug!(store = self.label, %pattern, count, "Queries invalidated");
        }
        count
    }
}

impl<V, T> ItemSnapshots<T> for QueryStore<V>
where
    V: Contains<T> + Clone + Send + Sync,
    T: Identified,
{
    fn label(&self) -> &'static str {
        self.label
    }

    fn replace_item(&self, id: &T::Id, update: &dyn Fn(&T) -> T) -> usize {
        let mut entries = rw_write(&self.entries, self.label, "replace_item");
        entries
            .iter_mut()
            .filter_map(|(_, entry)| entry.value.as_mut())
            .map(|value| Arc::make_mut(value).replace_matching(id, update))
            .sum()
    }
}
