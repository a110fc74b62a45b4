//! Infinite collection handles.
//!
//! An `InfiniteCollection<T>` binds a cache key to its page source and to the
//! store holding the pages. Handles are cheap to clone; the store entry stays
//! alive (not garbage-collected) while any handle observes it.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::application::error::ApiError;

use super::entry::{CollectionState, FetchOutcome, FetchTicket};
use super::keys::CacheKey;
use super::source::PageSource;
use super::store::{CollectionStore, FlattenedItems};

const METRIC_PAGE_FETCH_TOTAL: &str = "motorhub_page_fetch_total";
const METRIC_PAGE_FETCH_MS: &str = "motorhub_page_fetch_ms";

pub struct InfiniteCollection<T> {
    key: CacheKey,
    store: Arc<CollectionStore<T>>,
    source: Arc<dyn PageSource<T>>,
}

/// Returns the ticket if the fetching future is dropped before the response
/// is applied, so the entry does not stay in a loading state forever.
struct InFlight<'a, T> {
    store: &'a CollectionStore<T>,
    key: &'a CacheKey,
    ticket: Option<FetchTicket>,
}

impl<T> InFlight<'_, T> {
    fn take(&mut self) -> Option<FetchTicket> {
        self.ticket.take()
    }
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.store.abort_fetch(self.key, ticket);
        }
    }
}

impl<T> InfiniteCollection<T> {
    pub fn new(key: CacheKey, store: Arc<CollectionStore<T>>, source: Arc<dyn PageSource<T>>) -> Self {
        store.observe(&key);
        Self { key, store, source }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn state(&self) -> CollectionState {
        self.store.state(&self.key)
    }

    pub fn has_more(&self) -> bool {
        self.store.has_more(&self.key)
    }

    pub fn last_error(&self) -> Option<ApiError> {
        self.store.last_error(&self.key)
    }

    /// Snapshot of every loaded item, page 1 first.
    pub fn flattened_items(&self) -> FlattenedItems<T> {
        self.store.snapshot(&self.key)
    }

    /// Discard all pages and return to `Empty`. Any response still in flight
    /// for the old pages is dropped when it arrives.
    pub fn invalidate(&self) -> bool {
        self.store.invalidate(&self.key)
    }

    /// Point this handle at a different filter value. The new key starts with
    /// its own entry; the old one is released and left for collection.
    pub fn rekey(&mut self, key: CacheKey, source: Arc<dyn PageSource<T>>) {
        if key == self.key {
            return;
        }
        debug!(store = self.store.label(), from = %self.key, to = %key, "Collection re-keyed");
        self.store.observe(&key);
        self.store.release(&self.key);
        self.key = key;
        self.source = source;
    }

    pub fn store(&self) -> &Arc<CollectionStore<T>> {
        &self.store
    }
}

impl<T: Send + Sync> InfiniteCollection<T> {
    /// Fetch and append the next page.
    ///
    /// Does nothing while a fetch is in flight or once the last page is
    /// loaded. From `Error` the failed page is requested again.
    pub async fn get_next_page(&self) -> Result<FetchOutcome, ApiError> {
        let ticket = match self.store.begin_fetch(&self.key) {
            Ok(ticket) => ticket,
            Err(state) => {
                debug!(key = %self.key, %state, "Next page skipped");
                return Ok(FetchOutcome::Skipped(state));
            }
        };

        let mut in_flight = InFlight {
            store: &self.store,
            key: &self.key,
            ticket: Some(ticket),
        };
        let started_at = Instant::now();
        let result = self.source.fetch(ticket.page).await;
        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        in_flight.take();

        let name = self.key.name();
        let status = if result.is_ok() { "ok" } else { "error" };
        counter!(METRIC_PAGE_FETCH_TOTAL, "collection" => name, "result" => status).increment(1);
        histogram!(METRIC_PAGE_FETCH_MS, "collection" => name).record(elapsed_ms);

        match self.store.complete_fetch(&self.key, ticket, result) {
            Ok(outcome) => {
                info!(key = %self.key, page = ticket.page, elapsed_ms, ?outcome, "Page fetched");
                Ok(outcome)
            }
            Err(err) => {
                warn!(key = %self.key, page = ticket.page, error = %err, "Page fetch failed");
                Err(err)
            }
        }
    }

    /// Invalidate, then fetch page 1.
    pub async fn refetch(&self) -> Result<FetchOutcome, ApiError> {
        self.invalidate();
        self.get_next_page().await
    }
}

impl<T> Clone for InfiniteCollection<T> {
    fn clone(&self) -> Self {
        self.store.observe(&self.key);
        Self {
            key: self.key.clone(),
            store: self.store.clone(),
            source: self.source.clone(),
        }
    }
}

impl<T> Drop for InfiniteCollection<T> {
    fn drop(&mut self) {
        self.store.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;
    use std::time::Duration;

    use super::*;
    use crate::cache::keys::names;
    use crate::cache::testing::ScriptedSource;

    fn store() -> Arc<CollectionStore<u32>> {
        Arc::new(CollectionStore::new(
            "numbers",
            NonZeroUsize::new(8).expect("capacity"),
        ))
    }

    #[tokio::test]
    async fn pages_accumulate_in_fetch_order() {
        let source = Arc::new(ScriptedSource::numbered(3, 2));
        let collection =
            InfiniteCollection::new(CacheKey::new(names::POSTS), store(), source.clone());

        collection.get_next_page().await.expect("page 1");
        collection.get_next_page().await.expect("page 2");

        let items: Vec<u32> = collection.flattened_items().to_vec();
        assert_eq!(items, vec![1, 2, 3, 4]);
        assert_eq!(source.requested(), vec![1, 2]);
        assert_eq!(collection.state(), CollectionState::Loaded);
    }

    #[tokio::test]
    async fn exhausted_collection_issues_no_request() {
        let source = Arc::new(ScriptedSource::numbered(1, 2));
        let collection =
            InfiniteCollection::new(CacheKey::new(names::POSTS), store(), source.clone());

        collection.get_next_page().await.expect("page 1");
        let outcome = collection.get_next_page().await.expect("skip");

        assert_eq!(outcome, FetchOutcome::Skipped(CollectionState::Exhausted));
        assert_eq!(source.calls(), 1);
        assert!(!collection.has_more());
    }

    #[tokio::test]
    async fn concurrent_calls_issue_one_request() {
        let source = Arc::new(ScriptedSource::numbered(3, 2).gated());
        let collection =
            InfiniteCollection::new(CacheKey::new(names::POSTS), store(), source.clone());

        let first = collection.get_next_page();
        let second = async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            let outcome = collection.get_next_page().await;
            source.open();
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.expect("first").issued_request());
        assert_eq!(
            second.expect("second"),
            FetchOutcome::Skipped(CollectionState::Loading)
        );
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn failure_keeps_pages_and_retry_requests_same_page() {
        let source = Arc::new(ScriptedSource::numbered(3, 2));
        let collection =
            InfiniteCollection::new(CacheKey::new(names::POSTS), store(), source.clone());
        collection.get_next_page().await.expect("page 1");

        source.fail_next(ApiError::Network("offline".into()));
        let err = collection.get_next_page().await.expect_err("fails");
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(collection.state(), CollectionState::Error);
        assert_eq!(collection.flattened_items().len(), 2);
        assert_eq!(collection.last_error(), Some(err));

        collection.get_next_page().await.expect("retry");
        assert_eq!(source.requested(), vec![1, 2, 2]);
        assert_eq!(collection.flattened_items().len(), 4);
    }

    #[tokio::test]
    async fn refetch_starts_over_from_page_one() {
        let source = Arc::new(ScriptedSource::numbered(3, 2));
        let collection =
            InfiniteCollection::new(CacheKey::new(names::POSTS), store(), source.clone());
        collection.get_next_page().await.expect("page 1");
        collection.get_next_page().await.expect("page 2");

        collection.refetch().await.expect("refetch");

        assert_eq!(source.requested(), vec![1, 2, 1]);
        assert_eq!(collection.flattened_items().to_vec(), vec![1, 2]);
    }

    #[tokio::test]
    async fn new_filter_value_starts_empty() {
        let store = store();
        let bmw = CacheKey::new(names::LISTINGS).with(Some("bmw"));
        let audi = CacheKey::new(names::LISTINGS).with(Some("audi"));
        let mut collection = InfiniteCollection::new(
            bmw.clone(),
            store.clone(),
            Arc::new(ScriptedSource::numbered(2, 2)),
        );
        collection.get_next_page().await.expect("page 1");

        collection.rekey(audi.clone(), Arc::new(ScriptedSource::numbered(2, 2)));

        assert_eq!(collection.key(), &audi);
        assert_eq!(collection.state(), CollectionState::Empty);
        assert_eq!(store.observers(&bmw), 0);
        assert_eq!(store.state(&bmw), CollectionState::Loaded);
        assert_eq!(store.collect_garbage(), 1);
    }

    #[tokio::test]
    async fn dropped_fetch_releases_guard() {
        let source = Arc::new(ScriptedSource::numbered(3, 2).gated());
        let collection =
            InfiniteCollection::new(CacheKey::new(names::POSTS), store(), source.clone());

        let timed_out =
            tokio::time::timeout(Duration::from_millis(5), collection.get_next_page()).await;
        assert!(timed_out.is_err());
        assert_eq!(collection.state(), CollectionState::Empty);

        source.open();
        collection.get_next_page().await.expect("page 1 after abort");
        assert_eq!(collection.state(), CollectionState::Loaded);
    }

    #[tokio::test]
    async fn live_handles_survive_capacity_pressure() {
        let store = Arc::new(CollectionStore::new(
            "numbers",
            NonZeroUsize::new(2).expect("capacity"),
        ));
        let handle = |search: &str| {
            InfiniteCollection::new(
                CacheKey::new(names::LISTINGS).with(Some(search)),
                store.clone(),
                Arc::new(ScriptedSource::numbered(2, 2)),
            )
        };
        let a = handle("a");
        let _b = handle("b");
        let _c = handle("c");

        a.get_next_page().await.expect("page 1");
        assert_eq!(store.observers(a.key()), 1);

        assert_eq!(store.collect_garbage(), 0);
        assert_eq!(a.state(), CollectionState::Loaded);
        assert_eq!(a.flattened_items().to_vec(), vec![1, 2]);
    }

    #[test]
    fn handles_track_observers() {
        let store = store();
        let key = CacheKey::new(names::POSTS);
        let source: Arc<dyn PageSource<u32>> = Arc::new(ScriptedSource::numbered(1, 1));

        let first = InfiniteCollection::new(key.clone(), store.clone(), source);
        let second = first.clone();
        assert_eq!(store.observers(&key), 2);

        drop(first);
        drop(second);
        assert_eq!(store.observers(&key), 0);
    }
}
