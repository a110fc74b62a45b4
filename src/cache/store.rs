//! Collection storage.
//!
//! A `CollectionStore<T>` holds every paginated collection of one item type
//! (e.g. all post feeds: `posts`, `myPosts`, `userPosts/3`), each under its own
//! `CacheKey`. Entries are bounded by LRU capacity and collected when no
//! handle observes them. Capacity eviction only picks idle entries; when every
//! entry is in use the store grows past its limit and shrinks back on the next
//! garbage collection.

use std::num::NonZeroUsize;
use std::slice;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use lru::LruCache;
use metrics::counter;
use tracing::{debug, info};

use crate::application::error::ApiError;
use crate::application::pagination::Page;

use super::entry::{CollectionEntry, CollectionState, FetchOutcome, FetchTicket};
use super::item::{Identified, ItemSnapshots};
use super::keys::{CacheKey, KeyPattern};
use super::lock::{rw_read, rw_write};
use super::registry::Invalidate;

const METRIC_CACHE_EVICT_TOTAL: &str = "motorhub_cache_evict_total";

/// Immutable view over the pages of one collection at the moment it was taken.
///
/// Iteration is restartable and yields items page by page in fetch order,
/// server order within a page. Later cache updates never show through an
/// existing snapshot.
#[derive(Debug, Clone)]
pub struct FlattenedItems<T> {
    pages: Vec<Arc<Page<T>>>,
}

impl<T> FlattenedItems<T> {
    pub(crate) fn new(pages: Vec<Arc<Page<T>>>) -> Self {
        Self { pages }
    }

    pub fn iter(&self) -> Items<'_, T> {
        Items {
            pages: self.pages.iter(),
            current: [].iter(),
        }
    }

    pub fn len(&self) -> usize {
        self.pages.iter().map(|page| page.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }
}

impl<T> Default for FlattenedItems<T> {
    fn default() -> Self {
        Self { pages: Vec::new() }
    }
}

/// Iterator over a `FlattenedItems` snapshot.
pub struct Items<'a, T> {
    pages: slice::Iter<'a, Arc<Page<T>>>,
    current: slice::Iter<'a, T>,
}

impl<'a, T> Iterator for Items<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.current.next() {
                return Some(item);
            }
            self.current = self.pages.next()?.items.iter();
        }
    }
}

impl<'a, T> IntoIterator for &'a FlattenedItems<T> {
    type Item = &'a T;
    type IntoIter = Items<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct CollectionStore<T> {
    label: &'static str,
    capacity: NonZeroUsize,
    entries: RwLock<LruCache<CacheKey, CollectionEntry<T>>>,
    generations: AtomicU64,
}

fn is_idle<T>(entry: &CollectionEntry<T>) -> bool {
    entry.observers() == 0 && !entry.state().is_fetching()
}

impl<T> CollectionStore<T> {
    pub fn new(label: &'static str, capacity: NonZeroUsize) -> Self {
        Self {
            label,
            capacity,
            entries: RwLock::new(LruCache::new(capacity)),
            generations: AtomicU64::new(0),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn insert(&self, entries: &mut LruCache<CacheKey, CollectionEntry<T>>, key: CacheKey) {
        if entries.len() >= entries.cap().get() {
            self.make_room(entries);
        }
        entries.put(key, CollectionEntry::new(self.next_generation()));
    }

    /// Evict the least recently used idle entry, or grow by one slot when
    /// every entry is observed or fetching.
    fn make_room(&self, entries: &mut LruCache<CacheKey, CollectionEntry<T>>) {
        let victim = entries
            .iter()
            .rev()
            .find(|(_, entry)| is_idle(entry))
            .map(|(key, _)| key.clone());
        match victim {
            Some(evicted) => {
                entries.pop(&evicted);
                debug!(store = self.label, key = %evicted, "Collection evicted by capacity");
                counter!(METRIC_CACHE_EVICT_TOTAL, "store" => self.label).increment(1);
            }
            None => {
                let grown = entries.cap().saturating_add(1);
                entries.resize(grown);
                debug!(store = self.label, capacity = grown.get(), "All collections in use; capacity grown");
            }
        }
    }

    /// Register a consumer of `key`, creating an empty entry if needed.
    pub(crate) fn observe(&self, key: &CacheKey) {
        let mut entries = rw_write(&self.entries, self.label, "observe");
        if !entries.contains(key) {
            self.insert(&mut entries, key.clone());
        }
        if let Some(entry) = entries.get_mut(key) {
            entry.observe();
        }
    }

    pub(crate) fn release(&self, key: &CacheKey) {
        if let Some(entry) = rw_write(&self.entries, self.label, "release").peek_mut(key) {
            entry.release();
        }
    }

    pub fn state(&self, key: &CacheKey) -> CollectionState {
        rw_read(&self.entries, self.label, "state")
            .peek(key)
            .map_or(CollectionState::Empty, CollectionEntry::state)
    }

    pub fn snapshot(&self, key: &CacheKey) -> FlattenedItems<T> {
        rw_read(&self.entries, self.label, "snapshot")
            .peek(key)
            .map(|entry| FlattenedItems::new(entry.pages().to_vec()))
            .unwrap_or_default()
    }

    pub fn last_error(&self, key: &CacheKey) -> Option<ApiError> {
        rw_read(&self.entries, self.label, "last_error")
            .peek(key)
            .and_then(|entry| entry.error().cloned())
    }

    pub fn has_more(&self, key: &CacheKey) -> bool {
        rw_read(&self.entries, self.label, "has_more")
            .peek(key)
            .is_none_or(CollectionEntry::has_more)
    }

    pub fn observers(&self, key: &CacheKey) -> usize {
        rw_read(&self.entries, self.label, "observers")
            .peek(key)
            .map_or(0, CollectionEntry::observers)
    }

    /// Claim the next page fetch for `key`. Returns the blocking state when a
    /// fetch is in flight or the collection is exhausted.
    pub(crate) fn begin_fetch(&self, key: &CacheKey) -> Result<FetchTicket, CollectionState> {
        let mut entries = rw_write(&self.entries, self.label, "begin_fetch");
        if !entries.contains(key) {
            self.insert(&mut entries, key.clone());
        }
        let Some(entry) = entries.get_mut(key) else {
            return Err(CollectionState::Empty);
        };
        let before = entry.state();
        match entry.begin_fetch() {
            Some(ticket) => {
                debug!(
                    store = self.label,
                    key = %key,
                    page = ticket.page,
                    from = %before,
                    to = %entry.state(),
                    "Collection fetch started"
                );
                Ok(ticket)
            }
            None => Err(before),
        }
    }

    pub(crate) fn complete_fetch(
        &self,
        key: &CacheKey,
        ticket: FetchTicket,
        result: Result<Page<T>, ApiError>,
    ) -> Result<FetchOutcome, ApiError> {
        let mut entries = rw_write(&self.entries, self.label, "complete_fetch");
        let Some(entry) = entries.peek_mut(key) else {
            debug!(store = self.label, key = %key, page = ticket.page, "Response for collected entry dropped");
            return Ok(FetchOutcome::Discarded);
        };
        let outcome = entry.complete(ticket, result);
        match &outcome {
            Ok(FetchOutcome::Discarded) => {
                debug!(store = self.label, key = %key, page = ticket.page, "Stale response dropped");
            }
            Ok(outcome) => {
                debug!(store = self.label, key = %key, ?outcome, state = %entry.state(), "Collection page applied");
            }
            Err(err) => {
                info!(store = self.label, key = %key, page = ticket.page, error = %err, "Collection fetch failed");
            }
        }
        outcome
    }

    pub(crate) fn abort_fetch(&self, key: &CacheKey, ticket: FetchTicket) {
        let mut entries = rw_write(&self.entries, self.label, "abort_fetch");
        if let Some(entry) = entries.peek_mut(key)
            && entry.abort(ticket)
        {
            debug!(store = self.label, key = %key, page = ticket.page, "Collection fetch abandoned");
        }
    }

    /// Reset one entry to `Empty`. Returns false when the key is not cached.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let pattern = KeyPattern::Exact(key.clone());
        self.invalidate_keys(&pattern) > 0
    }

    fn invalidate_keys(&self, pattern: &KeyPattern) -> usize {
        let mut entries = rw_write(&self.entries, self.label, "invalidate");
        let matched: Vec<CacheKey> = entries
            .iter()
            .filter(|(key, _)| pattern.matches(key))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &matched {
            let observed = entries.peek(key).is_some_and(|entry| entry.observers() > 0);
            if observed {
                let generation = self.next_generation();
                if let Some(entry) = entries.peek_mut(key) {
                    entry.reset(generation);
                }
            } else {
                entries.pop(key);
            }
        }
        if !matched.is_empty() {
            debug!(store = self.label, %pattern, count = matched.len(), "Collections invalidated");
        }
        matched.len()
    }

    /// Drop entries nobody observes and nothing is fetching into.
    pub fn collect_garbage(&self) -> usize {
        let mut entries = rw_write(&self.entries, self.label, "collect_garbage");
        let idle: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| is_idle(entry))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &idle {
            entries.pop(key);
        }
        if entries.cap() > self.capacity && entries.len() <= self.capacity.get() {
            entries.resize(self.capacity);
        }
        idle.len()
    }

    pub fn keys(&self) -> Vec<CacheKey> {
        rw_read(&self.entries, self.label, "keys")
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, self.label, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Send + Sync> Invalidate for CollectionStore<T> {
    fn label(&self) -> &'static str {
        self.label
    }

    fn invalidate_matching(&self, pattern: &KeyPattern) -> usize {
        self.invalidate_keys(pattern)
    }
}

impl<T> ItemSnapshots<T> for CollectionStore<T>
where
    T: Identified + Clone + Send + Sync,
{
    fn label(&self) -> &'static str {
        self.label
    }

    fn replace_item(&self, id: &T::Id, update: &dyn Fn(&T) -> T) -> usize {
        let mut entries = rw_write(&self.entries, self.label, "replace_item");
        let mut replaced = 0;
        for (_, entry) in entries.iter_mut() {
            for page in entry.pages_mut() {
                let Some(position) = page.items.iter().position(|item| &item.id() == id) else {
                    continue;
                };
                // Copy-on-write: snapshots handed out earlier keep the old page.
                let page = Arc::make_mut(page);
                for item in page.items[position..].iter_mut() {
                    if &item.id() == id {
                        *item = update(item);
                        replaced += 1;
                    }
                }
            }
        }
        replaced
    }
}
