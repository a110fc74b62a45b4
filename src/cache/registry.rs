//! Store registry.
//!
//! Collection and query stores hold different item types, so invalidation
//! reaches them through the object-safe `Invalidate` trait. The consumer
//! applies every planned pattern to every registered store.

use std::sync::{Arc, RwLock};

use super::keys::KeyPattern;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::registry";

/// A store whose entries can be invalidated by key pattern.
pub trait Invalidate: Send + Sync {
    fn label(&self) -> &'static str;

    /// Invalidate every entry whose key matches `pattern`. Returns the number
    /// of entries affected.
    fn invalidate_matching(&self, pattern: &KeyPattern) -> usize;
}

/// Every store that takes part in event-driven invalidation.
pub struct CacheRegistry {
    stores: RwLock<Vec<Arc<dyn Invalidate>>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self {
            stores: RwLock::new(Vec::new()),
        }
    }

    pub fn register(&self, store: Arc<dyn Invalidate>) {
        rw_write(&self.stores, SOURCE, "register").push(store);
    }

    /// Apply `pattern` to every store. Returns `(store label, count)` for
    /// stores that had matching entries.
    pub fn invalidate(&self, pattern: &KeyPattern) -> Vec<(&'static str, usize)> {
        let stores = rw_read(&self.stores, SOURCE, "invalidate").clone();
        stores
            .iter()
            .filter_map(|store| {
                let count = store.invalidate_matching(pattern);
                (count > 0).then(|| (store.label(), count))
            })
            .collect()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        rw_read(&self.stores, SOURCE, "labels")
            .iter()
            .map(|store| store.label())
            .collect()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.stores, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}
