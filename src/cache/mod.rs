//! Client-side cache for paginated and single-value API reads.
//!
//! - **Collections**: infinite-scroll lists accumulated page by page under a
//!   `CacheKey` (`InfiniteCollection`, `CollectionStore`)
//! - **Queries**: single cached values such as entity details (`QueryStore`)
//! - **Viewport trigger**: requests the next page when a sentinel scrolls
//!   into view
//! - **Optimistic toggles**: upvotes and attendance applied locally before
//!   the server confirms
//! - **Invalidation**: mutation events planned into key patterns and applied
//!   to every registered store
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enable = true
//! collection_limit = 64
//! search_debounce_ms = 300
//! rollback_on_failure = true
//! # ... see config.rs for all options
//! ```

mod collection;
mod config;
mod consumer;
mod entry;
mod events;
mod item;
mod keys;
mod lock;
mod optimistic;
mod planner;
mod query;
mod registry;
mod source;
mod store;
#[cfg(test)]
mod testing;
mod trigger;
mod viewport;

pub use collection::InfiniteCollection;
pub use config::CacheConfig;
pub use consumer::CacheConsumer;
pub use entry::{CollectionState, FetchOutcome};
pub use events::{CacheEvent, Epoch, EventKind, EventQueue};
pub use item::{Contains, Identified, ItemSnapshots, Toggle};
pub(crate) use item::{replace_in, replace_one};
pub use keys::{CacheKey, KeyParam, KeyPattern, names};
pub use optimistic::OptimisticMutator;
pub use planner::{InvalidationPlan, patterns_for};
pub use query::{QueryState, QueryStore};
pub use registry::{CacheRegistry, Invalidate};
pub use source::PageSource;
pub use store::{CollectionStore, FlattenedItems, Items};
pub use trigger::CacheTrigger;
pub use viewport::{Sentinel, TriggerOutcome, Viewport, ViewportTrigger};
