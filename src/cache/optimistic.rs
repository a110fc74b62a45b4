//! Optimistic toggles.
//!
//! Upvotes and attendance flip their flag and counter in every cached copy of
//! the item before the request resolves. Success keeps the local value; a
//! failure either rolls it back or leaves it, depending on configuration.

use std::cell::RefCell;
use std::future::Future;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::application::error::ApiError;

use super::item::{Identified, ItemSnapshots, Toggle};

const METRIC_OPTIMISTIC_ROLLBACK_TOTAL: &str = "motorhub_optimistic_rollback_total";

pub struct OptimisticMutator<T: Identified> {
    label: &'static str,
    targets: Vec<Arc<dyn ItemSnapshots<T>>>,
    rollback_on_failure: bool,
}

impl<T> OptimisticMutator<T>
where
    T: Identified + Toggle + Clone,
{
    pub fn new(label: &'static str, rollback_on_failure: bool) -> Self {
        Self {
            label,
            targets: Vec::new(),
            rollback_on_failure,
        }
    }

    /// Add a store holding copies of `T`.
    #[must_use]
    pub fn with_target(mut self, target: Arc<dyn ItemSnapshots<T>>) -> Self {
        self.targets.push(target);
        self
    }

    /// Replace every cached snapshot of `id`.
    pub fn apply(&self, id: &T::Id, update: &dyn Fn(&T) -> T) -> usize {
        self.targets
            .iter()
            .map(|target| target.replace_item(id, update))
            .sum()
    }

    /// Replace every cached snapshot of the item with a server-returned one.
    pub fn reconcile(&self, item: &T) -> usize {
        let replaced = self.apply(&item.id(), &|_| item.clone());
        debug!(mutator = self.label, id = ?item.id(), replaced, "Optimistic state reconciled");
        replaced
    }

    /// Flip the item locally, then run `call`.
    ///
    /// The caller's error is always returned. With rollback enabled, every
    /// copy still showing one of the values written here is flipped back;
    /// copies that were refetched in the meantime are left alone. Copies may
    /// disagree on the counter when they were loaded at different times.
    pub async fn toggle<F, Fut, R>(&self, id: T::Id, call: F) -> Result<R, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, ApiError>>,
    {
        let written = RefCell::new(Vec::new());
        let replaced = self.apply(&id, &|item: &T| {
            let toggled = item.toggled();
            written.borrow_mut().push(toggled.toggle_state());
            toggled
        });
        debug!(mutator = self.label, id = ?id, replaced, "Optimistic toggle applied");
        let optimistic = written.into_inner();

        let err = match call().await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        if !self.rollback_on_failure {
            warn!(
                mutator = self.label,
                id = ?id,
                error = %err,
                "Toggle failed; optimistic state kept and cache diverges from server"
            );
            return Err(err);
        }

        let reverted = self.apply(&id, &|item: &T| {
            if optimistic.contains(&item.toggle_state()) {
                item.toggled()
            } else {
                item.clone()
            }
        });
        counter!(METRIC_OPTIMISTIC_ROLLBACK_TOTAL, "mutator" => self.label).increment(1);
        warn!(
            mutator = self.label,
            id = ?id,
            reverted,
            error = %err,
            "Toggle failed; optimistic state rolled back"
        );
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::application::pagination::{Page, meta};
    use crate::cache::keys::{CacheKey, names};
    use crate::cache::store::CollectionStore;

    #[derive(Debug, Clone, PartialEq)]
    struct Vote {
        id: i64,
        upvoted: bool,
        count: u32,
    }

    impl Identified for Vote {
        type Id = i64;

        fn id(&self) -> i64 {
            self.id
        }
    }

    impl Toggle for Vote {
        fn toggle_state(&self) -> (bool, u32) {
            (self.upvoted, self.count)
        }

        fn toggled(&self) -> Self {
            let count = if self.upvoted {
                self.count.saturating_sub(1)
            } else {
                self.count + 1
            };
            Self {
                upvoted: !self.upvoted,
                count,
                ..self.clone()
            }
        }
    }

    fn seeded(key: &CacheKey) -> Arc<CollectionStore<Vote>> {
        let store = Arc::new(CollectionStore::new(
            "votes",
            NonZeroUsize::new(4).expect("capacity"),
        ));
        let ticket = store.begin_fetch(key).expect("ticket");
        let items = vec![
            Vote {
                id: 1,
                upvoted: false,
                count: 3,
            },
            Vote {
                id: 2,
                upvoted: true,
                count: 7,
            },
        ];
        store
            .complete_fetch(key, ticket, Ok(Page::new(items, meta(1, 1, 2, 2))))
            .expect("page");
        store
    }

    fn single(key: &CacheKey, upvoted: bool, count: u32) -> Arc<CollectionStore<Vote>> {
        let store = Arc::new(CollectionStore::new(
            "votes",
            NonZeroUsize::new(4).expect("capacity"),
        ));
        let ticket = store.begin_fetch(key).expect("ticket");
        let vote = Vote {
            id: 1,
            upvoted,
            count,
        };
        store
            .complete_fetch(key, ticket, Ok(Page::new(vec![vote], meta(1, 1, 1, 1))))
            .expect("page");
        store
    }

    fn first(store: &CollectionStore<Vote>, key: &CacheKey) -> Vote {
        store.snapshot(key).to_vec()[0].clone()
    }

    #[tokio::test]
    async fn toggle_is_visible_before_the_call_resolves() {
        let key = CacheKey::new(names::POSTS);
        let store = seeded(&key);
        let mutator = OptimisticMutator::<Vote>::new("votes", true).with_target(store.clone());

        let (cached, key_ref) = (&store, &key);
        let seen = mutator
            .toggle(1, || async move { Ok(first(cached, key_ref)) })
            .await
            .expect("toggle");

        assert!(seen.upvoted);
        assert_eq!(seen.count, 4);
        assert_eq!(first(&store, &key), seen);
    }

    #[tokio::test]
    async fn failure_rolls_back_when_enabled() {
        let key = CacheKey::new(names::POSTS);
        let store = seeded(&key);
        let mutator = OptimisticMutator::<Vote>::new("votes", true).with_target(store.clone());

        let err = mutator
            .toggle(1, || async { Err::<(), _>(ApiError::Network("offline".into())) })
            .await
            .expect_err("fails");

        assert!(matches!(err, ApiError::Network(_)));
        let vote = first(&store, &key);
        assert!(!vote.upvoted);
        assert_eq!(vote.count, 3);
    }

    #[tokio::test]
    async fn failure_keeps_optimistic_state_when_disabled() {
        let key = CacheKey::new(names::POSTS);
        let store = seeded(&key);
        let mutator = OptimisticMutator::<Vote>::new("votes", false).with_target(store.clone());

        mutator
            .toggle(1, || async { Err::<(), _>(ApiError::Network("offline".into())) })
            .await
            .expect_err("fails");

        let vote = first(&store, &key);
        assert!(vote.upvoted);
        assert_eq!(vote.count, 4);
    }

    #[tokio::test]
    async fn rollback_restores_copies_loaded_at_different_times() {
        let feed_key = CacheKey::new(names::POSTS);
        let detail_key = CacheKey::new(names::MY_POSTS);
        let feed = single(&feed_key, false, 3);
        let detail = single(&detail_key, false, 5);
        let mutator = OptimisticMutator::<Vote>::new("votes", true)
            .with_target(feed.clone())
            .with_target(detail.clone());

        mutator
            .toggle(1, || async { Err::<(), _>(ApiError::Network("offline".into())) })
            .await
            .expect_err("fails");

        assert_eq!(first(&feed, &feed_key).toggle_state(), (false, 3));
        assert_eq!(first(&detail, &detail_key).toggle_state(), (false, 5));
    }

    #[tokio::test]
    async fn rollback_leaves_refetched_copies_alone() {
        let key = CacheKey::new(names::POSTS);
        let store = seeded(&key);
        let mutator = OptimisticMutator::<Vote>::new("votes", true).with_target(store.clone());

        let refetch = &mutator;
        mutator
            .toggle(1, || async move {
                // Server state arrives mid-flight with a different count.
                refetch.apply(&1, &|vote: &Vote| Vote {
                    upvoted: true,
                    count: 10,
                    ..vote.clone()
                });
                Err::<(), _>(ApiError::Network("offline".into()))
            })
            .await
            .expect_err("fails");

        let vote = first(&store, &key);
        assert!(vote.upvoted);
        assert_eq!(vote.count, 10);
    }

    #[test]
    fn reconcile_replaces_with_server_copy() {
        let key = CacheKey::new(names::EVENTS);
        let store = seeded(&key);
        let mutator = OptimisticMutator::<Vote>::new("votes", true).with_target(store.clone());

        let server = Vote {
            id: 2,
            upvoted: false,
            count: 6,
        };
        assert_eq!(mutator.reconcile(&server), 1);
        assert_eq!(store.snapshot(&key).to_vec()[1], server);
    }
}
