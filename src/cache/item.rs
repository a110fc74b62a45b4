//! Traits describing cached items.

use std::fmt::Debug;
use std::hash::Hash;

/// An entity with a stable backend identity.
pub trait Identified {
    type Id: Clone + Eq + Hash + Debug + Send + Sync;

    fn id(&self) -> Self::Id;
}

/// A boolean flag paired with a counter, flipped by toggle endpoints
/// (upvotes, event attendance).
pub trait Toggle: Sized {
    /// Current `(flag, count)`.
    fn toggle_state(&self) -> (bool, u32);

    /// Copy with the flag flipped and the counter moved with it.
    #[must_use]
    fn toggled(&self) -> Self;
}

/// A store that can replace item snapshots by id.
///
/// Implemented by collection and query stores so one optimistic update
/// reaches every cached copy of an entity.
pub trait ItemSnapshots<T: Identified>: Send + Sync {
    fn label(&self) -> &'static str;

    /// Replace every cached snapshot whose id matches. Returns the number of
    /// snapshots replaced.
    fn replace_item(&self, id: &T::Id, update: &dyn Fn(&T) -> T) -> usize;
}

/// A cached value that holds zero or more `T` snapshots (a single entity or a
/// list of them).
pub trait Contains<T: Identified> {
    /// Replace every held snapshot whose id matches. Returns the number
    /// replaced.
    fn replace_matching(&mut self, id: &T::Id, update: &dyn Fn(&T) -> T) -> usize;
}

pub(crate) fn replace_one<T: Identified>(item: &mut T, id: &T::Id, update: &dyn Fn(&T) -> T) -> usize {
    if &item.id() == id {
        *item = update(item);
        1
    } else {
        0
    }
}

pub(crate) fn replace_in<T: Identified>(items: &mut [T], id: &T::Id, update: &dyn Fn(&T) -> T) -> usize {
    items
        .iter_mut()
        .map(|item| replace_one(item, id, update))
        .sum()
}
