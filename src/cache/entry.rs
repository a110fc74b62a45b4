//! Per-key collection state.

use std::fmt;
use std::sync::Arc;

use crate::application::error::ApiError;
use crate::application::pagination::{FIRST_PAGE, Page};

/// Lifecycle of one collection entry.
///
/// `Empty -> Loading -> Loaded -> LoadingMore -> Loaded -> ... -> Exhausted`,
/// with `Error` reachable from either loading state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionState {
    Empty,
    Loading,
    Loaded,
    LoadingMore,
    Exhausted,
    Error,
}

impl CollectionState {
    pub fn is_fetching(self) -> bool {
        matches!(self, Self::Loading | Self::LoadingMore)
    }

    /// States in which `get_next_page` does nothing.
    pub fn blocks_fetch(self) -> bool {
        self.is_fetching() || self == Self::Exhausted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::LoadingMore => "loading_more",
            Self::Exhausted => "exhausted",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for CollectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission to fetch one page, bound to the entry generation it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FetchTicket {
    pub page: u32,
    pub generation: u64,
}

/// What a completed fetch did to the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The guard refused to fetch; carries the state that blocked it.
    Skipped(CollectionState),
    /// A page was appended.
    Appended {
        page: u32,
        items: usize,
        exhausted: bool,
    },
    /// The response arrived for an entry that was invalidated, re-keyed or
    /// collected in the meantime and was dropped.
    Discarded,
}

impl FetchOutcome {
    pub fn issued_request(&self) -> bool {
        !matches!(self, Self::Skipped(_))
    }
}

pub(crate) struct CollectionEntry<T> {
    pages: Vec<Arc<Page<T>>>,
    state: CollectionState,
    error: Option<ApiError>,
    generation: u64,
    observers: usize,
}

impl<T> CollectionEntry<T> {
    pub fn new(generation: u64) -> Self {
        Self {
            pages: Vec::new(),
            state: CollectionState::Empty,
            error: None,
            generation,
            observers: 0,
        }
    }

    pub fn state(&self) -> CollectionState {
        self.state
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    pub fn pages(&self) -> &[Arc<Page<T>>] {
        &self.pages
    }

    pub fn pages_mut(&mut self) -> &mut [Arc<Page<T>>] {
        &mut self.pages
    }

    pub fn observers(&self) -> usize {
        self.observers
    }

    pub fn observe(&mut self) {
        self.observers += 1;
    }

    pub fn release(&mut self) {
        self.observers = self.observers.saturating_sub(1);
    }

    pub fn item_count(&self) -> usize {
        self.pages.iter().map(|page| page.len()).sum()
    }

    /// `current_page < last_page` of the last fetched page; true while empty.
    pub fn has_more(&self) -> bool {
        self.pages.last().is_none_or(|page| page.has_more())
    }

    fn next_page_number(&self) -> u32 {
        self.pages
            .last()
            .map_or(FIRST_PAGE, |page| page.number() + 1)
    }

    /// Move into a loading state and hand out a ticket, unless a fetch is
    /// already in flight or the collection is exhausted.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if self.state.blocks_fetch() {
            return None;
        }
        self.state = if self.pages.is_empty() {
            CollectionState::Loading
        } else {
            CollectionState::LoadingMore
        };
        Some(FetchTicket {
            page: self.next_page_number(),
            generation: self.generation,
        })
    }

    /// Apply a fetch result. Results from an older generation are dropped
    /// without touching the entry.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Page<T>, ApiError>,
    ) -> Result<FetchOutcome, ApiError> {
        if ticket.generation != self.generation {
            return Ok(FetchOutcome::Discarded);
        }

        let page = result
            .and_then(|page| {
                if page.number() == ticket.page {
                    Ok(page)
                } else {
                    Err(ApiError::InvalidPage {
                        expected: ticket.page,
                        actual: page.number(),
                    })
                }
            })
            .inspect_err(|err| {
                self.state = CollectionState::Error;
                self.error = Some(err.clone());
            })?;

        let exhausted = !page.has_more();
        let outcome = FetchOutcome::Appended {
            page: page.number(),
            items: page.len(),
            exhausted,
        };
        self.pages.push(Arc::new(page));
        self.error = None;
        self.state = if exhausted {
            CollectionState::Exhausted
        } else {
            CollectionState::Loaded
        };
        Ok(outcome)
    }

    /// Give back a ticket whose request never completed (the fetching future
    /// was dropped). The entry returns to the state it would have had without
    /// the fetch.
    pub fn abort(&mut self, ticket: FetchTicket) -> bool {
        if ticket.generation != self.generation || !self.state.is_fetching() {
            return false;
        }
        self.state = if self.pages.is_empty() {
            CollectionState::Empty
        } else {
            CollectionState::Loaded
        };
        true
    }

    /// Drop every page and start over under a new generation.
    pub fn reset(&mut self, generation: u64) {
        self.pages.clear();
        self.state = CollectionState::Empty;
        self.error = None;
        self.generation = generation;
    }
}
