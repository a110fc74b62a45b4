//! Page-number pagination shared by every list endpoint.

use motorhub_api_types::{PageMeta, Paginated};

use super::error::ApiError;

/// First page number; pages are 1-indexed.
pub const FIRST_PAGE: u32 = 1;

/// One server-returned batch of a paginated list plus its position metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, meta: PageMeta) -> Self {
        Self { items, meta }
    }

    /// Validate a decoded envelope against the page that was requested.
    pub fn from_envelope(envelope: Paginated<T>, requested: u32) -> Result<Self, ApiError> {
        let meta = envelope.meta;
        if meta.current_page < FIRST_PAGE {
            return Err(ApiError::InvalidMeta(format!(
                "current_page must be at least {FIRST_PAGE}, got {}",
                meta.current_page
            )));
        }
        // An empty collection reports last_page = 1 on most backends, but some
        // report 0; normalise so the invariant current_page <= last_page holds.
        let meta = if meta.last_page == 0 && meta.total == 0 {
            PageMeta {
                last_page: meta.current_page,
                ..meta
            }
        } else {
            meta
        };
        if meta.current_page > meta.last_page {
            return Err(ApiError::InvalidMeta(format!(
                "current_page {} exceeds last_page {}",
                meta.current_page, meta.last_page
            )));
        }
        if meta.current_page != requested {
            return Err(ApiError::InvalidPage {
                expected: requested,
                actual: meta.current_page,
            });
        }
        Ok(Self {
            items: envelope.data,
            meta,
        })
    }

    pub fn number(&self) -> u32 {
        self.meta.current_page
    }

    /// Whether the server reports pages after this one.
    pub fn has_more(&self) -> bool {
        self.meta.current_page < self.meta.last_page
    }

    /// Page number to request after this one, if any.
    pub fn next_page(&self) -> Option<u32> {
        self.has_more().then(|| self.meta.current_page + 1)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn meta(current_page: u32, last_page: u32, per_page: u32, total: u64) -> PageMeta {
    PageMeta {
        current_page,
        last_page,
        total,
        per_page,
        from: None,
        to: None,
    }
}

#[cfg(test)]
mod tests {
    use motorhub_api_types::PageLinks;

    use super::*;

    fn envelope(current: u32, last: u32, total: u64) -> Paginated<u32> {
        Paginated {
            data: vec![1, 2],
            meta: meta(current, last, 2, total),
            links: PageLinks::default(),
        }
    }

    #[test]
    fn accepts_requested_page() {
        let page = Page::from_envelope(envelope(2, 3, 6), 2).expect("valid page");
        assert_eq!(page.number(), 2);
        assert!(page.has_more());
        assert_eq!(page.next_page(), Some(3));
    }

    #[test]
    fn last_page_has_no_successor() {
        let page = Page::from_envelope(envelope(3, 3, 6), 3).expect("valid page");
        assert!(!page.has_more());
        assert_eq!(page.next_page(), None);
    }

    #[test]
    fn rejects_page_other_than_requested() {
        let err = Page::from_envelope(envelope(1, 3, 6), 2).expect_err("mismatch");
        assert_eq!(
            err,
            ApiError::InvalidPage {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn rejects_current_beyond_last() {
        let err = Page::from_envelope(envelope(4, 3, 6), 4).expect_err("beyond last");
        assert!(matches!(err, ApiError::InvalidMeta(_)));
    }

    #[test]
    fn empty_collection_with_zero_last_page_is_normalised() {
        let env = Paginated {
            data: Vec::<u32>::new(),
            meta: meta(1, 0, 15, 0),
            links: PageLinks::default(),
        };
        let page = Page::from_envelope(env, 1).expect("normalised");
        assert_eq!(page.meta.last_page, 1);
        assert!(!page.has_more());
    }
}
