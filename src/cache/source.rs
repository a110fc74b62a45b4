//! Paged data sources.

use async_trait::async_trait;

use crate::application::error::ApiError;
use crate::application::pagination::Page;

/// Retrieves one page of a collection.
///
/// Filter parameters are bound when the source is built, so the same source
/// always answers for the same cache key. Fetching a page twice is safe and
/// there is no built-in retry.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch(&self, page: u32) -> Result<Page<T>, ApiError>;
}
