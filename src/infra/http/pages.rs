use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use motorhub_api_types::Paginated;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::client::ApiClient;
use crate::application::error::ApiError;
use crate::application::pagination::Page;
use crate::cache::PageSource;

/// Paginated list endpoint bound to fixed filter parameters.
///
/// Issues `GET <path>?page=<n>&<filters>` and validates the returned page
/// against the one requested.
pub struct ApiPageSource<T> {
    client: Arc<ApiClient>,
    path: String,
    filters: Vec<(&'static str, String)>,
    _item: PhantomData<fn() -> T>,
}

impl<T> ApiPageSource<T> {
    pub fn new(client: Arc<ApiClient>, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            filters: Vec::new(),
            _item: PhantomData,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, name: &'static str, value: impl ToString) -> Self {
        self.filters.push((name, value.to_string()));
        self
    }

    /// Add the filter only when it carries a non-blank value.
    #[must_use]
    pub fn with_optional_filter(self, name: &'static str, value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(value) if !value.is_empty() => self.with_filter(name, value),
            _ => self,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn filters(&self) -> &[(&'static str, String)] {
        &self.filters
    }
}

#[async_trait]
impl<T> PageSource<T> for ApiPageSource<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch(&self, page: u32) -> Result<Page<T>, ApiError> {
        let mut query = Vec::with_capacity(self.filters.len() + 1);
        query.push(("page", page.to_string()));
        query.extend(self.filters.iter().cloned());

        debug!(path = %self.path, page, "Requesting page");
        let envelope: Paginated<T> = self.client.get(&self.path, &query).await?;
        Page::from_envelope(envelope, page)
    }
}
