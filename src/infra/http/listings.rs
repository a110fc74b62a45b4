use std::sync::Arc;

use motorhub_api_types::{EditListing, Listing, ListingId, Message, NewListing, SellData};

use super::client::ApiClient;
use super::pages::ApiPageSource;
use crate::application::error::ApiError;

impl ApiClient {
    pub async fn listing(&self, id: ListingId) -> Result<Listing, ApiError> {
        self.get(&format!("listings/{id}"), &[]).await
    }

    pub async fn create_listing(&self, data: &NewListing) -> Result<Listing, ApiError> {
        self.post("listings", data).await
    }

    pub async fn edit_listing(&self, id: ListingId, data: &EditListing) -> Result<Listing, ApiError> {
        self.put(&format!("listings/{id}"), data).await
    }

    pub async fn delete_listing(&self, id: ListingId) -> Result<Message, ApiError> {
        self.delete(&format!("listings/{id}")).await
    }

    pub async fn sell_listing(&self, id: ListingId, data: &SellData) -> Result<Message, ApiError> {
        self.post(&format!("listings/{id}/sell"), data).await
    }
}

/// `GET /listings?page&search`
pub fn listings_source(client: Arc<ApiClient>, search: Option<&str>) -> ApiPageSource<Listing> {
    ApiPageSource::new(client, "listings").with_optional_filter("search", search)
}
