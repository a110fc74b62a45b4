use motorhub_api_types::{Event, EventId, Message, NewEventData};

use super::client::ApiClient;
use crate::application::error::ApiError;
use crate::domain::calendar::EventMonth;

impl ApiClient {
    /// Every event of one calendar month; the endpoint is not paginated.
    pub async fn month_events(&self, month: EventMonth) -> Result<Vec<Event>, ApiError> {
        let query = [
            ("month", month.month().to_string()),
            ("year", month.year().to_string()),
        ];
        self.get("events", &query).await
    }

    pub async fn event(&self, id: EventId) -> Result<Event, ApiError> {
        self.get(&format!("events/{id}"), &[]).await
    }

    pub async fn create_event(&self, data: &NewEventData) -> Result<Event, ApiError> {
        self.post("events/register", data).await
    }

    pub async fn edit_event(&self, id: EventId, data: &NewEventData) -> Result<Event, ApiError> {
        self.put(&format!("events/{id}"), data).await
    }

    pub async fn delete_event(&self, id: EventId) -> Result<Message, ApiError> {
        self.delete(&format!("events/{id}")).await
    }

    /// Returns the event with the server's attendance flag and count.
    pub async fn toggle_attendance(&self, id: EventId) -> Result<Event, ApiError> {
        self.post_empty(&format!("events/{id}/attend")).await
    }
}
