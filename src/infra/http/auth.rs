use motorhub_api_types::{LoginData, LoginResponse, Message, RegisterData};

use super::client::ApiClient;
use crate::application::error::ApiError;

impl ApiClient {
    /// Exchange credentials for a token. Persisting the token is the
    /// session's job.
    pub async fn login(&self, data: &LoginData) -> Result<LoginResponse, ApiError> {
        self.post("auth/login", data).await
    }

    pub async fn logout(&self) -> Result<Message, ApiError> {
        self.post_empty("auth/logout").await
    }

    pub async fn register(&self, data: &RegisterData) -> Result<Message, ApiError> {
        self.post("users/register", data).await
    }
}
