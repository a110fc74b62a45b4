use std::sync::Arc;

use motorhub_api_types::{Message, NewPostData, Post, PostId};

use super::client::ApiClient;
use super::pages::ApiPageSource;
use crate::application::error::ApiError;

impl ApiClient {
    pub async fn post_details(&self, id: PostId) -> Result<Post, ApiError> {
        self.get(&format!("posts/{id}"), &[]).await
    }

    pub async fn create_post(&self, data: &NewPostData) -> Result<Post, ApiError> {
        self.post("posts", data).await
    }

    pub async fn edit_post(&self, id: PostId, data: &NewPostData) -> Result<Post, ApiError> {
        self.put(&format!("posts/{id}"), data).await
    }

    pub async fn delete_post(&self, id: PostId) -> Result<Message, ApiError> {
        self.delete(&format!("posts/{id}")).await
    }

    pub async fn toggle_post_upvote(&self, id: PostId) -> Result<Message, ApiError> {
        self.post_empty(&format!("posts/{id}/toggle-upvote")).await
    }
}

/// `GET /posts?page`
pub fn posts_source(client: Arc<ApiClient>) -> ApiPageSource<Post> {
    ApiPageSource::new(client, "posts")
}
