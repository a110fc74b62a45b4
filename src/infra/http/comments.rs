use std::sync::Arc;

use motorhub_api_types::{Comment, CommentId, Message, NewCommentData, PostId};

use super::client::ApiClient;
use super::pages::ApiPageSource;
use crate::application::error::ApiError;

impl ApiClient {
    pub async fn add_comment(&self, post_id: PostId, data: &NewCommentData) -> Result<Message, ApiError> {
        self.post(&format!("posts/{post_id}/comments"), data).await
    }

    pub async fn delete_comment(&self, post_id: PostId, comment_id: CommentId) -> Result<Message, ApiError> {
        self.delete(&format!("posts/{post_id}/comments/{comment_id}")).await
    }

    pub async fn toggle_comment_upvote(
        &self,
        post_id: PostId,
        comment_id: CommentId,
    ) -> Result<Message, ApiError> {
        self.post_empty(&format!("posts/{post_id}/comments/{comment_id}/toggle-upvote"))
            .await
    }
}

/// `GET /posts/{id}/comments?page`
pub fn comments_source(client: Arc<ApiClient>, post_id: PostId) -> ApiPageSource<Comment> {
    ApiPageSource::new(client, format!("posts/{post_id}/comments"))
}
