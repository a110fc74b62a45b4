use std::sync::Arc;

use motorhub_api_types::{Listing, Post, User, UserId, Vehicle};

use super::client::ApiClient;
use super::pages::ApiPageSource;
use crate::application::error::ApiError;

impl ApiClient {
    pub async fn me(&self) -> Result<User, ApiError> {
        self.get("users/me", &[]).await
    }

    pub async fn user_vehicles(&self, user_id: UserId) -> Result<Vec<Vehicle>, ApiError> {
        self.get(&format!("users/{user_id}/vehicles"), &[]).await
    }
}

/// `GET /users?page&search`
pub fn users_source(client: Arc<ApiClient>, search: Option<&str>) -> ApiPageSource<User> {
    ApiPageSource::new(client, "users").with_optional_filter("search", search)
}

/// `GET /users/{id}/listings?page`
pub fn user_listings_source(client: Arc<ApiClient>, user_id: UserId) -> ApiPageSource<Listing> {
    ApiPageSource::new(client, format!("users/{user_id}/listings"))
}

/// `GET /users/{id}/posts?page`
pub fn user_posts_source(client: Arc<ApiClient>, user_id: UserId) -> ApiPageSource<Post> {
    ApiPageSource::new(client, format!("users/{user_id}/posts"))
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use tempfile::TempDir;

    use super::*;
    use crate::infra::http::testing::{USER_JSON, client};

    #[tokio::test]
    async fn me_decodes_user() {
        let server = MockServer::start();
        let dir = TempDir::new().expect("temp dir");
        server.mock(|when, then| {
            when.method(GET).path("/api/users/me");
            then.status(200).body(USER_JSON);
        });

        let user = client(&server, &dir).me().await.expect("me");
        assert_eq!(user.id, 7);
        assert!(!user.is_admin());
    }

    #[tokio::test]
    async fn user_vehicles_is_a_plain_list() {
        let server = MockServer::start();
        let dir = TempDir::new().expect("temp dir");
        server.mock(|when, then| {
            when.method(GET).path("/api/users/7/vehicles");
            then.status(200).body(
                r#"[{"id":1,"make":"Fiat","model":"Panda","year":2004,"description":"red","images":[{"id":9,"image_path":"public/vehicles/9.jpg"}]}]"#,
            );
        });

        let vehicles = client(&server, &dir).user_vehicles(7).await.expect("vehicles");
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].images[0].id, 9);
    }

    #[test]
    fn sources_bind_user_paths() {
        let server = MockServer::start();
        let dir = TempDir::new().expect("temp dir");
        let api = client(&server, &dir);

        assert_eq!(user_posts_source(api.clone(), 7).path(), "users/7/posts");
        assert_eq!(user_listings_source(api.clone(), 7).path(), "users/7/listings");
        assert_eq!(
            users_source(api, Some("ad")).filters(),
            &[("search", "ad".to_string())]
        );
    }
}
