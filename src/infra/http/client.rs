use std::sync::{Arc, OnceLock, Weak};
use std::time::Instant;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::application::error::ApiError;
use crate::config::ApiSettings;
use crate::infra::token_store::TokenStore;

/// Called when the backend rejects the stored credentials.
///
/// Runs synchronously on the task that received the 401, before the error is
/// returned to the caller.
pub trait UnauthorizedHook: Send + Sync {
    fn unauthorized(&self, error: &ApiError);
}

/// Query string pairs appended to a request URL.
pub type Query<'a> = [(&'a str, String)];

/// JSON REST client for the Motorhub backend.
pub struct ApiClient {
    http: Client,
    base: Url,
    asset_base: Url,
    tokens: TokenStore,
    on_unauthorized: OnceLock<Weak<dyn UnauthorizedHook>>,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings, tokens: TokenStore) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            http,
            base: settings.base_url.clone(),
            asset_base: settings.asset_url.clone(),
            tokens,
            on_unauthorized: OnceLock::new(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("motorhub/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Register the session teardown hook. Only the first registration wins;
    /// returns `false` when a hook was already set.
    pub fn set_unauthorized_hook(&self, hook: Weak<dyn UnauthorizedHook>) -> bool {
        self.on_unauthorized.set(hook).is_ok()
    }

    /// Public URL of an uploaded image.
    pub fn image_url(&self, path: &str) -> Option<Url> {
        image_url(&self.asset_base, path)
    }

    pub fn url(&self, path: &str, query: &Query<'_>) -> Result<Url, ApiError> {
        let mut url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::Network(format!("invalid request path `{path}`: {err}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, ApiError> {
        let mut builder = self
            .http
            .request(method, url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = self.tokens.load()? {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|err| ApiError::Storage(format!("stored token is not a valid header: {err}")))?;
            builder = builder.header(AUTHORIZATION, value);
        }
        Ok(builder)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let request = builder.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        let started_at = Instant::now();

        let response = self.http.execute(request).await.map_err(|err| {
            warn!(%method, path = %path, error = %err, "Request failed before a response arrived");
            ApiError::from(err)
        })?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(
            %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0,
            "Request completed"
        );

        if !status.is_success() {
            let error = ApiError::from_response(status, &body);
            if status == StatusCode::UNAUTHORIZED {
                self.notify_unauthorized(&error);
            }
            return Err(error);
        }

        serde_json::from_slice(&body).map_err(|err| {
            warn!(%method, path = %path, error = %err, "Response body did not match the expected shape");
            ApiError::Decode(err.to_string())
        })
    }

    fn notify_unauthorized(&self, error: &ApiError) {
        match self.on_unauthorized.get().and_then(Weak::upgrade) {
            Some(hook) => hook.unauthorized(error),
            None => debug!("Unauthorized response with no session hook registered"),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &Query<'_>) -> Result<T, ApiError> {
        let url = self.url(path, query)?;
        self.send(self.request(Method::GET, url)?).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, &[])?;
        self.send(self.request(Method::POST, url)?.json(body)).await
    }

    /// POST without a request body (toggle-style endpoints).
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        self.send(self.request(Method::POST, url)?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, &[])?;
        self.send(self.request(Method::PUT, url)?.json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        self.send(self.request(Method::DELETE, url)?).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        self.send(self.request(Method::POST, url)?.multipart(form)).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base.as_str())
            .field("asset_base", &self.asset_base.as_str())
            .field("tokens", &self.tokens.path())
            .finish_non_exhaustive()
    }
}

/// Public URL of an uploaded image: the backend stores paths under
/// `public/` and serves them from `storage/` on the asset origin.
pub fn image_url(asset_base: &Url, path: &str) -> Option<Url> {
    let relative = path.trim_start_matches('/').replacen("public/", "storage/", 1);
    asset_base.join(&relative).ok()
}

/// Register an `Arc`-held hook. The client only keeps a weak reference, so
/// the hook stops firing once its owner is dropped.
pub fn register_hook(client: &ApiClient, hook: &Arc<dyn UnauthorizedHook>) -> bool {
    client.set_unauthorized_hook(Arc::downgrade(hook))
}
