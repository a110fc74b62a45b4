//! Signed-in user context.
//!
//! The current user is observed through a `watch` channel rather than held
//! in a global. Teardown (logout or any 401) clears the persisted token and
//! the user, then ends the session in the cache so nothing the old user saw
//! is served again.

use std::sync::{Arc, Weak};

use motorhub_api_types::{LoginData, User};
use tokio::sync::watch;
use tracing::{info, warn};

use super::error::ApiError;
use super::validation::Validate;
use crate::cache::CacheTrigger;
use crate::infra::http::{ApiClient, UnauthorizedHook};

#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: Arc<ApiClient>,
    trigger: Arc<CacheTrigger>,
    user: watch::Sender<Option<User>>,
}

impl SessionInner {
    fn teardown(&self, reason: &'static str) {
        if let Err(err) = self.api.tokens().clear() {
            warn!(reason, error = %err, "Failed to clear session token");
        }
        let previous = self.user.send_replace(None);
        self.trigger.session_ended();
        info!(
            reason,
            user_id = previous.as_ref().map(|user| user.id),
            "Session ended"
        );
    }
}

impl UnauthorizedHook for SessionInner {
    fn unauthorized(&self, _error: &ApiError) {
        self.teardown("unauthorized");
    }
}

impl SessionContext {
    /// Build the context and register it as the client's 401 handler.
    pub fn new(api: Arc<ApiClient>, trigger: Arc<CacheTrigger>) -> Self {
        let (user, _) = watch::channel(None);
        let inner = Arc::new(SessionInner { api, trigger, user });

        let hook: Weak<dyn UnauthorizedHook> = Arc::<SessionInner>::downgrade(&inner);
        if !inner.api.set_unauthorized_hook(hook) {
            warn!("ApiClient already has an unauthorized hook; this session will not see 401s");
        }
        Self { inner }
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.user.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.user.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.inner.user.subscribe()
    }

    /// Rebuild the session from a persisted token.
    ///
    /// No token means signed out. A rejected token has already torn the
    /// session down by the time this returns `Ok(None)`.
    pub async fn restore(&self) -> Result<Option<User>, ApiError> {
        if self.inner.api.tokens().load()?.is_none() {
            return Ok(None);
        }
        match self.inner.api.me().await {
            Ok(user) => {
                info!(user_id = user.id, "Session restored");
                self.inner.user.send_replace(Some(user.clone()));
                Ok(Some(user))
            }
            Err(err) if err.is_auth() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Re-read the current user from the backend.
    pub async fn refresh(&self) -> Result<User, ApiError> {
        let user = self.inner.api.me().await?;
        self.inner.user.send_replace(Some(user.clone()));
        Ok(user)
    }

    pub async fn login(&self, data: &LoginData) -> Result<User, ApiError> {
        data.validate()?;
        let response = self.inner.api.login(data).await?;
        self.inner.api.tokens().save(&response.token)?;
        info!(user_id = response.user.id, "Logged in");
        self.inner.user.send_replace(Some(response.user.clone()));
        Ok(response.user)
    }

    /// Revoke the token on the backend and end the session locally.
    ///
    /// The local teardown happens even when the backend call fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.inner.api.logout().await;
        self.inner.teardown("logout");
        match result {
            Ok(_) => Ok(()),
            Err(err) if err.is_auth() => Ok(()),
            Err(err) => Err(err),
        }
    }

    pub fn teardown(&self) {
        self.inner.teardown("requested");
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.inner.api
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("user_id", &self.inner.user.borrow().as_ref().map(|user| user.id))
            .finish()
    }
}
