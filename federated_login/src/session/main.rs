use async_trait::async_trait;
use chrono::{Duration, Utc};
use http::header::HeaderMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::session::config::SessionConfig;
use crate::session::errors::SessionError;
use crate::session::types::{SessionUser, StoredSession};
use crate::storage::CacheStore;
use crate::userdb::LocalUser;
use crate::utils::{cookie_value, gen_random_string, header_set_cookie};

const SESSION_PREFIX: &str = "session";

/// The host's session subsystem as seen by the login pipeline
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Establish a session for `user`, returning the headers that carry it
    /// back to the browser
    async fn log_in(&self, user: &LocalUser) -> Result<HeaderMap, SessionError>;

    /// Whether the request behind `headers` already has a live session
    async fn is_logged_in(&self, headers: &HeaderMap) -> Result<bool, SessionError> {
        Ok(self.get_user_from_session(headers).await?.is_some())
    }

    async fn get_user_from_session(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<SessionUser>, SessionError>;

    /// Drop the session and return headers that expire the cookie
    async fn log_out(&self, headers: &HeaderMap) -> Result<HeaderMap, SessionError>;
}

/// Cookie sessions stored in a [`CacheStore`]
pub struct CacheSessionManager {
    store: Arc<Mutex<Box<dyn CacheStore>>>,
    config: SessionConfig,
}

impl CacheSessionManager {
    pub fn new(store: Box<dyn CacheStore>, config: SessionConfig) -> Self {
        Self::with_shared_store(Arc::new(Mutex::new(store)), config)
    }

    pub fn with_shared_store(store: Arc<Mutex<Box<dyn CacheStore>>>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn session_id(&self, headers: &HeaderMap) -> Option<String> {
        cookie_value(headers, &self.config.cookie_name).filter(|id| !id.is_empty())
    }
}

#[async_trait]
impl SessionManager for CacheSessionManager {
    async fn log_in(&self, user: &LocalUser) -> Result<HeaderMap, SessionError> {
        let ttl = self.config.max_age;
        let out_of_range =
            || SessionError::InvalidData(format!("session lifetime {ttl}s is out of range"));
        let max_age = i64::try_from(ttl).map_err(|_| out_of_range())?;
        let expires_at = Duration::try_seconds(max_age)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(out_of_range)?;

        let session_id = gen_random_string(32)?;
        let stored_session = StoredSession {
            user: SessionUser::from(user),
            expires_at,
            ttl,
        };

        self.store
            .lock()
            .await
            .put_with_ttl(
                SESSION_PREFIX,
                &session_id,
                stored_session.try_into()?,
                ttl as usize,
            )
            .await?;

        let mut headers = HeaderMap::new();
        header_set_cookie(&mut headers, &self.config.cookie_name, &session_id, max_age)?;

        tracing::debug!(username = %user.username, "Session created");
        Ok(headers)
    }

    async fn get_user_from_session(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<SessionUser>, SessionError> {
        let Some(session_id) = self.session_id(headers) else {
            return Ok(None);
        };

        let Some(cached) = self.store.lock().await.get(SESSION_PREFIX, &session_id).await? else {
            tracing::debug!("Session cookie present but no stored session");
            return Ok(None);
        };

        let stored_session = StoredSession::try_from(cached)?;
        if stored_session.expires_at <= Utc::now() {
            tracing::debug!("Stored session has expired");
            return Ok(None);
        }

        Ok(Some(stored_session.user))
    }

    async fn log_out(&self, headers: &HeaderMap) -> Result<HeaderMap, SessionError> {
        if let Some(session_id) = self.session_id(headers) {
            self.store
                .lock()
                .await
                .remove(SESSION_PREFIX, &session_id)
                .await?;
        }

        let mut response_headers = HeaderMap::new();
        header_set_cookie(&mut response_headers, &self.config.cookie_name, "", -86400)?;
        Ok(response_headers)
    }
}
