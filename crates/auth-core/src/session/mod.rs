//! Refreshable session lifecycle
//!
//! A session is created by any refreshable grant, consumed exactly once by a
//! refresh-token grant, and deleted when found expired. There is no renewal
//! in place; every transition out of the active state is a deletion.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{AuthError, Result};
use crate::secret;
use crate::types::{ApiClient, Session};

/// Persistence seam for sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, session: Session) -> Result<Session>;
    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<Session>>;

    /// Remove the session, returning whether a stored row was actually
    /// removed. Removal of an absent token is not an error; the `false`
    /// return is what lets a caller detect that a concurrent request already
    /// consumed the session.
    async fn delete(&self, refresh_token: &str) -> Result<bool>;
}

/// Creates, validates, and retires refreshable sessions.
pub struct SessionService {
    store: Arc<dyn SessionStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        SessionService { store }
    }

    /// Mint and persist a session with a fresh random refresh token.
    ///
    /// Token uniqueness rests on entropy (32 alphanumeric characters); the
    /// store's primary key turns a collision into a loud error.
    pub async fn create(
        &self,
        client: &ApiClient,
        user_id: Option<i64>,
        expires_at: DateTime<Utc>,
    ) -> Result<Session> {
        let session = Session {
            refresh_token: secret::random_alphanumeric(secret::REFRESH_TOKEN_LEN),
            client_id: client.client_id.clone(),
            user_id,
            expires_at,
        };
        let session = self.store.save(session).await?;
        debug!(client_id = %session.client_id, "session created");
        Ok(session)
    }

    /// Resolve a refresh token for the requesting client.
    ///
    /// Three checks, in order: the token must exist, must belong to the
    /// requesting client, and must not be expired. Absent and foreign tokens
    /// fail identically so a client cannot probe for sessions it does not
    /// own; an expired session is deleted before the failure is reported.
    pub async fn validate(&self, refresh_token: &str, requesting_client: &ApiClient) -> Result<Session> {
        let Some(session) = self.store.find_by_refresh_token(refresh_token).await? else {
            warn!(client_id = %requesting_client.client_id, "refresh token not found");
            return Err(AuthError::InvalidRefreshToken);
        };

        if session.client_id != requesting_client.client_id {
            warn!(client_id = %requesting_client.client_id, "refresh token owned by another client");
            return Err(AuthError::InvalidRefreshToken);
        }

        if session.is_expired() {
            self.delete(&session).await?;
            warn!(client_id = %requesting_client.client_id, "refresh token expired");
            return Err(AuthError::ExpiredRefreshToken);
        }

        Ok(session)
    }

    /// Idempotent removal.
    pub async fn delete(&self, session: &Session) -> Result<()> {
        self.store.delete(&session.refresh_token).await?;
        debug!(client_id = %session.client_id, "session deleted");
        Ok(())
    }

    /// Single-use consumption of a validated session.
    ///
    /// If nothing was removed, a concurrent request rotated this token
    /// first; only one of the racers may proceed.
    pub(crate) async fn consume(&self, session: &Session) -> Result<()> {
        if !self.store.delete(&session.refresh_token).await? {
            warn!(client_id = %session.client_id, "refresh token already consumed");
            return Err(AuthError::InvalidRefreshToken);
        }
        debug!(client_id = %session.client_id, "session consumed");
        Ok(())
    }
}
