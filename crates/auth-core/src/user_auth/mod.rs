//! End-user authentication and claim resolution

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{AuthError, Result};
use crate::secret;
use crate::types::Claim;

/// A user account as seen by the authentication core: identity plus the
/// stored password hash. Account management lives elsewhere.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

impl UserRecord {
    /// Whether the candidate password matches the stored hash.
    pub fn password_matches(&self, candidate: &str) -> bool {
        secret::verify_password(&self.password_hash, candidate)
    }
}

/// Lookup seam for user accounts and their permission claims.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;
    async fn claims_of(&self, user_id: i64) -> Result<HashSet<Claim>>;
}

/// Authenticates end users against a [`UserStore`].
pub struct UserAuthenticator {
    store: Arc<dyn UserStore>,
    /// Hash verified on the unknown-username path so that path costs the
    /// same as a real password check.
    decoy_hash: String,
}

impl UserAuthenticator {
    pub fn new(store: Arc<dyn UserStore>) -> Result<Self> {
        let decoy_hash = secret::hash_password(&secret::random_alphanumeric(24))?;
        Ok(UserAuthenticator { store, decoy_hash })
    }

    /// Authenticate with resource-owner credentials.
    ///
    /// An unknown username and a wrong password produce the identical error,
    /// so responses reveal nothing about which usernames exist.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserRecord> {
        match self.store.find_by_username(username).await? {
            Some(user) if user.password_matches(password) => Ok(user),
            Some(_) => {
                warn!(username = %username, "password mismatch");
                Err(AuthError::InvalidCredentials)
            }
            None => {
                secret::verify_password(&self.decoy_hash, password);
                warn!(username = %username, "unknown username");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// All claims currently attached to the user. An empty set is valid.
    pub async fn claims_of(&self, user_id: i64) -> Result<HashSet<Claim>> {
        self.store.claims_of(user_id).await
    }
}
