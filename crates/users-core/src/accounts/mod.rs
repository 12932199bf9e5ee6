//! Account, claim, and API client management

use std::sync::Arc;

use openlot_auth_core::{ApiClient, Claim, secret};
use tracing::info;

use crate::error::{Error, Result};
use crate::store::SqliteStore;
use crate::types::{CreateUserRequest, UserAccount};

/// Management operations over the user/client store.
pub struct AccountService {
    store: Arc<SqliteStore>,
}

impl AccountService {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        AccountService { store }
    }

    /// Create a user account with a hashed password and its initial claims.
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserAccount> {
        let password_hash = secret::hash_password(&request.password)?;
        let security_answer_hash = match &request.security_answer {
            Some(answer) => Some(secret::hash_password(&secret::normalize_security_answer(
                answer,
            ))?),
            None => None,
        };

        let user = self
            .store
            .insert_user(
                &request.username,
                &request.first_name,
                &request.last_name,
                &password_hash,
                request.security_question.as_deref(),
                security_answer_hash.as_deref(),
            )
            .await?;

        for claim in &request.claims {
            self.store.add_claim(user.id, *claim).await?;
        }

        info!(username = %user.username, user_id = user.id, "user account created");
        Ok(user)
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<UserAccount>> {
        self.store.user_by_username(username).await
    }

    /// Attach a claim to a user; attaching an already-held claim is a no-op.
    pub async fn grant_claim(&self, user_id: i64, claim: Claim) -> Result<()> {
        self.store.add_claim(user_id, claim).await
    }

    pub async fn revoke_claim(&self, user_id: i64, claim: Claim) -> Result<()> {
        self.store.remove_claim(user_id, claim).await
    }

    /// Register an API client under a unique name with random credentials.
    pub async fn register_client(&self, name: &str) -> Result<ApiClient> {
        let name: String = name.chars().take(secret::CLIENT_NAME_MAX_LEN).collect();
        let client = ApiClient {
            client_id: secret::random_alphanumeric(secret::CLIENT_ID_LEN),
            secret: secret::random_alphanumeric(secret::CLIENT_SECRET_LEN),
            name,
        };
        self.store.insert_client(&client).await?;
        info!(client_id = %client.client_id, name = %client.name, "api client registered");
        Ok(client)
    }

    pub async fn find_client(&self, name: &str) -> Result<Option<ApiClient>> {
        self.store.client_by_name(name).await
    }

    /// Reset a password, gated on the account's security question.
    pub async fn reset_password(
        &self,
        username: &str,
        security_answer: &str,
        new_password: &str,
    ) -> Result<()> {
        let user = self
            .find_user(username)
            .await?
            .ok_or_else(|| Error::UserNotFound(username.to_string()))?;

        if user.security_answer_hash.is_none() {
            return Err(Error::NoSecurityQuestion);
        }
        if !user.security_answer_matches(security_answer) {
            return Err(Error::SecurityAnswerMismatch);
        }

        let password_hash = secret::hash_password(new_password)?;
        self.store.update_password_hash(user.id, &password_hash).await?;
        info!(username = %username, "password reset");
        Ok(())
    }
}
