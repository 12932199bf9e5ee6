//! Core types for users-core

use chrono::{DateTime, Utc};
use openlot_auth_core::{Claim, UserRecord, secret};
use serde::{Deserialize, Serialize};

/// A stored user account.
#[derive(Debug, Clone, Serialize)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub security_question: Option<String>,
    #[serde(skip_serializing)]
    pub security_answer_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Whether the candidate password matches the account.
    pub fn password_matches(&self, candidate: &str) -> bool {
        secret::verify_password(&self.password_hash, candidate)
    }

    /// Whether the candidate answer matches the stored security answer,
    /// after normalization.
    pub fn security_answer_matches(&self, candidate: &str) -> bool {
        match &self.security_answer_hash {
            Some(hash) => secret::verify_password(hash, &secret::normalize_security_answer(candidate)),
            None => false,
        }
    }

    /// The authentication-core view of this account.
    pub fn as_record(&self) -> UserRecord {
        UserRecord {
            id: self.id,
            username: self.username.clone(),
            password_hash: self.password_hash.clone(),
        }
    }
}

/// Request to create a new user account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub security_question: Option<String>,
    #[serde(default)]
    pub security_answer: Option<String>,
    #[serde(default)]
    pub claims: Vec<Claim>,
}
