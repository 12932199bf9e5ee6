//! Error types for account and storage operations

use openlot_auth_core::AuthError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("Client name '{0}' is already registered")]
    DuplicateClientName(String),

    #[error("No account with username '{0}'")]
    UserNotFound(String),

    #[error("No security question on record for this account")]
    NoSecurityQuestion,

    #[error("Incorrect answer to the security question")]
    SecurityAnswerMismatch,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the underlying database failure was a unique-constraint hit.
    pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .map(|db| db.kind() == sqlx::error::ErrorKind::UniqueViolation)
            .unwrap_or(false)
    }
}
