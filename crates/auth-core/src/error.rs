//! Error types for token grant and session operations
//!
//! The message text of every client-facing variant is part of the observable
//! contract of the token endpoint, together with the machine code from
//! [`AuthError::error_code`] and the status from [`AuthError::http_status`].

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization` header was supplied at all.
    #[error("Missing Authorization header.")]
    MissingAuthorization,

    /// The `Authorization` header did not parse as the expected scheme
    /// followed by a well-formed payload.
    #[error("Malformed Authorization header.")]
    MalformedAuthorization,

    /// No registered client matches the presented id/secret pair. Unknown id
    /// and wrong secret deliberately collapse into this one variant.
    #[error("Client not found.")]
    UnknownClient,

    /// The `grant_type` value is not one of the supported grants.
    #[error("Unsupported grant type.")]
    UnsupportedGrantType,

    /// Unknown username or wrong password; the two are indistinguishable.
    #[error("Incorrect username or password.")]
    InvalidCredentials,

    /// A password grant arrived without a username or without a password.
    #[error("Missing username or password.")]
    MissingCredentials,

    /// A refresh-token grant arrived without a refresh token.
    #[error("Missing refresh token.")]
    MissingRefreshToken,

    /// The refresh token does not resolve to a session owned by the
    /// requesting client (absent, foreign, or already consumed).
    #[error("Invalid refresh token.")]
    InvalidRefreshToken,

    /// The refresh token resolved but its session has expired.
    #[error("Expired refresh token.")]
    ExpiredRefreshToken,

    /// The endpoint requires a registered user behind the token.
    #[error("User must be registered.")]
    UnregisteredUser,

    /// The bearer token itself has expired.
    #[error("Expired access token.")]
    ExpiredAccessToken,

    /// The token holds none of the claims the endpoint accepts.
    #[error("Invalid claims.")]
    InsufficientClaims,

    /// Bearer token encoding or signing failed.
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// The backing store failed; not part of the client-facing taxonomy.
    #[error("Storage error: {0}")]
    Store(String),

    /// Any other internal fault (hashing failure, bad key material).
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

impl AuthError {
    /// Wrap a storage-backend failure.
    pub fn store(err: impl std::fmt::Display) -> Self {
        AuthError::Store(err.to_string())
    }

    /// The short machine-readable OAuth error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthorization | AuthError::MalformedAuthorization => {
                "invalid_request"
            }
            AuthError::UnknownClient => "invalid_client",
            AuthError::UnsupportedGrantType => "unsupported_grant_type",
            AuthError::InvalidCredentials
            | AuthError::MissingCredentials
            | AuthError::MissingRefreshToken
            | AuthError::InvalidRefreshToken
            | AuthError::ExpiredRefreshToken => "invalid_grant",
            AuthError::UnregisteredUser
            | AuthError::ExpiredAccessToken
            | AuthError::InsufficientClaims => "unauthorized",
            AuthError::Token(_) | AuthError::Store(_) | AuthError::Internal(_) => "server_error",
        }
    }

    /// The HTTP status a transport layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            AuthError::MissingAuthorization
            | AuthError::MalformedAuthorization
            | AuthError::UnknownClient
            | AuthError::UnsupportedGrantType => 400,
            AuthError::InvalidCredentials
            | AuthError::MissingCredentials
            | AuthError::MissingRefreshToken
            | AuthError::InvalidRefreshToken
            | AuthError::ExpiredRefreshToken
            | AuthError::UnregisteredUser
            | AuthError::ExpiredAccessToken
            | AuthError::InsufficientClaims => 401,
            AuthError::Token(_) | AuthError::Store(_) | AuthError::Internal(_) => 500,
        }
    }

    /// Whether the failure belongs to the client-facing taxonomy, as opposed
    /// to an internal fault that must surface as a generic server error.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            AuthError::Token(_) | AuthError::Store(_) | AuthError::Internal(_)
        )
    }
}

/// Wire form of a failed token request.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl From<&AuthError> for ErrorResponse {
    fn from(err: &AuthError) -> Self {
        if err.is_client_error() {
            ErrorResponse {
                error: err.error_code().to_string(),
                error_description: Some(err.to_string()),
            }
        } else {
            // Internal detail stays in the logs.
            ErrorResponse {
                error: err.error_code().to_string(),
                error_description: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_contract_codes() {
        assert_eq!(AuthError::MalformedAuthorization.error_code(), "invalid_request");
        assert_eq!(AuthError::MalformedAuthorization.http_status(), 400);
        assert_eq!(AuthError::UnknownClient.error_code(), "invalid_client");
        assert_eq!(AuthError::UnknownClient.http_status(), 400);
        assert_eq!(AuthError::InvalidCredentials.error_code(), "invalid_grant");
        assert_eq!(AuthError::InvalidCredentials.http_status(), 401);
        assert_eq!(AuthError::ExpiredRefreshToken.error_code(), "invalid_grant");
        assert_eq!(AuthError::InsufficientClaims.error_code(), "unauthorized");
    }

    #[test]
    fn message_text_is_stable() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Incorrect username or password."
        );
        assert_eq!(
            AuthError::InvalidRefreshToken.to_string(),
            "Invalid refresh token."
        );
        assert_eq!(
            AuthError::ExpiredRefreshToken.to_string(),
            "Expired refresh token."
        );
        assert_eq!(
            AuthError::MissingCredentials.to_string(),
            "Missing username or password."
        );
    }

    #[test]
    fn store_faults_hide_detail_from_the_wire() {
        let response = ErrorResponse::from(&AuthError::store("connection refused"));
        assert_eq!(response.error, "server_error");
        assert!(response.error_description.is_none());
    }
}
