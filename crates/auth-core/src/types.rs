//! Core types for the token grant flow

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// The three supported OAuth2 grant flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    Password,
    ClientCredentials,
    RefreshToken,
}

impl GrantType {
    /// Whether a successful grant of this type mints a refreshable session.
    pub fn is_refreshable(&self) -> bool {
        match self {
            GrantType::Password | GrantType::RefreshToken => true,
            GrantType::ClientCredentials => false,
        }
    }

    /// The wire form of the grant type.
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::Password => "password",
            GrantType::ClientCredentials => "client_credentials",
            GrantType::RefreshToken => "refresh_token",
        }
    }

    /// Parse the wire form; anything unknown is an unsupported grant type.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "password" => Ok(GrantType::Password),
            "client_credentials" => Ok(GrantType::ClientCredentials),
            "refresh_token" => Ok(GrantType::RefreshToken),
            _ => Err(AuthError::UnsupportedGrantType),
        }
    }
}

/// Permission markers attached to user accounts and access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Claim {
    Admin,
    Employee,
    Customer,
}

impl Claim {
    pub fn as_str(&self) -> &'static str {
        match self {
            Claim::Admin => "ADMIN",
            Claim::Employee => "EMPLOYEE",
            Claim::Customer => "CUSTOMER",
        }
    }

    /// Parse the stored form, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Claim::Admin),
            "EMPLOYEE" => Some(Claim::Employee),
            "CUSTOMER" => Some(Claim::Customer),
            _ => None,
        }
    }
}

/// A registered API client allowed to request token grants.
#[derive(Debug, Clone, Serialize)]
pub struct ApiClient {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub secret: String,
    pub name: String,
}

/// A refreshable session, keyed by its opaque refresh token.
///
/// Immutable once created; the only lifecycle transitions are deletions
/// (consumed by rotation, removed on expiry, or revoked).
#[derive(Debug, Clone)]
pub struct Session {
    pub refresh_token: String,
    pub client_id: String,
    pub user_id: Option<i64>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Strict-inequality expiry check: a session whose expiry equals `now`
    /// is still valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// The in-memory result of a successful grant; never persisted.
///
/// `user_id` is `Some` exactly when a registered user backs the token, so a
/// token that is not user-backed cannot carry a stray user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub client_id: String,
    pub user_id: Option<i64>,
    pub claims: HashSet<Claim>,
    pub expires_on: DateTime<Utc>,
}

impl AccessToken {
    /// An empty token bound to the issuing client: no user, no claims.
    pub fn new(client_id: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        AccessToken {
            client_id: client_id.into(),
            user_id: None,
            claims: HashSet::new(),
            expires_on,
        }
    }

    /// Whether a registered user backs this token.
    pub fn is_registered(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn has_claim(&self, claim: Claim) -> bool {
        self.claims.contains(&claim)
    }

    /// Strict-inequality expiry check, mirroring [`Session::is_expired_at`].
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_on < now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// The user id if the token belongs to a registered customer.
    pub fn customer_user_id(&self) -> Option<i64> {
        self.user_id.filter(|_| self.has_claim(Claim::Customer))
    }

    /// The user id if the token belongs to a registered employee.
    pub fn employee_user_id(&self) -> Option<i64> {
        self.user_id.filter(|_| self.has_claim(Claim::Employee))
    }
}

/// Body of a token request, as submitted to the token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    pub grant_type: GrantType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenRequest {
    pub fn password_request(username: impl Into<String>, password: impl Into<String>) -> Self {
        TokenRequest {
            grant_type: GrantType::Password,
            username: Some(username.into()),
            password: Some(password.into()),
            refresh_token: None,
        }
    }

    pub fn client_credentials_request() -> Self {
        TokenRequest {
            grant_type: GrantType::ClientCredentials,
            username: None,
            password: None,
            refresh_token: None,
        }
    }

    pub fn refresh_token_request(refresh_token: impl Into<String>) -> Self {
        TokenRequest {
            grant_type: GrantType::RefreshToken,
            username: None,
            password: None,
            refresh_token: Some(refresh_token.into()),
        }
    }
}

/// Body of a successful token response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    pub expires_in: u64,
    /// Absolute expiry as epoch milliseconds.
    pub expires_on: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn grant_type_refreshability() {
        assert!(GrantType::Password.is_refreshable());
        assert!(GrantType::RefreshToken.is_refreshable());
        assert!(!GrantType::ClientCredentials.is_refreshable());
    }

    #[test]
    fn grant_type_parse_round_trip() {
        for gt in [
            GrantType::Password,
            GrantType::ClientCredentials,
            GrantType::RefreshToken,
        ] {
            assert_eq!(GrantType::parse(gt.as_str()).unwrap(), gt);
        }
    }

    #[test]
    fn unknown_grant_type_is_rejected() {
        assert!(matches!(
            GrantType::parse("authorization_code"),
            Err(AuthError::UnsupportedGrantType)
        ));
        assert!(matches!(
            GrantType::parse("PASSWORD"),
            Err(AuthError::UnsupportedGrantType)
        ));
    }

    #[test]
    fn session_expiry_boundary_is_strict() {
        let now = Utc::now();
        let session = Session {
            refresh_token: "t".into(),
            client_id: "c".into(),
            user_id: None,
            expires_at: now,
        };
        // Expiry equal to the current instant is not yet expired.
        assert!(!session.is_expired_at(now));
        assert!(session.is_expired_at(now + Duration::milliseconds(1)));
    }

    #[test]
    fn access_token_expiry_boundary_is_strict() {
        let now = Utc::now();
        let token = AccessToken::new("c", now);
        assert!(!token.is_expired_at(now));
        assert!(token.is_expired_at(now + Duration::milliseconds(1)));
    }

    #[test]
    fn typed_user_id_accessors_respect_claims() {
        let now = Utc::now();
        let mut token = AccessToken::new("c", now);
        token.user_id = Some(7);
        token.claims.insert(Claim::Customer);

        assert!(token.is_registered());
        assert_eq!(token.customer_user_id(), Some(7));
        assert_eq!(token.employee_user_id(), None);

        let anonymous = AccessToken::new("c", now);
        assert!(!anonymous.is_registered());
        assert_eq!(anonymous.customer_user_id(), None);
    }

    #[test]
    fn claim_wire_names_are_uppercase() {
        assert_eq!(
            serde_json::to_string(&Claim::Customer).unwrap(),
            "\"CUSTOMER\""
        );
        assert_eq!(Claim::parse("employee"), Some(Claim::Employee));
        assert_eq!(Claim::parse("SUPERUSER"), None);
    }
}
