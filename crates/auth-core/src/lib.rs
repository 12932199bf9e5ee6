//! # Auth-Core
//!
//! OAuth2-style token grant and session core for the OPENLOT parking backend.
//!
//! This crate provides:
//! - API client authentication from basic-credential headers
//! - Password, client-credentials, and refresh-token grant fulfillment
//! - Refreshable session lifecycle with single-use rotation
//! - Bearer token issuance and resource-endpoint verification
//!
//! ## Architecture
//!
//! Auth-core owns the protocol semantics and talks to storage only through
//! the [`ClientStore`], [`UserStore`], and [`SessionStore`] traits;
//! `users-core` supplies the SQLite-backed implementations.

pub mod client_auth;
pub mod config;
pub mod error;
pub mod grant;
pub mod secret;
pub mod session;
pub mod token;
pub mod types;
pub mod user_auth;

pub use client_auth::{ClientAuthenticator, ClientStore, parse_basic_credentials};
pub use config::AuthConfig;
pub use error::{AuthError, ErrorResponse, Result};
pub use grant::{Grant, GrantService};
pub use session::{SessionService, SessionStore};
pub use token::TokenIssuer;
pub use types::{
    AccessToken, ApiClient, Claim, GrantType, Session, TokenRequest, TokenResponse,
};
pub use user_auth::{UserAuthenticator, UserRecord, UserStore};

use std::sync::Arc;

/// The assembled token service: everything a transport layer needs to run
/// the token endpoint and to guard resource endpoints.
pub struct AuthService {
    clients: ClientAuthenticator,
    grants: GrantService,
    issuer: TokenIssuer,
}

impl AuthService {
    /// Wire the core against a set of stores.
    pub fn new(
        client_store: Arc<dyn ClientStore>,
        user_store: Arc<dyn UserStore>,
        session_store: Arc<dyn SessionStore>,
        config: AuthConfig,
    ) -> Result<Self> {
        let issuer = TokenIssuer::new(&config);
        let users = UserAuthenticator::new(user_store)?;
        let sessions = SessionService::new(session_store);

        Ok(AuthService {
            clients: ClientAuthenticator::new(client_store),
            grants: GrantService::new(users, sessions, config),
            issuer,
        })
    }

    /// Resolve the basic-credential header to a registered API client.
    pub async fn authenticate_client(&self, authorization: Option<&str>) -> Result<ApiClient> {
        self.clients.authenticate(authorization).await
    }

    /// Fulfill a token request for an already-authenticated client.
    pub async fn grant(&self, client: &ApiClient, request: &TokenRequest) -> Result<Grant> {
        self.grants.fulfill(client, request).await
    }

    /// The complete token-endpoint flow: authenticate the client, fulfill
    /// the grant, and serialize the response.
    pub async fn token(
        &self,
        authorization: Option<&str>,
        request: &TokenRequest,
    ) -> Result<TokenResponse> {
        let client = self.authenticate_client(authorization).await?;
        let grant = self.grant(&client, request).await?;
        self.issuer.response(&grant.token, grant.session.as_ref())
    }

    /// Verify the bearer header of a resource request.
    pub fn verify_bearer(
        &self,
        authorization: Option<&str>,
        must_be_registered: bool,
        required_claims: &[Claim],
    ) -> Result<AccessToken> {
        self.issuer.verify(authorization, must_be_registered, required_claims)
    }

    /// The underlying token issuer.
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }
}
