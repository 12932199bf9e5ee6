//! Token grant fulfillment
//!
//! Dispatches a token request on its grant type, resolves the backing user
//! where the grant carries one, and manages the paired session lifecycle:
//! refresh-token grants consume their session (single-use rotation), and
//! every refreshable grant mints a fresh one.

use chrono::Utc;
use tracing::info;

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::session::SessionService;
use crate::types::{AccessToken, ApiClient, Claim, GrantType, Session, TokenRequest};
use crate::user_auth::UserAuthenticator;

/// Outcome of a fulfilled grant: the populated access-token descriptor and,
/// for refreshable grant types, the newly minted session.
#[derive(Debug, Clone)]
pub struct Grant {
    pub token: AccessToken,
    pub session: Option<Session>,
}

/// Fulfills token requests for an already-authenticated client.
pub struct GrantService {
    users: UserAuthenticator,
    sessions: SessionService,
    config: AuthConfig,
}

impl GrantService {
    pub fn new(users: UserAuthenticator, sessions: SessionService, config: AuthConfig) -> Self {
        GrantService {
            users,
            sessions,
            config,
        }
    }

    /// Fulfill a token request.
    ///
    /// The caller must have authenticated `client` beforehand. Any failure
    /// aborts the request; no partial token is ever produced.
    pub async fn fulfill(&self, client: &ApiClient, request: &TokenRequest) -> Result<Grant> {
        let now = Utc::now();
        let mut token = AccessToken::new(&client.client_id, now + self.config.access_ttl());

        let user_id = match request.grant_type {
            GrantType::Password => {
                let (username, password) = match (&request.username, &request.password) {
                    (Some(username), Some(password)) => (username, password),
                    _ => return Err(AuthError::MissingCredentials),
                };
                let user = self.users.authenticate(username, password).await?;
                Some(user.id)
            }
            GrantType::ClientCredentials => {
                // Fixed policy: an anonymous client acts as a customer.
                token.claims.insert(Claim::Customer);
                None
            }
            GrantType::RefreshToken => {
                let refresh_token = request
                    .refresh_token
                    .as_deref()
                    .ok_or(AuthError::MissingRefreshToken)?;
                let session = self.sessions.validate(refresh_token, client).await?;
                // One-time use: retire the presented session before minting
                // its replacement.
                self.sessions.consume(&session).await?;
                session.user_id
            }
        };

        if let Some(user_id) = user_id {
            token.user_id = Some(user_id);
            token.claims.extend(self.users.claims_of(user_id).await?);
        }

        let session = if request.grant_type.is_refreshable() {
            let expires_at = now + self.config.refresh_ttl();
            Some(self.sessions.create(client, user_id, expires_at).await?)
        } else {
            None
        };

        info!(
            client_id = %client.client_id,
            grant_type = request.grant_type.as_str(),
            registered = token.is_registered(),
            "token granted"
        );

        Ok(Grant { token, session })
    }
}
