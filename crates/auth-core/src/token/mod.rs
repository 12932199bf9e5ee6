//! Bearer token issuance and verification
//!
//! Serializes the access-token descriptor into a signed HS256 JWT and guards
//! resource endpoints: scheme and signature first, then registration, expiry,
//! and claim checks, in that order.

use std::collections::HashSet;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::secret;
use crate::types::{AccessToken, Claim, Session, TokenResponse};

/// JWT payload carried by issued bearer tokens.
#[derive(Debug, Serialize, Deserialize)]
struct BearerClaims {
    iss: String,
    sub: String,
    jti: String,
    iat: i64,
    exp: i64,
    client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<i64>,
    #[serde(default)]
    claims: HashSet<Claim>,
}

/// Issues and verifies bearer tokens for one signing key.
pub struct TokenIssuer {
    issuer: String,
    access_ttl_seconds: u64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let signing_secret = config
            .signing_secret
            .clone()
            .unwrap_or_else(|| secret::random_alphanumeric(secret::SIGNING_SECRET_LEN));

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        // Expiry is checked by the caller after the registration check, so
        // the failure ordering of the contract holds.
        validation.validate_exp = false;
        validation.validate_aud = false;

        TokenIssuer {
            issuer: config.issuer.clone(),
            access_ttl_seconds: config.access_ttl_seconds,
            encoding_key: EncodingKey::from_secret(signing_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(signing_secret.as_bytes()),
            header: Header::new(Algorithm::HS256),
            validation,
        }
    }

    /// Serialize an access-token descriptor into a signed bearer token.
    pub fn issue(&self, token: &AccessToken) -> Result<String> {
        let claims = BearerClaims {
            iss: self.issuer.clone(),
            sub: token
                .user_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| token.client_id.clone()),
            jti: Uuid::new_v4().to_string(),
            iat: chrono::Utc::now().timestamp(),
            exp: token.expires_on.timestamp(),
            client_id: token.client_id.clone(),
            user_id: token.user_id,
            claims: token.claims.clone(),
        };

        encode(&self.header, &claims, &self.encoding_key).map_err(AuthError::Token)
    }

    /// Build the token-endpoint success response.
    pub fn response(&self, token: &AccessToken, session: Option<&Session>) -> Result<TokenResponse> {
        Ok(TokenResponse {
            access_token: self.issue(token)?,
            token_type: "bearer".to_string(),
            refresh_token: session.map(|s| s.refresh_token.clone()),
            expires_in: self.access_ttl_seconds,
            expires_on: token.expires_on.timestamp_millis(),
        })
    }

    /// Verify the `Authorization: bearer <jwt>` header of a resource request.
    ///
    /// `required_claims` is a list of alternatives: the token must hold at
    /// least one of them. An empty list skips the claim check.
    pub fn verify(
        &self,
        authorization: Option<&str>,
        must_be_registered: bool,
        required_claims: &[Claim],
    ) -> Result<AccessToken> {
        let header = authorization.ok_or(AuthError::MissingAuthorization)?;

        let parts: Vec<&str> = header.split(' ').collect();
        let [scheme, jwt] = parts.as_slice() else {
            return Err(AuthError::MalformedAuthorization);
        };
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::MalformedAuthorization);
        }

        let data = decode::<BearerClaims>(jwt, &self.decoding_key, &self.validation)
            .map_err(|_| AuthError::MalformedAuthorization)?;
        let token = AccessToken {
            client_id: data.claims.client_id,
            user_id: data.claims.user_id,
            claims: data.claims.claims,
            expires_on: chrono::DateTime::from_timestamp(data.claims.exp, 0)
                .ok_or(AuthError::MalformedAuthorization)?,
        };

        if must_be_registered && !token.is_registered() {
            return Err(AuthError::UnregisteredUser);
        }
        if token.is_expired() {
            return Err(AuthError::ExpiredAccessToken);
        }
        if !required_claims.is_empty()
            && !required_claims.iter().any(|claim| token.has_claim(*claim))
        {
            return Err(AuthError::InsufficientClaims);
        }

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&AuthConfig::default())
    }

    fn sample_token() -> AccessToken {
        let mut token = AccessToken::new("website", Utc::now() + Duration::hours(1));
        token.user_id = Some(42);
        token.claims.insert(Claim::Admin);
        token.claims.insert(Claim::Customer);
        token
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let issuer = issuer();
        let token = sample_token();
        let jwt = issuer.issue(&token).unwrap();

        let verified = issuer
            .verify(Some(&format!("bearer {jwt}")), true, &[Claim::Admin])
            .unwrap();
        assert_eq!(verified.client_id, "website");
        assert_eq!(verified.user_id, Some(42));
        assert!(verified.has_claim(Claim::Customer));
        // Second precision is kept through the round trip.
        assert_eq!(
            verified.expires_on.timestamp(),
            token.expires_on.timestamp()
        );
    }

    #[test]
    fn scheme_and_signature_are_checked_first() {
        let issuer = issuer();
        let jwt = issuer.issue(&sample_token()).unwrap();

        assert!(matches!(
            issuer.verify(None, false, &[]),
            Err(AuthError::MissingAuthorization)
        ));
        assert!(matches!(
            issuer.verify(Some(&format!("basic {jwt}")), false, &[]),
            Err(AuthError::MalformedAuthorization)
        ));
        assert!(matches!(
            issuer.verify(Some("bearer not.a.jwt"), false, &[]),
            Err(AuthError::MalformedAuthorization)
        ));

        // A token signed by a different key does not verify.
        let other = TokenIssuer::new(&AuthConfig {
            signing_secret: Some("another-secret-entirely".into()),
            ..AuthConfig::default()
        });
        assert!(matches!(
            other.verify(Some(&format!("bearer {jwt}")), false, &[]),
            Err(AuthError::MalformedAuthorization)
        ));
    }

    #[test]
    fn registration_check_precedes_expiry() {
        let issuer = issuer();
        let mut token = sample_token();
        token.user_id = None;
        token.expires_on = Utc::now() - Duration::hours(1);
        let jwt = issuer.issue(&token).unwrap();

        // Both unregistered and expired: the registration failure wins.
        assert!(matches!(
            issuer.verify(Some(&format!("bearer {jwt}")), true, &[]),
            Err(AuthError::UnregisteredUser)
        ));
        assert!(matches!(
            issuer.verify(Some(&format!("bearer {jwt}")), false, &[]),
            Err(AuthError::ExpiredAccessToken)
        ));
    }

    #[test]
    fn claim_check_requires_any_match() {
        let issuer = issuer();
        let jwt = issuer.issue(&sample_token()).unwrap();
        let header = format!("bearer {jwt}");

        assert!(issuer.verify(Some(&header), true, &[]).is_ok());
        assert!(
            issuer
                .verify(Some(&header), true, &[Claim::Employee, Claim::Admin])
                .is_ok()
        );
        assert!(matches!(
            issuer.verify(Some(&header), true, &[Claim::Employee]),
            Err(AuthError::InsufficientClaims)
        ));
    }

    #[test]
    fn response_carries_session_refresh_token() {
        let issuer = issuer();
        let token = sample_token();
        let session = Session {
            refresh_token: "r".repeat(32),
            client_id: "website".into(),
            user_id: Some(42),
            expires_at: Utc::now() + Duration::hours(24),
        };

        let with_session = issuer.response(&token, Some(&session)).unwrap();
        assert_eq!(with_session.token_type, "bearer");
        assert_eq!(with_session.refresh_token.as_deref(), Some(session.refresh_token.as_str()));
        assert_eq!(with_session.expires_in, 3600);
        assert_eq!(with_session.expires_on, token.expires_on.timestamp_millis());

        let without_session = issuer.response(&token, None).unwrap();
        assert!(without_session.refresh_token.is_none());
    }
}
