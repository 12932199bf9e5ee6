//! API client authentication
//!
//! Resolves the `Authorization: basic <base64url(client_id:secret)>` header
//! carried by every token request to a registered [`ApiClient`].

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::warn;

use crate::error::{AuthError, Result};
use crate::secret;
use crate::types::ApiClient;

/// base64url, tolerant of both padded and unpadded payloads.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Lookup seam for registered API clients.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<ApiClient>>;
}

/// Split a basic-credential header into its `(client_id, secret)` pair.
///
/// The header must be exactly two space-separated tokens, the first equal to
/// `basic` case-insensitively, the second base64url-decodable to a UTF-8
/// string containing exactly one `:`. Every violation is the same
/// [`AuthError::MalformedAuthorization`].
pub fn parse_basic_credentials(header: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = header.split(' ').collect();
    let [scheme, payload] = parts.as_slice() else {
        return Err(AuthError::MalformedAuthorization);
    };
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(AuthError::MalformedAuthorization);
    }

    let decoded = BASE64
        .decode(payload)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or(AuthError::MalformedAuthorization)?;

    let fields: Vec<&str> = decoded.split(':').collect();
    let [client_id, client_secret] = fields.as_slice() else {
        return Err(AuthError::MalformedAuthorization);
    };

    Ok((client_id.to_string(), client_secret.to_string()))
}

/// Encode a `(client_id, secret)` pair into the header payload form.
pub fn encode_basic_credentials(client_id: &str, secret: &str) -> String {
    format!("basic {}", BASE64.encode(format!("{client_id}:{secret}")))
}

/// Authenticates API clients against a [`ClientStore`].
pub struct ClientAuthenticator {
    store: Arc<dyn ClientStore>,
}

impl ClientAuthenticator {
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        ClientAuthenticator { store }
    }

    /// Resolve the `Authorization` header to a registered client.
    ///
    /// Unknown client id and wrong secret both fail with the same
    /// [`AuthError::UnknownClient`]; the secret comparison is constant-time.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<ApiClient> {
        let header = authorization.ok_or(AuthError::MissingAuthorization)?;
        let (client_id, client_secret) = parse_basic_credentials(header)?;

        let client = self.store.find_by_client_id(&client_id).await?;
        match client {
            Some(client) if secret::constant_time_eq(&client.secret, &client_secret) => Ok(client),
            _ => {
                warn!(client_id = %client_id, "rejected unknown client credentials");
                Err(AuthError::UnknownClient)
            }
        }
    }
}
