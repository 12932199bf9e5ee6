//! Configuration for the token core

use chrono::Duration;
use serde::Deserialize;

/// Token issuance configuration, fixed at process start.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Name written into the `iss` claim of issued bearer tokens.
    pub issuer: String,
    /// Access-token lifetime in seconds.
    pub access_ttl_seconds: u64,
    /// Refresh-token lifetime in seconds.
    pub refresh_ttl_seconds: u64,
    /// HS256 signing secret. Generated at startup when absent, in which
    /// case issued tokens do not survive a restart.
    #[serde(default)]
    pub signing_secret: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            issuer: "openlot".to_string(),
            access_ttl_seconds: 3600,       // 60 minutes
            refresh_ttl_seconds: 86_400,    // 24 hours
            signing_secret: None,
        }
    }
}

impl AuthConfig {
    pub fn access_ttl(&self) -> Duration {
        Duration::seconds(self.access_ttl_seconds as i64)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::seconds(self.refresh_ttl_seconds as i64)
    }
}
