//! Configuration for users-core

use openlot_auth_core::AuthConfig;
use serde::Deserialize;

use crate::bootstrap::BootstrapConfig;
use crate::error::Result;

/// Main configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UsersConfig {
    pub database_url: String,
    pub auth: AuthConfig,
    /// When present, `init` seeds the store from it at startup.
    pub bootstrap: Option<BootstrapConfig>,
}

impl Default for UsersConfig {
    fn default() -> Self {
        UsersConfig {
            database_url: "sqlite://openlot.db?mode=rwc".to_string(),
            auth: AuthConfig::default(),
            bootstrap: None,
        }
    }
}

impl UsersConfig {
    /// Load configuration from an optional `openlot.toml` plus `OPENLOT_*`
    /// environment variables (e.g. `OPENLOT_DATABASE_URL`,
    /// `OPENLOT_AUTH__ACCESS_TTL_SECONDS`).
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("openlot").required(false))
            .add_source(config::Environment::with_prefix("OPENLOT").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_local_sqlite() {
        let config = UsersConfig::default();
        assert!(config.database_url.starts_with("sqlite://"));
        assert_eq!(config.auth.access_ttl_seconds, 3600);
        assert!(config.bootstrap.is_none());
    }
}
