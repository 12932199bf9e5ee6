//! # Users-Core
//!
//! Account and storage layer for the OPENLOT parking backend.
//!
//! This crate provides:
//! - SQLite-backed storage for user accounts, API clients, and sessions
//! - Argon2 password handling through the auth-core primitives
//! - Account, claim, and client management
//! - Startup bootstrap from injected configuration
//!
//! ## Architecture
//!
//! Users-core owns persistence and account management; the protocol
//! semantics (grants, sessions, bearer tokens) live in `openlot-auth-core`
//! and reach the database only through the storage traits this crate
//! implements.

pub mod accounts;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use accounts::AccountService;
pub use bootstrap::{BootstrapConfig, BootstrapReport, bootstrap};
pub use config::UsersConfig;
pub use error::{Error, Result};
pub use store::SqliteStore;
pub use types::{CreateUserRequest, UserAccount};

use std::sync::Arc;

use openlot_auth_core::AuthService;

/// Initialize the service stack: connect the store, wire the token core,
/// and run the bootstrap when one is configured.
pub async fn init(config: UsersConfig) -> Result<(AuthService, AccountService)> {
    let store = Arc::new(SqliteStore::new(&config.database_url).await?);

    let auth = AuthService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        config.auth.clone(),
    )?;
    let accounts = AccountService::new(store);

    if let Some(bootstrap_config) = &config.bootstrap {
        bootstrap(&accounts, bootstrap_config).await?;
    }

    Ok((auth, accounts))
}
