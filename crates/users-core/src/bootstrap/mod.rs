//! First-run seeding of the API client and administrator account
//!
//! Everything the process needs at startup is passed in through
//! [`BootstrapConfig`]; nothing is recorded in process-wide state. Running
//! the bootstrap against an already-seeded store changes nothing.

use openlot_auth_core::{ApiClient, Claim};
use serde::Deserialize;
use tracing::info;

use crate::accounts::AccountService;
use crate::error::Result;
use crate::types::{CreateUserRequest, UserAccount};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Name under which the default API client is registered.
    pub client_name: String,
    pub admin_username: String,
    pub admin_password: String,
    pub admin_first_name: String,
    pub admin_last_name: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        BootstrapConfig {
            client_name: "website".to_string(),
            admin_username: "admin".to_string(),
            admin_password: "pw123".to_string(),
            admin_first_name: "System".to_string(),
            admin_last_name: "Administrator".to_string(),
        }
    }
}

/// What the bootstrap found or created.
#[derive(Debug)]
pub struct BootstrapReport {
    pub client: ApiClient,
    pub client_created: bool,
    pub admin: UserAccount,
    pub admin_created: bool,
}

/// Ensure the configured API client and admin account exist.
pub async fn bootstrap(
    accounts: &AccountService,
    config: &BootstrapConfig,
) -> Result<BootstrapReport> {
    let (client, client_created) = match accounts.find_client(&config.client_name).await? {
        Some(existing) => (existing, false),
        None => (accounts.register_client(&config.client_name).await?, true),
    };

    let (admin, admin_created) = match accounts.find_user(&config.admin_username).await? {
        Some(existing) => (existing, false),
        None => {
            let admin = accounts
                .create_user(CreateUserRequest {
                    username: config.admin_username.clone(),
                    password: config.admin_password.clone(),
                    first_name: config.admin_first_name.clone(),
                    last_name: config.admin_last_name.clone(),
                    security_question: None,
                    security_answer: None,
                    claims: vec![Claim::Admin],
                })
                .await?;
            (admin, true)
        }
    };

    info!(
        client_id = %client.client_id,
        admin = %admin.username,
        client_created,
        admin_created,
        "bootstrap complete"
    );

    Ok(BootstrapReport {
        client,
        client_created,
        admin,
        admin_created,
    })
}
