//! Token grant walkthrough for the OPENLOT auth stack
//!
//! This example demonstrates:
//! - Bootstrapping a client and admin account
//! - A password grant against the token endpoint
//! - Refreshing (and rotating) the session
//! - Guarding a resource call with the bearer token

use anyhow::Result;
use openlot_auth_core::client_auth::encode_basic_credentials;
use openlot_auth_core::{Claim, TokenRequest};
use openlot_users_core::{BootstrapConfig, UsersConfig, init};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let config = UsersConfig {
        database_url: "sqlite://example_openlot.db?mode=rwc".to_string(),
        bootstrap: Some(BootstrapConfig::default()),
        ..Default::default()
    };

    println!("🚀 Initializing the auth stack...");
    let (auth, accounts) = init(config).await?;

    // The bootstrap already ran; fetch what it seeded.
    let client = accounts
        .find_client("website")
        .await?
        .expect("bootstrap registers the website client");
    println!("✅ API client ready: {} ({})", client.name, client.client_id);

    // Authenticate as the admin with a password grant.
    println!("\n🔐 Requesting a password grant...");
    let header = encode_basic_credentials(&client.client_id, &client.secret);
    let response = auth
        .token(
            Some(&header),
            &TokenRequest::password_request("admin", "pw123"),
        )
        .await?;

    println!("✅ Grant fulfilled!");
    println!("   Access token (first 40 chars): {}...", &response.access_token[..40]);
    println!("   Expires in: {} seconds", response.expires_in);
    let refresh_token = response.refresh_token.clone().expect("password grants refresh");

    // Use the bearer token against a protected resource.
    println!("\n🛡  Verifying the bearer token...");
    let bearer = format!("bearer {}", response.access_token);
    let token = auth.verify_bearer(Some(&bearer), true, &[Claim::Admin])?;
    println!("✅ Token valid for user id {:?}", token.user_id);

    // Rotate the session.
    println!("\n🔄 Refreshing the session...");
    let refreshed = auth
        .token(
            Some(&header),
            &TokenRequest::refresh_token_request(&refresh_token),
        )
        .await?;
    println!("✅ Session rotated!");
    println!(
        "   New refresh token differs: {}",
        refreshed.refresh_token.as_deref() != Some(refresh_token.as_str())
    );

    // The consumed refresh token is single-use.
    println!("\n❌ Replaying the old refresh token (should fail)...");
    match auth
        .token(
            Some(&header),
            &TokenRequest::refresh_token_request(&refresh_token),
        )
        .await
    {
        Ok(_) => println!("⚠️ Old token still works - unexpected!"),
        Err(e) => println!("✅ Old token rejected as expected: {}", e),
    }

    Ok(())
}
