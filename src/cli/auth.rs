//! CLI auth command handlers for login, status, and logout.

use chrono::Utc;

use crate::auth::LocalCallbackFlow;
use crate::config::PickerConfig;
use crate::error::Result;

use super::token_manager;

/// Handle `photopick auth login`.
pub async fn handle_login(config: &PickerConfig) -> Result<()> {
    config.validate()?;
    let tokens = token_manager(config).await;
    let flow = LocalCallbackFlow::new(tokens.oauth().clone(), config.callback_timeout);

    let token = flow
        .authenticate(|request| {
            println!("Open this URL in your browser to sign in:");
            println!("  {}", request.authorize_url);
            println!("Waiting for authorization...");
        })
        .await?;
    tokens.replace(token).await?;
    println!("Login successful. Token saved to {}", config.token_path.display());
    Ok(())
}

/// Handle `photopick auth status`.
pub async fn handle_status(config: &PickerConfig) -> Result<()> {
    let tokens = token_manager(config).await;
    println!("Token file: {}", config.token_path.display());
    match tokens.current().await {
        None => println!("Not logged in"),
        Some(token) => {
            let state = if token.is_valid() { "valid" } else { "expired" };
            println!("Access token: {state}");
            match token.expiry {
                Some(expiry) => {
                    let remaining = expiry - Utc::now();
                    println!("Expires: {expiry} ({} min)", remaining.num_minutes());
                }
                None => println!("Expires: never"),
            }
            println!(
                "Refresh token: {}",
                if token.can_refresh() { "present" } else { "absent" }
            );
        }
    }
    Ok(())
}

/// Handle `photopick auth logout`.
pub async fn handle_logout(config: &PickerConfig) -> Result<()> {
    let tokens = token_manager(config).await;
    tokens.clear().await?;
    println!("Logged out");
    Ok(())
}
