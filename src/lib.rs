//! photopick: a Google Photos Picker client.
//!
//! Signs in with the OAuth authorization-code flow, opens picker sessions,
//! waits for the user's selection and copies the picked items into a
//! `root/YYYY/MM/<label>` directory tree. A small local web front drives
//! the same flow from a browser.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use photopick::auth::{FileTokenStore, OAuthClient, TokenManager};
//! use photopick::config::PickerConfig;
//! use photopick::picker::SessionClient;
//!
//! # async fn example() -> photopick::error::Result<()> {
//! let config = PickerConfig::load(None)?;
//! let store = Arc::new(FileTokenStore::new(config.token_path.clone()));
//! let tokens = TokenManager::load(store, OAuthClient::new(config.oauth.clone())).await;
//! let token = tokens.access_token().await?;
//! let session = SessionClient::new(config.api_base_url.clone())
//!     .create_session(&token)
//!     .await?;
//! println!("{:?}", session.picker_uri);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod download;
pub mod error;
pub mod picker;
pub mod server;

#[cfg(feature = "cli")]
pub mod cli;
