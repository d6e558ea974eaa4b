//! CLI entry point for photopick.

pub mod auth;
pub mod pick;
pub mod serve;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::auth::{FileTokenStore, OAuthClient, TokenManager};
use crate::config::PickerConfig;

/// Pick photos from Google Photos and copy them into dated folders.
#[derive(Parser, Debug)]
#[command(name = "photopick", version, about = "Google Photos Picker client")]
pub struct Cli {
    /// Config file (defaults to ~/.photopick/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the local web UI
    Serve(ServeArgs),
    /// Authentication management
    Auth(AuthArgs),
    /// Pick items in the browser and download them without the web UI
    Pick(PickArgs),
}

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Listen address, overrides the configured one
    #[arg(short, long)]
    pub listen: Option<String>,
}

#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Sign in through the browser
    Login,
    /// Show whether a usable token is stored
    Status,
    /// Remove the stored token
    Logout,
}

#[derive(Parser, Debug)]
pub struct PickArgs {
    /// Poll attempts before giving up on the selection
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Destination root, overrides the configured download directory
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// Leave the picker session open after downloading
    #[arg(long)]
    pub keep_session: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Token manager over the configured token file.
pub(crate) async fn token_manager(config: &PickerConfig) -> Arc<TokenManager> {
    let store = Arc::new(FileTokenStore::new(config.token_path.clone()));
    let oauth = OAuthClient::new(config.oauth.clone());
    Arc::new(TokenManager::load(store, oauth).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_serve_with_listen() {
        let cli = Cli::try_parse_from(["photopick", "serve", "--listen", "0.0.0.0:9000"]).unwrap();
        match cli.command {
            Commands::Serve(args) => assert_eq!(args.listen.as_deref(), Some("0.0.0.0:9000")),
            other => panic!("expected Serve, got {other:?}"),
        }
    }

    #[test]
    fn parse_auth_status() {
        let cli = Cli::try_parse_from(["photopick", "auth", "status"]).unwrap();
        match cli.command {
            Commands::Auth(auth) => assert!(matches!(auth.command, AuthCommands::Status)),
            other => panic!("expected Auth, got {other:?}"),
        }
    }

    #[test]
    fn parse_pick_options_and_global_config() {
        let cli = Cli::try_parse_from([
            "photopick",
            "pick",
            "--max-attempts",
            "10",
            "--dest",
            "/tmp/photos",
            "--config",
            "custom.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Commands::Pick(args) => {
                assert_eq!(args.max_attempts, Some(10));
                assert_eq!(args.dest, Some(PathBuf::from("/tmp/photos")));
                assert!(!args.keep_session);
            }
            other => panic!("expected Pick, got {other:?}"),
        }
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["photopick"]).is_err());
    }

    #[test]
    fn parse_unknown_auth_command_is_error() {
        assert!(Cli::try_parse_from(["photopick", "auth", "refresh"]).is_err());
    }
}
