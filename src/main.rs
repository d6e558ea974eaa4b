//! photopick binary entry point.

use photopick::cli::{auth, pick, serve, AuthCommands, Cli, Commands};
use photopick::config::PickerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "photopick=info,tower_http=info";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse_args();
    let result = match PickerConfig::load(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Serve(args) => serve::handle_serve(config, args).await,
            Commands::Auth(auth_args) => match auth_args.command {
                AuthCommands::Login => auth::handle_login(&config).await,
                AuthCommands::Status => auth::handle_status(&config).await,
                AuthCommands::Logout => auth::handle_logout(&config).await,
            },
            Commands::Pick(args) => pick::handle_pick(&config, args).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        if e.requires_login() {
            eprintln!("Run `photopick auth login` to sign in.");
        }
        std::process::exit(1);
    }
}
