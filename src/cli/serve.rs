use tokio::net::TcpListener;

use crate::config::PickerConfig;
use crate::error::{PickerError, Result};
use crate::server::{self, AppState};

use super::{token_manager, ServeArgs};

/// Handle `photopick serve`.
pub async fn handle_serve(mut config: PickerConfig, args: ServeArgs) -> Result<()> {
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    config.validate()?;

    let tokens = token_manager(&config).await;
    let listener = TcpListener::bind(&config.listen_addr).await.map_err(|e| {
        PickerError::Configuration(format!("cannot listen on {}: {e}", config.listen_addr))
    })?;
    println!("Open http://{} in your browser", listener.local_addr()?);
    if !tokens.is_authenticated().await {
        tracing::info!("no usable token stored, sign in from the home page");
    }

    let state = AppState::new(config, tokens);
    server::serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutting down");
    })
    .await?;
    Ok(())
}
