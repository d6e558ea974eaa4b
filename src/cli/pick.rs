//! Headless picking: create a session, wait for the selection, download it.

use tokio_util::sync::CancellationToken;

use crate::config::PickerConfig;
use crate::download::Downloader;
use crate::error::Result;
use crate::picker::{wait_for_selection, PollPolicy, SessionClient};

use super::{token_manager, PickArgs};

/// Handle `photopick pick`.
pub async fn handle_pick(config: &PickerConfig, args: PickArgs) -> Result<()> {
    config.validate()?;
    let tokens = token_manager(config).await;
    let sessions = SessionClient::new(config.api_base_url.clone());
    let downloader = Downloader::new(sessions.clone(), config.source_label.clone());

    let mut policy = PollPolicy::from(&config.poll);
    if let Some(max_attempts) = args.max_attempts {
        policy.max_attempts = max_attempts.max(1);
    }

    let token = tokens.access_token().await?;
    let session = sessions.create_session(&token).await?;
    match session.picker_uri.as_deref() {
        Some(uri) => {
            println!("Open this URL to choose photos:");
            println!("  {uri}");
        }
        None => println!("Session {} has no picker URL", session.id),
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let snapshot = wait_for_selection(&sessions, &tokens, &session, &policy, &cancel).await?;
    println!("{} item(s) selected", snapshot.media_items.len());

    let dest = args.dest.unwrap_or_else(|| config.download_dir.clone());
    // Re-fetch the token: the wait may have outlived it.
    let token = tokens.access_token().await?;
    let summary = downloader
        .download_items(&snapshot.media_items, &token, &dest)
        .await;
    println!(
        "Downloaded {}/{} ({} already present, {} failed) into {}",
        summary.downloaded,
        summary.total,
        summary.skipped,
        summary.failed,
        summary.directory.display()
    );

    if !args.keep_session {
        if let Err(e) = sessions.delete_session(&session.id, &token).await {
            tracing::warn!(session_id = %session.id, error = %e, "could not delete picker session");
        }
    }
    Ok(())
}
