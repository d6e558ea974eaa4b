use std::path::{Path, PathBuf};

use chrono::Utc;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::auth::Token;
use crate::error::{PickerError, Result};
use crate::picker::{MediaItem, SessionClient};

use super::layout::{destination_dir, download_url, target_filename};

/// Aggregate counts for one session download.
///
/// `downloaded` includes items that were already on disk (`skipped`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub total: usize,
    pub skipped: usize,
    pub failed: usize,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Fetched,
    AlreadyPresent,
}

/// Copies a session's picked items into the dated directory layout.
#[derive(Debug, Clone)]
pub struct Downloader {
    http: Client,
    sessions: SessionClient,
    source_label: String,
}

impl Downloader {
    pub fn new(sessions: SessionClient, source_label: impl Into<String>) -> Self {
        Self::with_http_client(Client::new(), sessions, source_label)
    }

    pub fn with_http_client(
        http: Client,
        sessions: SessionClient,
        source_label: impl Into<String>,
    ) -> Self {
        Self {
            http,
            sessions,
            source_label: source_label.into(),
        }
    }

    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    /// List every item of the session and download them one after another.
    ///
    /// Only the listing can fail the call; per-item failures are counted.
    pub async fn download_session(
        &self,
        session_id: &str,
        token: &Token,
        dest_root: &Path,
    ) -> Result<DownloadSummary> {
        let items = self.sessions.list_all_media_items(session_id, token).await?;
        tracing::info!(session_id, items = items.len(), root = %dest_root.display(), "downloading session");
        Ok(self.download_items(&items, token, dest_root).await)
    }

    pub async fn download_items(
        &self,
        items: &[MediaItem],
        token: &Token,
        dest_root: &Path,
    ) -> DownloadSummary {
        let mut summary = DownloadSummary {
            total: items.len(),
            directory: dest_root.to_path_buf(),
            ..Default::default()
        };

        for item in items {
            match self.download_item(item, token, dest_root).await {
                Ok(ItemOutcome::Fetched) => summary.downloaded += 1,
                Ok(ItemOutcome::AlreadyPresent) => {
                    summary.downloaded += 1;
                    summary.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!(item_id = %item.id, error = %e, "item download failed");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            failed = summary.failed,
            total = summary.total,
            "download finished"
        );
        summary
    }

    async fn download_item(
        &self,
        item: &MediaItem,
        token: &Token,
        dest_root: &Path,
    ) -> Result<ItemOutcome> {
        if item.base_url().is_empty() {
            return Err(PickerError::InvalidArgument(format!(
                "item {} has no base URL",
                item.id
            )));
        }

        let dir = destination_dir(dest_root, item, Utc::now(), &self.source_label);
        fs::create_dir_all(&dir).await?;
        let path = dir.join(target_filename(item));
        if fs::try_exists(&path).await? {
            tracing::debug!(path = %path.display(), "already downloaded");
            return Ok(ItemOutcome::AlreadyPresent);
        }

        let response = self
            .http
            .get(download_url(item))
            .header("Authorization", token.authorization())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PickerError::api(
                status.as_u16(),
                format!("download of {} failed", item.id),
            ));
        }

        let partial = partial_path(&path);
        let written = write_body(response, &partial).await;
        commit_partial(written, &partial, &path).await?;
        tracing::debug!(path = %path.display(), "downloaded");
        Ok(ItemOutcome::Fetched)
    }
}

/// Move a fully written `.part` file into place; on any failure it is removed.
async fn commit_partial(written: Result<()>, partial: &Path, path: &Path) -> Result<()> {
    let committed = match written {
        Ok(()) => fs::rename(partial, path).await.map_err(PickerError::from),
        Err(e) => Err(e),
    };
    if committed.is_err() {
        if let Err(cleanup) = fs::remove_file(partial).await {
            tracing::debug!(error = %cleanup, "partial file already gone");
        }
    }
    committed
}

async fn write_body(response: reqwest::Response, path: &Path) -> Result<()> {
    let mut file = fs::File::create(path).await?;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_sits_next_to_target() {
        assert_eq!(
            partial_path(Path::new("/r/2024/03/l/a.jpg")),
            PathBuf::from("/r/2024/03/l/a.jpg.part")
        );
    }

    #[tokio::test]
    async fn failed_rename_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("a.jpg");
        let partial = dir.path().join("a.jpg.part");
        fs::write(&partial, b"bytes").await.unwrap();

        let committed = commit_partial(Ok(()), &partial, &target).await;

        assert!(matches!(committed, Err(PickerError::Io(_))));
        assert!(!partial.exists());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn committed_partial_becomes_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.jpg");
        let partial = partial_path(&target);
        fs::write(&partial, b"bytes").await.unwrap();

        commit_partial(Ok(()), &partial, &target).await.unwrap();

        assert!(!partial.exists());
        assert_eq!(fs::read(&target).await.unwrap(), b"bytes");
    }

    #[test]
    fn summary_serializes_counts() {
        let summary = DownloadSummary {
            downloaded: 2,
            total: 2,
            skipped: 1,
            failed: 0,
            directory: PathBuf::from("out"),
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["downloaded"], 2);
        assert_eq!(value["total"], 2);
        assert_eq!(value["directory"], "out");
    }
}
