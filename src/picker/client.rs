//! Thin typed client over the Photos Picker REST API.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::auth::Token;
use crate::config::DEFAULT_API_BASE_URL;
use crate::error::{PickerError, Result};

use super::types::{MediaItem, MediaItemsPage, PickerSession, SessionSnapshot, SessionStatus};

/// Items requested per `mediaItems.list` call.
pub const PAGE_SIZE: u32 = 100;
/// Upper bound on pages followed for one session.
pub const MAX_PAGES: usize = 50;

#[derive(Debug, Clone)]
pub struct SessionClient {
    http: Client,
    base_url: String,
}

impl Default for SessionClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

impl SessionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(Client::new(), base_url)
    }

    pub fn with_http_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Open a new selection session.
    pub async fn create_session(&self, token: &Token) -> Result<PickerSession> {
        let request = self
            .http
            .post(format!("{}/sessions", self.base_url))
            .json(&serde_json::json!({}));
        let session: PickerSession = self.send(request, token).await?;
        tracing::info!(session_id = %session.id, "picker session created");
        Ok(session)
    }

    pub async fn get_session(&self, session_id: &str, token: &Token) -> Result<SessionStatus> {
        check_session_id(session_id)?;
        let request = self
            .http
            .get(format!("{}/sessions/{session_id}", self.base_url));
        self.send(request, token).await
    }

    /// Fetch one page of picked items.
    pub async fn list_media_items(
        &self,
        session_id: &str,
        page_token: Option<&str>,
        token: &Token,
    ) -> Result<MediaItemsPage> {
        check_session_id(session_id)?;
        let page_size = PAGE_SIZE.to_string();
        let mut query = vec![("sessionId", session_id), ("pageSize", page_size.as_str())];
        if let Some(page_token) = page_token {
            query.push(("pageToken", page_token));
        }
        let request = self
            .http
            .get(format!("{}/mediaItems", self.base_url))
            .query(&query);
        self.send(request, token).await
    }

    /// Follow `nextPageToken` until exhausted or [`MAX_PAGES`] pages were read.
    pub async fn list_all_media_items(
        &self,
        session_id: &str,
        token: &Token,
    ) -> Result<Vec<MediaItem>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        for page in 0..MAX_PAGES {
            let batch = self
                .list_media_items(session_id, page_token.as_deref(), token)
                .await?;
            items.extend(batch.media_items);
            match batch.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => return Ok(items),
            }
            if page + 1 == MAX_PAGES {
                tracing::warn!(session_id, pages = MAX_PAGES, "page limit reached, listing truncated");
            }
        }
        Ok(items)
    }

    /// Session status merged with its picked items.
    ///
    /// Items are only listed once the session reports `mediaItemsSet`.
    pub async fn get_session_items(
        &self,
        session_id: &str,
        token: &Token,
    ) -> Result<SessionSnapshot> {
        let status = self.get_session(session_id, token).await?;
        let media_items = match status.media_items {
            Some(items) if !items.is_empty() => items,
            _ if status.session.media_items_set => {
                self.list_all_media_items(session_id, token).await?
            }
            _ => Vec::new(),
        };
        tracing::debug!(session_id, items = media_items.len(), "session snapshot");
        Ok(SessionSnapshot {
            session: status.session,
            media_items,
        })
    }

    /// Raw session listing, passed through untyped.
    pub async fn list_sessions(&self, token: &Token) -> Result<serde_json::Value> {
        let request = self.http.get(format!("{}/sessions", self.base_url));
        self.send(request, token).await
    }

    pub async fn delete_session(&self, session_id: &str, token: &Token) -> Result<()> {
        check_session_id(session_id)?;
        let request = self
            .http
            .delete(format!("{}/sessions/{session_id}", self.base_url));
        let response = request
            .header("Authorization", token.authorization())
            .send()
            .await?;
        ensure_success(response).await?;
        tracing::info!(session_id, "picker session deleted");
        Ok(())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, token: &Token) -> Result<T> {
        let response = request
            .header("Authorization", token.authorization())
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "picker API request failed");
    Err(PickerError::api(status.as_u16(), body))
}

/// Session ids are interpolated into URL paths.
fn check_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(PickerError::InvalidArgument(format!(
            "invalid session id: {session_id:?}"
        )))
    }
}
