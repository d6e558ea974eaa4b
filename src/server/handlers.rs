use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use reqwest::Url;
use serde::Deserialize;

use crate::download::DownloadSummary;
use crate::error::PickerError;
use crate::picker::{PickerSession, SessionSnapshot};

use super::error::ApiError;
use super::page;
use super::state::AppState;

const PROXY_CACHE_CONTROL: &str = "max-age=3600";

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    session: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    url: Option<String>,
}

pub async fn home(State(state): State<AppState>) -> Html<String> {
    Html(page::render(
        state.tokens.is_authenticated().await,
        state.config.poll.interval,
    ))
}

/// Start a login: remember a fresh `state` and send the browser to consent.
pub async fn auth_start(State(state): State<AppState>) -> Response {
    let request = state.tokens.oauth().start_auth(None);
    state.remember_state(request.state);
    Redirect::temporary(&request.authorize_url).into_response()
}

pub async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, ApiError> {
    if let Some(error) = params.error.filter(|e| !e.is_empty()) {
        let message = match params.error_description.filter(|d| !d.is_empty()) {
            Some(description) => format!("{error}: {description}"),
            None => error,
        };
        tracing::warn!(%message, "authorization denied");
        return Err(ApiError::bad_request(format!("Authorization failed: {message}")));
    }
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("No authorization code received"))?;
    let known = params
        .state
        .as_deref()
        .is_some_and(|s| state.take_state(s));
    if !known {
        return Err(ApiError::bad_request("Unknown or reused OAuth state"));
    }

    let oauth = state.tokens.oauth();
    let token = oauth
        .exchange_code(&code, &oauth.config().redirect_url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "code exchange failed");
            ApiError::internal(format!("Failed to exchange code: {e}"))
        })?;
    state
        .tokens
        .replace(token)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to save token: {e}")))?;
    tracing::info!("login completed");
    Ok(Redirect::temporary("/").into_response())
}

pub async fn create_picker(State(state): State<AppState>) -> Result<Json<PickerSession>, ApiError> {
    let token = state.tokens.access_token().await?;
    Ok(Json(state.sessions.create_session(&token).await?))
}

pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let token = state.tokens.access_token().await?;
    Ok(Json(state.sessions.list_sessions(&token).await?))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let token = state.tokens.access_token().await?;
    Ok(Json(state.sessions.get_session_items(&session_id, &token).await?))
}

pub async fn download(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> Result<Json<DownloadSummary>, ApiError> {
    let session_id = params
        .session
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing session parameter"))?;
    let token = state.tokens.access_token().await?;
    let summary = state
        .downloader
        .download_session(&session_id, &token, &state.config.download_dir)
        .await?;
    Ok(Json(summary))
}

/// Authenticated passthrough used by the page to render thumbnails.
pub async fn proxy(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
) -> Result<Response, ApiError> {
    let raw = params
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing url parameter"))?;
    let url = Url::parse(&raw).map_err(|e| ApiError::bad_request(format!("Invalid url: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::bad_request("Only http(s) urls can be proxied"));
    }
    let host = url.host_str().unwrap_or_default();
    if !state.proxy_allows(host) {
        tracing::warn!(host, "proxy request to host outside allow-list");
        return Err(ApiError::bad_request(format!("Host not allowed: {host}")));
    }

    let token = state.tokens.access_token().await?;
    let upstream = state
        .http
        .get(url)
        .header(AUTHORIZATION, token.authorization())
        .send()
        .await
        .map_err(PickerError::from)?;

    let status = upstream.status();
    let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
    let mut response = Response::builder()
        .status(status)
        .header(CACHE_CONTROL, PROXY_CACHE_CONTROL);
    if let Some(content_type) = content_type {
        response = response.header(CONTENT_TYPE, content_type);
    }
    response
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| ApiError::internal(e.to_string()))
}

pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Not found")
}
