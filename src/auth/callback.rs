//! One-shot loopback listener for the authorization-code redirect.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use reqwest::Url;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use super::error::AuthError;
use super::oauth::{AuthorizationRequest, OAuthClient};
use super::token::Token;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Interactive login: print a consent URL, wait for the browser redirect on
/// a local listener, exchange the code.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use photopick::auth::{LocalCallbackFlow, OAuthClient};
/// use photopick::config::OAuthConfig;
///
/// # async fn run() -> Result<(), photopick::auth::AuthError> {
/// let oauth = OAuthClient::new(OAuthConfig::new("id", "secret"));
/// let flow = LocalCallbackFlow::new(oauth, Duration::from_secs(300));
/// let token = flow
///     .authenticate(|request| println!("Open {}", request.authorize_url))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct LocalCallbackFlow {
    oauth: OAuthClient,
    timeout: Duration,
}

#[derive(Debug)]
enum CallbackOutcome {
    Code(String),
    Denied(String),
    StateMismatch,
}

struct CallbackSlot {
    expected_state: String,
    sender: Mutex<Option<oneshot::Sender<CallbackOutcome>>>,
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl LocalCallbackFlow {
    pub fn new(oauth: OAuthClient, timeout: Duration) -> Self {
        Self { oauth, timeout }
    }

    /// Run the flow. `present` receives the consent URL once the listener is
    /// accepting connections.
    ///
    /// The first of {code, error, timeout} decides the outcome; the listener
    /// is shut down before this returns on every path.
    pub async fn authenticate<F>(&self, present: F) -> Result<Token, AuthError>
    where
        F: FnOnce(&AuthorizationRequest),
    {
        let redirect = Url::parse(&self.oauth.config().redirect_url).map_err(|e| {
            AuthError::Configuration(format!("invalid redirect url: {e}"))
        })?;
        let listener = bind_redirect(&redirect).await?;
        let local_addr = listener.local_addr()?;
        let redirect_uri = effective_redirect(&redirect, local_addr);
        let request = self.oauth.start_auth(Some(&redirect_uri));

        let (result_tx, result_rx) = oneshot::channel();
        let slot = Arc::new(CallbackSlot {
            expected_state: request.state.clone(),
            sender: Mutex::new(Some(result_tx)),
        });
        let app = Router::new()
            .route(redirect.path(), get(handle_callback))
            .with_state(slot);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });
        tracing::info!(%local_addr, "waiting for authorization callback");

        present(&request);

        let outcome = tokio::select! {
            received = result_rx => received.ok(),
            _ = tokio::time::sleep(self.timeout) => {
                shutdown(shutdown_tx, &mut server).await;
                return Err(AuthError::Timeout(self.timeout.as_millis() as u64));
            }
        };
        shutdown(shutdown_tx, &mut server).await;

        match outcome {
            Some(CallbackOutcome::Code(code)) => {
                self.oauth.exchange_code(&code, &request.redirect_uri).await
            }
            Some(CallbackOutcome::Denied(message)) => Err(AuthError::AccessDenied(message)),
            Some(CallbackOutcome::StateMismatch) => Err(AuthError::StateMismatch),
            None => Err(AuthError::InvalidResponse(
                "callback listener stopped before a redirect arrived".to_string(),
            )),
        }
    }
}

async fn shutdown(
    signal: oneshot::Sender<()>,
    server: &mut tokio::task::JoinHandle<std::io::Result<()>>,
) {
    let _ = signal.send(());
    match tokio::time::timeout(SHUTDOWN_GRACE, &mut *server).await {
        Ok(Ok(Err(err))) => tracing::warn!(error = %err, "callback listener failed"),
        Ok(_) => {}
        Err(_) => {
            tracing::warn!("callback listener did not drain in time, aborting");
            server.abort();
        }
    }
}

async fn handle_callback(
    State(slot): State<Arc<CallbackSlot>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let sender = slot
        .sender
        .lock()
        .ok()
        .and_then(|mut guard| guard.take());
    let Some(sender) = sender else {
        return (StatusCode::GONE, "This login request was already handled.").into_response();
    };

    let outcome = classify(&slot.expected_state, params);
    let response = match &outcome {
        CallbackOutcome::Code(_) => (
            StatusCode::OK,
            Html(
                "<h1>Authentication successful!</h1><p>You can close this window.</p>".to_string(),
            ),
        ),
        CallbackOutcome::Denied(message) => (
            StatusCode::BAD_REQUEST,
            Html(format!(
                "<h1>Authentication failed</h1><p>{}</p>",
                escape_html(message)
            )),
        ),
        CallbackOutcome::StateMismatch => (
            StatusCode::BAD_REQUEST,
            Html("<h1>Authentication failed</h1><p>State mismatch.</p>".to_string()),
        ),
    };
    let _ = sender.send(outcome);
    response.into_response()
}

fn classify(expected_state: &str, params: CallbackParams) -> CallbackOutcome {
    if let Some(error) = params.error.filter(|e| !e.is_empty()) {
        return CallbackOutcome::Denied(match params.error_description {
            Some(description) if !description.is_empty() => format!("{error}: {description}"),
            _ => error,
        });
    }
    if params.state.as_deref() != Some(expected_state) {
        return CallbackOutcome::StateMismatch;
    }
    match params.code.filter(|c| !c.is_empty()) {
        Some(code) => CallbackOutcome::Code(code),
        None => CallbackOutcome::Denied("no code in callback".to_string()),
    }
}

async fn bind_redirect(redirect: &Url) -> Result<TcpListener, AuthError> {
    let host = match redirect.host_str() {
        Some("localhost") | None => "127.0.0.1",
        Some(host) => host.trim_start_matches('[').trim_end_matches(']'),
    };
    let port = redirect.port_or_known_default().unwrap_or(80);
    TcpListener::bind((host, port)).await.map_err(|e| {
        AuthError::Io(format!("cannot listen on {host}:{port} for the OAuth callback: {e}"))
    })
}

/// The redirect URI with the port actually bound (differs only for port 0).
fn effective_redirect(redirect: &Url, local_addr: SocketAddr) -> String {
    if redirect.port() == Some(0) {
        let mut url = redirect.clone();
        if url.set_port(Some(local_addr.port())).is_ok() {
            return url.to_string();
        }
    }
    redirect.to_string()
}

pub(crate) fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
