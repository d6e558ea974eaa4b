//! Local web front: login, picking, thumbnails and downloads.
//!
//! Routes:
//! - `GET /`             home page
//! - `GET /auth`         redirect to OAuth consent
//! - `GET /callback`     OAuth redirect target
//! - `POST /picker`      create a picker session
//! - `GET /sessions`     list picker sessions
//! - `GET /session/{id}` session status with picked items
//! - `POST /download`    download a session (`?session=`)
//! - `GET /proxy`        authenticated thumbnail passthrough (`?url=`)

pub mod error;
pub mod handlers;
pub mod page;
pub mod state;

use std::future::Future;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/auth", get(handlers::auth_start))
        .route("/callback", get(handlers::auth_callback))
        .route("/picker", post(handlers::create_picker))
        .route("/sessions", get(handlers::list_sessions))
        .route("/session/{id}", get(handlers::get_session))
        .route("/download", post(handlers::download))
        .route("/proxy", get(handlers::proxy))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
