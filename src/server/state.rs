use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::auth::TokenManager;
use crate::config::PickerConfig;
use crate::download::Downloader;
use crate::picker::SessionClient;

/// Logins started through `/auth` that may still complete.
const MAX_PENDING_STATES: usize = 16;

/// Shared context handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PickerConfig>,
    pub tokens: Arc<TokenManager>,
    pub sessions: SessionClient,
    pub downloader: Downloader,
    pub http: reqwest::Client,
    pending_states: Arc<Mutex<VecDeque<String>>>,
}

impl AppState {
    pub fn new(config: PickerConfig, tokens: Arc<TokenManager>) -> Self {
        let http = reqwest::Client::new();
        let sessions = SessionClient::with_http_client(http.clone(), config.api_base_url.clone());
        let downloader =
            Downloader::with_http_client(http.clone(), sessions.clone(), config.source_label.clone());
        Self {
            config: Arc::new(config),
            tokens,
            sessions,
            downloader,
            http,
            pending_states: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Record an outstanding OAuth `state`, evicting the oldest when full.
    pub(crate) fn remember_state(&self, state: String) {
        if let Ok(mut pending) = self.pending_states.lock() {
            if pending.len() >= MAX_PENDING_STATES {
                pending.pop_front();
            }
            pending.push_back(state);
        }
    }

    /// Consume `state`; true only the first time a remembered value is seen.
    pub(crate) fn take_state(&self, state: &str) -> bool {
        let Ok(mut pending) = self.pending_states.lock() else {
            return false;
        };
        match pending.iter().position(|s| s == state) {
            Some(index) => {
                pending.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether `/proxy` may forward the bearer token to `host`.
    pub(crate) fn proxy_allows(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.config.proxy_hosts.iter().any(|allowed| {
            let allowed = allowed.trim_start_matches('.').to_ascii_lowercase();
            host == allowed || host.ends_with(&format!(".{allowed}"))
        })
    }
}
