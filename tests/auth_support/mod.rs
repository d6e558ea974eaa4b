#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use photopick::auth::{AuthError, OAuthClient, Token, TokenManager, TokenStore};
use photopick::config::OAuthConfig;
use wiremock::MockServer;

#[derive(Default)]
pub struct InMemoryTokenStore {
    token: Mutex<Option<Token>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, token: Token) {
        *self.token.lock().expect("store lock poisoned") = Some(token);
    }

    pub fn get(&self) -> Option<Token> {
        self.token.lock().expect("store lock poisoned").clone()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Result<Option<Token>, AuthError> {
        Ok(self.get())
    }

    fn save(&self, token: &Token) -> Result<(), AuthError> {
        *self.token.lock().expect("store lock poisoned") = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.token.lock().expect("store lock poisoned") = None;
        Ok(())
    }
}

/// Token valid for another hour.
pub fn token(access_token: &str) -> Token {
    Token {
        access_token: access_token.to_string(),
        token_type: "Bearer".to_string(),
        refresh_token: Some(format!("{access_token}-refresh")),
        expiry: Some(Utc::now() + Duration::hours(1)),
    }
}

/// Token that expired an hour ago but can be refreshed.
pub fn expired_token(access_token: &str) -> Token {
    Token {
        expiry: Some(Utc::now() - Duration::hours(1)),
        ..token(access_token)
    }
}

pub fn oauth_config(server: &MockServer) -> OAuthConfig {
    OAuthConfig::new("client-id", "client-secret")
        .with_auth_url(format!("{}/o/oauth2/auth", server.uri()))
        .with_token_url(format!("{}/token", server.uri()))
}

pub fn oauth_client(server: &MockServer) -> OAuthClient {
    OAuthClient::new(oauth_config(server))
}

/// Manager seeded with `token`, refreshing against `server`.
pub async fn manager_with(
    token: Option<Token>,
    server: &MockServer,
) -> (Arc<InMemoryTokenStore>, Arc<TokenManager>) {
    let store = Arc::new(InMemoryTokenStore::new());
    if let Some(token) = token {
        store.seed(token);
    }
    let manager = TokenManager::load(store.clone(), oauth_client(server)).await;
    (store, Arc::new(manager))
}
