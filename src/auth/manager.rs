use std::sync::Arc;

use tokio::sync::RwLock;

use super::error::AuthError;
use super::oauth::OAuthClient;
use super::store::TokenStore;
use super::token::Token;

/// Owner of the current credential, shared by every request handler.
///
/// Readers take the read lock; refresh and replacement take the write lock,
/// swap the in-memory token, and persist it after the lock is released.
pub struct TokenManager {
    current: RwLock<Option<Token>>,
    store: Arc<dyn TokenStore>,
    oauth: OAuthClient,
}

impl TokenManager {
    pub fn new(store: Arc<dyn TokenStore>, oauth: OAuthClient) -> Self {
        Self {
            current: RwLock::new(None),
            store,
            oauth,
        }
    }

    /// Build a manager seeded from the store. Unreadable tokens count as absent.
    pub async fn load(store: Arc<dyn TokenStore>, oauth: OAuthClient) -> Self {
        let manager = Self::new(store, oauth);
        manager.load_from_store().await;
        manager
    }

    pub async fn load_from_store(&self) -> Option<Token> {
        let loaded = match self.store.load() {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(error = %err, "stored token unreadable, login required");
                None
            }
        };
        *self.current.write().await = loaded.clone();
        loaded
    }

    pub fn oauth(&self) -> &OAuthClient {
        &self.oauth
    }

    pub async fn current(&self) -> Option<Token> {
        self.current.read().await.clone()
    }

    /// Whether a token is held that can be presented without refreshing.
    pub async fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .await
            .as_ref()
            .is_some_and(Token::is_valid)
    }

    /// Return a presentable token, refreshing it first when expired.
    ///
    /// A failed refresh of any kind discards the stored token and reports
    /// `ExpiredOrInvalidGrant`; the caller has to run the login flow again.
    pub async fn access_token(&self) -> Result<Token, AuthError> {
        {
            let guard = self.current.read().await;
            match guard.as_ref() {
                Some(token) if token.is_valid() => return Ok(token.clone()),
                Some(_) => {}
                None => return Err(AuthError::NotLoggedIn),
            }
        }

        let refreshed = {
            let mut guard = self.current.write().await;
            let stale = match guard.as_ref() {
                Some(token) if token.is_valid() => return Ok(token.clone()),
                Some(token) => token.clone(),
                None => return Err(AuthError::NotLoggedIn),
            };
            if !stale.can_refresh() {
                *guard = None;
                drop(guard);
                self.discard_stored();
                return Err(AuthError::ExpiredOrInvalidGrant);
            }
            match self.oauth.refresh(&stale).await {
                Ok(token) => {
                    *guard = Some(token.clone());
                    token
                }
                Err(err) => {
                    tracing::warn!(error = %err, "token refresh failed, discarding credential");
                    *guard = None;
                    drop(guard);
                    self.discard_stored();
                    return Err(AuthError::ExpiredOrInvalidGrant);
                }
            }
        };

        tracing::info!("access token refreshed");
        self.persist(&refreshed)?;
        Ok(refreshed)
    }

    /// Install a freshly issued token and persist it.
    pub async fn replace(&self, token: Token) -> Result<(), AuthError> {
        {
            let mut guard = self.current.write().await;
            *guard = Some(token.clone());
        }
        self.persist(&token)
    }

    /// Forget the credential in memory and on disk.
    pub async fn clear(&self) -> Result<(), AuthError> {
        *self.current.write().await = None;
        self.store.clear()
    }

    fn persist(&self, token: &Token) -> Result<(), AuthError> {
        self.store.save(token).inspect_err(|err| {
            tracing::error!(error = %err, "failed to persist token");
        })
    }

    fn discard_stored(&self) {
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, "failed to remove stored token");
        }
    }
}
