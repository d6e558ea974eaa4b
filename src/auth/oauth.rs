use chrono::{Duration, Utc};
use reqwest::Url;
use serde::Deserialize;

use super::error::AuthError;
use super::token::Token;
use crate::config::OAuthConfig;

/// Authorization request returned by [`OAuthClient::start_auth`].
///
/// The caller sends the user to `authorize_url` and later checks the
/// `state` echoed back on the redirect.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub authorize_url: String,
    pub state: String,
    pub redirect_uri: String,
}

/// Three-legged OAuth2 client for the authorization-code grant.
///
/// # Example
/// ```no_run
/// use photopick::auth::OAuthClient;
/// use photopick::config::OAuthConfig;
///
/// let client = OAuthClient::new(OAuthConfig::new("client-id", "client-secret"));
/// let request = client.start_auth(None);
/// println!("open {}", request.authorize_url);
/// ```
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build a consent URL requesting offline (refresh-capable) access.
    ///
    /// `redirect_uri` overrides the configured one, which the local callback
    /// listener needs when it bound an ephemeral port.
    pub fn start_auth(&self, redirect_uri: Option<&str>) -> AuthorizationRequest {
        let state = random_state();
        let redirect_uri = redirect_uri
            .unwrap_or(self.config.redirect_url.as_str())
            .to_string();
        let scope = self.config.scopes.join(" ");
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state.as_str()),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ];
        let authorize_url = match Url::parse_with_params(&self.config.auth_url, &params) {
            Ok(url) => url.to_string(),
            Err(err) => {
                tracing::warn!(error = %err, auth_url = %self.config.auth_url, "invalid auth url");
                self.config.auth_url.clone()
            }
        };
        AuthorizationRequest {
            authorize_url,
            state,
            redirect_uri,
        }
    }

    /// Exchange an authorization code for a token.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<Token, AuthError> {
        self.ensure_credentials()?;
        let resp = self
            .http
            .post(&self.config.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::InvalidResponse(format!(
                "Token exchange failed with status {status}: {body}"
            )));
        }

        let payload: TokenExchangeResponse = resp.json().await?;
        Ok(token_from_exchange_response(payload, None))
    }

    /// Refresh an expired token using its refresh token.
    ///
    /// Providers usually omit the refresh token on refresh; the previous one
    /// is carried over in that case.
    pub async fn refresh(&self, token: &Token) -> Result<Token, AuthError> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::ExpiredOrInvalidGrant)?;
        self.ensure_credentials()?;

        let resp = self
            .http
            .post(&self.config.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status.is_client_error() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %body, "token refresh rejected");
            return Err(AuthError::ExpiredOrInvalidGrant);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::InvalidResponse(format!(
                "Token refresh failed with status {status}: {body}"
            )));
        }

        let payload: TokenExchangeResponse = resp.json().await?;
        Ok(token_from_exchange_response(payload, Some(refresh_token)))
    }

    fn ensure_credentials(&self) -> Result<(), AuthError> {
        if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
            return Err(AuthError::Configuration(
                "OAuth client id and secret are required".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
    token_type: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

fn token_from_exchange_response(payload: TokenExchangeResponse, previous_refresh: Option<&str>) -> Token {
    let expiry = payload
        .expires_in
        .filter(|secs| *secs > 0)
        .map(|secs| Utc::now() + Duration::seconds(secs));
    let refresh_token = payload
        .refresh_token
        .filter(|value| !value.is_empty())
        .or_else(|| previous_refresh.map(str::to_string));
    Token {
        access_token: payload.access_token,
        token_type: payload.token_type.unwrap_or_else(|| "Bearer".to_string()),
        refresh_token,
        expiry,
    }
}

fn random_state() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_requests_offline_access() {
        let client = OAuthClient::new(OAuthConfig::new("client-1", "secret-1"));
        let request = client.start_auth(None);
        let url = Url::parse(&request.authorize_url).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(params["client_id"], "client-1");
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["prompt"], "consent");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["state"], request.state);
        assert_eq!(params["redirect_uri"], "http://localhost:8085/callback");
        assert!(params["scope"].contains("photospicker.mediaitems.readonly"));
    }

    #[test]
    fn each_request_gets_a_fresh_state() {
        let client = OAuthClient::new(OAuthConfig::new("id", "secret"));
        assert_ne!(client.start_auth(None).state, client.start_auth(None).state);
    }

    #[test]
    fn refresh_response_without_refresh_token_keeps_previous() {
        let payload = TokenExchangeResponse {
            access_token: "new".to_string(),
            token_type: None,
            refresh_token: None,
            expires_in: Some(3599),
        };
        let token = token_from_exchange_response(payload, Some("old-refresh"));
        assert_eq!(token.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(token.token_type, "Bearer");
        assert!(token.is_valid());
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_is_invalid_grant() {
        let client = OAuthClient::new(OAuthConfig::new("id", "secret"));
        let token = Token {
            access_token: "a".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: None,
            expiry: None,
        };
        assert!(matches!(
            client.refresh(&token).await,
            Err(AuthError::ExpiredOrInvalidGrant)
        ));
    }
}
