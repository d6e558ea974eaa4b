mod auth_support;

use std::time::Duration;

use photopick::auth::{AuthError, LocalCallbackFlow, OAuthClient};
use reqwest::Url;
use serde_json::json;
use tokio::sync::oneshot;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_support::oauth_config;

fn flow(server: &MockServer, timeout: Duration) -> LocalCallbackFlow {
    let config = oauth_config(server).with_redirect_url("http://127.0.0.1:0/callback");
    LocalCallbackFlow::new(OAuthClient::new(config), timeout)
}

/// Simulate the browser following the provider redirect.
fn redirect_browser(
    redirect_uri: &str,
    params: Vec<(&'static str, String)>,
) -> oneshot::Receiver<u16> {
    let url = Url::parse_with_params(redirect_uri, &params).expect("redirect url");
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let status = reqwest::get(url)
            .await
            .map(|r| r.status().as_u16())
            .unwrap_or(0);
        let _ = tx.send(status);
    });
    rx
}

#[tokio::test]
async fn code_is_exchanged_for_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut browser = None;
    let token = flow(&server, Duration::from_secs(10))
        .authenticate(|request| {
            assert!(request.authorize_url.contains("access_type=offline"));
            assert!(!request.redirect_uri.contains(":0/"));
            browser = Some(redirect_browser(
                &request.redirect_uri,
                vec![
                    ("code", "auth-code-1".to_string()),
                    ("state", request.state.clone()),
                ],
            ));
        })
        .await
        .expect("token");

    assert_eq!(token.access_token, "access-1");
    assert_eq!(token.refresh_token.as_deref(), Some("refresh-1"));
    assert!(token.is_valid());
    assert_eq!(browser.expect("browser").await.expect("status"), 200);
}

#[tokio::test]
async fn provider_error_is_access_denied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut browser = None;
    let err = flow(&server, Duration::from_secs(10))
        .authenticate(|request| {
            browser = Some(redirect_browser(
                &request.redirect_uri,
                vec![
                    ("error", "access_denied".to_string()),
                    ("state", request.state.clone()),
                ],
            ));
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::AccessDenied(ref m) if m == "access_denied"));
    assert_eq!(browser.expect("browser").await.expect("status"), 400);
}

#[tokio::test]
async fn forged_state_is_rejected() {
    let server = MockServer::start().await;

    let err = flow(&server, Duration::from_secs(10))
        .authenticate(|request| {
            redirect_browser(
                &request.redirect_uri,
                vec![
                    ("code", "auth-code-1".to_string()),
                    ("state", "forged".to_string()),
                ],
            );
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::StateMismatch));
}

#[tokio::test]
async fn no_redirect_times_out() {
    let server = MockServer::start().await;

    let err = flow(&server, Duration::from_millis(200))
        .authenticate(|_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Timeout(200)));
}

#[tokio::test]
async fn failed_exchange_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = flow(&server, Duration::from_secs(10))
        .authenticate(|request| {
            redirect_browser(
                &request.redirect_uri,
                vec![
                    ("code", "used-code".to_string()),
                    ("state", request.state.clone()),
                ],
            );
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::InvalidResponse(ref m) if m.contains("invalid_grant")));
}
