use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Clock-skew tolerance applied before a token is considered expired.
pub const EXPIRY_SKEW_SECONDS: i64 = 10;

/// OAuth token persisted by a [`TokenStore`](super::TokenStore).
///
/// The JSON shape is `{access_token, token_type, refresh_token, expiry}` so
/// token files written by other OAuth2 clients load unchanged.
///
/// # Example
/// ```no_run
/// use photopick::auth::Token;
/// use chrono::{Duration, Utc};
///
/// let token = Token {
///     access_token: "access".to_string(),
///     token_type: "Bearer".to_string(),
///     refresh_token: Some("refresh".to_string()),
///     expiry: Some(Utc::now() + Duration::hours(1)),
/// };
/// assert!(token.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Token {
    /// Whether the access token can be presented right now.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && !self.is_expired_at(now)
    }

    /// A token without a known expiry never expires locally.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.known_expiry() {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_SKEW_SECONDS) <= now,
            None => false,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|value| !value.is_empty())
    }

    /// Header value for authenticated requests.
    pub fn authorization(&self) -> String {
        let kind = if self.token_type.is_empty() || self.token_type.eq_ignore_ascii_case("bearer") {
            "Bearer"
        } else {
            self.token_type.as_str()
        };
        format!("{kind} {}", self.access_token)
    }

    // Other clients serialize "no expiry" as the zero time.
    fn known_expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry.filter(|expiry| expiry.timestamp() > 0)
    }
}

fn default_token_type() -> String {
    "Bearer".to_string()
}
