//! Error types for photopick.

use thiserror::Error;

use crate::auth::AuthError;

/// Primary error type for all photopick operations.
#[derive(Error, Debug)]
pub enum PickerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authentication timed out after {0}ms")]
    AuthTimeout(u64),

    #[error("Token invalid: {0}")]
    TokenInvalid(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Gave up after {0} attempts")]
    Timeout(u32),

    #[error("Operation cancelled")]
    Cancelled,
}

impl PickerError {
    /// Create an upstream API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether this error is worth another poll attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }

    /// Whether the caller has to run the login flow again.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::TokenInvalid(_) | Self::AuthTimeout(_))
    }
}

impl From<AuthError> for PickerError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::NotLoggedIn | AuthError::ExpiredOrInvalidGrant => {
                PickerError::TokenInvalid(error.to_string())
            }
            AuthError::Timeout(ms) => PickerError::AuthTimeout(ms),
            AuthError::Configuration(msg) => PickerError::Configuration(msg),
            other => PickerError::Authentication(other.to_string()),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, PickerError>;
