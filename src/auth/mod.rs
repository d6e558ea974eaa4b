//! OAuth authorization-code flow, token refresh and token storage.

pub mod callback;
pub mod error;
pub mod manager;
pub mod oauth;
pub mod store;
pub mod token;

pub use callback::LocalCallbackFlow;
pub use error::AuthError;
pub use manager::TokenManager;
pub use oauth::{AuthorizationRequest, OAuthClient};
pub use store::{FileTokenStore, TokenStore};
pub use token::Token;
