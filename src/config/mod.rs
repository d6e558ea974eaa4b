//! Configuration system (layered: defaults > config file > env).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::PickerError;

pub const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:8085/callback";
pub const DEFAULT_API_BASE_URL: &str = "https://photospicker.googleapis.com/v1";
pub const PICKER_SCOPE: &str = "https://www.googleapis.com/auth/photospicker.mediaitems.readonly";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8085";
pub const DEFAULT_SOURCE_LABEL: &str = "google_photos";
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 5 * 60;

/// OAuth client registration and provider endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_url: String,
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    /// Google endpoints with the picker read-only scope.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            scopes: vec![PICKER_SCOPE.to_string()],
        }
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = url.into();
        self
    }
}

/// Bounds for polling a picker session until the user finishes selecting.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: 150,
            interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(30),
            multiplier: 1.0,
        }
    }
}

/// Resolved configuration for the picker client and local server.
#[derive(Debug, Clone)]
pub struct PickerConfig {
    pub oauth: OAuthConfig,
    pub api_base_url: String,
    pub listen_addr: String,
    pub token_path: PathBuf,
    pub download_dir: PathBuf,
    pub source_label: String,
    pub callback_timeout: Duration,
    /// Hosts `/proxy` may forward the bearer token to (suffix match).
    pub proxy_hosts: Vec<String>,
    pub poll: PollSettings,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            oauth: OAuthConfig::new("", ""),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            token_path: default_base_dir().join("token.json"),
            download_dir: default_download_dir(),
            source_label: DEFAULT_SOURCE_LABEL.to_string(),
            callback_timeout: Duration::from_secs(DEFAULT_CALLBACK_TIMEOUT_SECS),
            proxy_hosts: vec!["googleusercontent.com".to_string()],
            poll: PollSettings::default(),
        }
    }
}

/// On-disk TOML layout; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    client_id: Option<String>,
    client_secret: Option<String>,
    auth_url: Option<String>,
    token_url: Option<String>,
    redirect_url: Option<String>,
    scopes: Option<Vec<String>>,
    api_base_url: Option<String>,
    listen_addr: Option<String>,
    token_path: Option<PathBuf>,
    download_dir: Option<PathBuf>,
    source_label: Option<String>,
    callback_timeout_secs: Option<u64>,
    proxy_hosts: Option<Vec<String>>,
    poll_max_attempts: Option<u32>,
    poll_interval_secs: Option<u64>,
}

impl PickerConfig {
    /// Default config file path (~/.photopick/config.toml).
    pub fn default_path() -> PathBuf {
        default_base_dir().join("config.toml")
    }

    /// Load defaults, then the config file (explicit path or default), then env.
    ///
    /// A missing default file is fine; a missing explicit file is an error.
    /// `.env` is loaded by the binary before this runs.
    pub fn load(path: Option<&Path>) -> Result<Self, PickerError> {
        let mut config = Self::default();
        match path {
            Some(path) => config.apply_file(path)?,
            None => {
                let default = Self::default_path();
                if default.exists() {
                    config.apply_file(&default)?;
                }
            }
        }
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML document on top of the current values.
    pub fn apply_toml(&mut self, raw: &str) -> Result<(), PickerError> {
        let file: FileConfig =
            toml::from_str(raw).map_err(|e| PickerError::Configuration(e.to_string()))?;
        set(&mut self.oauth.client_id, file.client_id);
        set(&mut self.oauth.client_secret, file.client_secret);
        set(&mut self.oauth.auth_url, file.auth_url);
        set(&mut self.oauth.token_url, file.token_url);
        set(&mut self.oauth.redirect_url, file.redirect_url);
        set(&mut self.oauth.scopes, file.scopes);
        set(&mut self.api_base_url, file.api_base_url);
        set(&mut self.listen_addr, file.listen_addr);
        set(&mut self.token_path, file.token_path);
        set(&mut self.download_dir, file.download_dir);
        set(&mut self.source_label, file.source_label);
        set(&mut self.proxy_hosts, file.proxy_hosts);
        set(&mut self.poll.max_attempts, file.poll_max_attempts);
        if let Some(secs) = file.callback_timeout_secs {
            self.callback_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.poll_interval_secs {
            self.poll.interval = Duration::from_secs(secs);
        }
        Ok(())
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), PickerError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            PickerError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        self.apply_toml(&raw)
    }

    /// Apply `PHOTOPICK_*` overrides through the given lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), PickerError> {
        set(&mut self.oauth.client_id, lookup("PHOTOPICK_CLIENT_ID"));
        set(&mut self.oauth.client_secret, lookup("PHOTOPICK_CLIENT_SECRET"));
        set(&mut self.oauth.redirect_url, lookup("PHOTOPICK_REDIRECT_URL"));
        set(&mut self.listen_addr, lookup("PHOTOPICK_LISTEN_ADDR"));
        set(&mut self.token_path, lookup("PHOTOPICK_TOKEN_PATH").map(PathBuf::from));
        set(&mut self.download_dir, lookup("PHOTOPICK_DOWNLOAD_DIR").map(PathBuf::from));
        set(&mut self.source_label, lookup("PHOTOPICK_SOURCE_LABEL"));
        if let Some(raw) = lookup("PHOTOPICK_CALLBACK_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                PickerError::Configuration(format!("PHOTOPICK_CALLBACK_TIMEOUT_SECS is not a number: {raw}"))
            })?;
            self.callback_timeout = Duration::from_secs(secs);
        }
        Ok(())
    }

    /// Check what the OAuth flows need before any network call is made.
    pub fn validate(&self) -> Result<(), PickerError> {
        if self.oauth.client_id.trim().is_empty() {
            return Err(PickerError::Configuration(
                "client id missing (set PHOTOPICK_CLIENT_ID or client_id in the config file)".to_string(),
            ));
        }
        if self.oauth.client_secret.trim().is_empty() {
            return Err(PickerError::Configuration(
                "client secret missing (set PHOTOPICK_CLIENT_SECRET or client_secret in the config file)"
                    .to_string(),
            ));
        }
        if self.source_label.contains(['/', '\\']) || self.source_label.is_empty() {
            return Err(PickerError::Configuration(format!(
                "source label must be a single path segment: {:?}",
                self.source_label
            )));
        }
        Ok(())
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn default_base_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".photopick"))
        .unwrap_or_else(|| PathBuf::from(".photopick"))
}

fn default_download_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.picture_dir().map(|p| p.join("photopick")))
        .unwrap_or_else(|| PathBuf::from("data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_target_google_picker() {
        let config = PickerConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.oauth.scopes, vec![PICKER_SCOPE.to_string()]);
        assert_eq!(config.source_label, "google_photos");
        assert_eq!(config.callback_timeout, Duration::from_secs(300));
        assert!(config.token_path.ends_with("token.json"));
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let mut config = PickerConfig::default();
        config
            .apply_toml(
                r#"
                client_id = "file-id"
                client_secret = "file-secret"
                download_dir = "/srv/photos"
                source_label = "picker"
                callback_timeout_secs = 30
                poll_max_attempts = 5
                "#,
            )
            .unwrap();
        assert_eq!(config.oauth.client_id, "file-id");
        assert_eq!(config.download_dir, PathBuf::from("/srv/photos"));
        assert_eq!(config.source_label, "picker");
        assert_eq!(config.callback_timeout, Duration::from_secs(30));
        assert_eq!(config.poll.max_attempts, 5);
    }

    #[test]
    fn unknown_toml_key_is_rejected() {
        let mut config = PickerConfig::default();
        let err = config.apply_toml("clientid = \"typo\"").unwrap_err();
        assert!(matches!(err, PickerError::Configuration(_)));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = PickerConfig::default();
        config.apply_toml("client_id = \"file-id\"").unwrap();
        config
            .apply_env(env(&[
                ("PHOTOPICK_CLIENT_ID", "env-id"),
                ("PHOTOPICK_TOKEN_PATH", "/tmp/t.json"),
            ]))
            .unwrap();
        assert_eq!(config.oauth.client_id, "env-id");
        assert_eq!(config.token_path, PathBuf::from("/tmp/t.json"));
    }

    #[test]
    fn bad_timeout_env_is_configuration_error() {
        let mut config = PickerConfig::default();
        let err = config
            .apply_env(env(&[("PHOTOPICK_CALLBACK_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, PickerError::Configuration(_)));
    }

    #[test]
    fn validate_requires_client_credentials() {
        let mut config = PickerConfig::default();
        assert!(config.validate().is_err());
        config.oauth.client_id = "id".to_string();
        config.oauth.client_secret = "secret".to_string();
        assert!(config.validate().is_ok());
        config.source_label = "a/b".to_string();
        assert!(config.validate().is_err());
    }
}
