//! Client configuration.
//!
//! Defaults come from environment variables baked in at build time (the
//! browser has no process environment at run time), then a few values can be
//! overridden from the key/value store.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{GatisError, Result};
use crate::storage::{KeyValueStore, STORAGE_API_URL, STORAGE_RESPONSE_MODE};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Which generation endpoint the server speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// `POST /generate` with `{prompt}`, answered with `{image_url}`.
    #[default]
    Json,
    /// `POST /generate-image/` with `{text}`, answered with image bytes.
    Binary,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Json => "json",
            ResponseMode::Binary => "binary",
        }
    }
}

impl FromStr for ResponseMode {
    type Err = GatisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ResponseMode::Json),
            "binary" | "legacy" => Ok(ResponseMode::Binary),
            other => Err(GatisError::ConfigError(format!(
                "unknown response mode '{}'",
                other
            ))),
        }
    }
}

/// How login and signup are verified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Credentials are checked by the server's `/token` endpoint.
    #[default]
    Remote,
    /// Any submitted form is accepted without contacting the server.
    Stub,
}

impl FromStr for AuthMode {
    type Err = GatisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(AuthMode::Remote),
            "stub" => Ok(AuthMode::Stub),
            other => Err(GatisError::ConfigError(format!(
                "unknown auth mode '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base address of the generation API, without a trailing slash.
    pub base_url: String,
    pub response_mode: ResponseMode,
    pub auth_mode: AuthMode,
    /// Maximum number of history entries kept; 0 keeps everything.
    pub history_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            response_mode: ResponseMode::default(),
            auth_mode: AuthMode::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl ClientConfig {
    /// Build from the `GATIS_*` variables captured at compile time.
    ///
    /// Each invalid value is logged and replaced by its default; the valid
    /// ones still apply.
    pub fn from_env() -> Self {
        let (config, errors) = Self::from_vars(
            option_env!("GATIS_API_URL"),
            option_env!("GATIS_RESPONSE_MODE"),
            option_env!("GATIS_AUTH_MODE"),
            option_env!("GATIS_HISTORY_LIMIT"),
        );
        for e in &errors {
            tracing::warn!("Ignoring build-time setting: {}", e);
        }
        config
    }

    fn from_vars(
        api_url: Option<&str>,
        response_mode: Option<&str>,
        auth_mode: Option<&str>,
        history_limit: Option<&str>,
    ) -> (Self, Vec<GatisError>) {
        let mut config = Self::default();
        let mut errors = Vec::new();
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            match normalize_base_url(url) {
                Ok(url) => config.base_url = url,
                Err(e) => errors.push(e),
            }
        }
        if let Some(mode) = response_mode {
            match mode.parse() {
                Ok(mode) => config.response_mode = mode,
                Err(e) => errors.push(e),
            }
        }
        if let Some(mode) = auth_mode {
            match mode.parse() {
                Ok(mode) => config.auth_mode = mode,
                Err(e) => errors.push(e),
            }
        }
        if let Some(limit) = history_limit {
            match limit.trim().parse() {
                Ok(limit) => config.history_limit = limit,
                Err(_) => errors.push(GatisError::ConfigError(format!(
                    "invalid history limit '{}'",
                    limit
                ))),
            }
        }
        (config, errors)
    }

    /// Apply overrides saved in the store. Invalid saved values are ignored
    /// so a bad override can't lock the user out of the app.
    pub fn with_overrides<S: KeyValueStore>(mut self, store: &S) -> Self {
        if let Some(url) = store.get(STORAGE_API_URL) {
            match normalize_base_url(&url) {
                Ok(url) => self.base_url = url,
                Err(e) => tracing::warn!("Ignoring saved API URL: {}", e),
            }
        }
        if let Some(mode) = store.get(STORAGE_RESPONSE_MODE) {
            match mode.parse() {
                Ok(mode) => self.response_mode = mode,
                Err(e) => tracing::warn!("Ignoring saved response mode: {}", e),
            }
        }
        self
    }
}

/// Trim whitespace and trailing slashes; require an http(s) scheme.
pub fn normalize_base_url(url: &str) -> Result<String> {
    let url = url.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(GatisError::ConfigError(format!(
            "API URL must start with http:// or https://, got '{}'",
            url
        )));
    }
    Ok(url.to_string())
}
