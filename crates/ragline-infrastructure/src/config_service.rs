//! Client configuration loading.
//!
//! Configuration is read from `config.toml` under the ragline config
//! directory, with environment variables taking precedence:
//!
//! - `RAGLINE_BASE_URL` — answering backend base URL
//! - `RAGLINE_API_TOKEN` — bearer token injected on every request

use std::env;
use std::time::Duration;

use ragline_core::error::Result;
use serde::{Deserialize, Serialize};

use crate::paths;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/chat";
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Configuration for the answering backend client and the session watcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the answering backend's chat API.
    pub base_url: String,
    /// Optional bearer token for the backend.
    pub api_token: Option<String>,
    /// Cadence of the session-pointer poll, in milliseconds. A tunable,
    /// not a correctness requirement.
    pub poll_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ClientConfig {
    /// Loads the configuration: file first, then environment overrides,
    /// defaults for anything left unset.
    pub async fn load() -> Self {
        let mut config = Self::load_file().await.unwrap_or_else(|err| {
            tracing::debug!(target: "config", "using default config: {}", err);
            Self::default()
        });
        if let Ok(url) = env::var("RAGLINE_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(token) = env::var("RAGLINE_API_TOKEN") {
            config.api_token = Some(token);
        }
        config
    }

    async fn load_file() -> Result<Self> {
        let path = paths::config_file()?;
        let raw = tokio::fs::read_to_string(&path).await?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.api_token.is_none());
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let config: ClientConfig =
            toml::from_str("base_url = \"https://assistant.example/api/chat\"\n").unwrap();
        assert_eq!(config.base_url, "https://assistant.example/api/chat");
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }
}
