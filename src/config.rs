//! Client configuration

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SESSION_DIR: &str = ".market-client";

/// Settings for the API client and its session storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: u64,
    pub session_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            session_dir: PathBuf::from(DEFAULT_SESSION_DIR),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Create config from environment variables and defaults.
    ///
    /// `MARKET_API_BASE_URL` takes precedence over `MARKET_API_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("MARKET_API_BASE_URL")
            .or_else(|| lookup("MARKET_API_URL"))
            .filter(|v| !v.trim().is_empty())
        {
            config.base_url = url;
        }
        if let Some(dir) = lookup("MARKET_CLIENT_SESSION_DIR").filter(|v| !v.is_empty()) {
            config.session_dir = PathBuf::from(dir);
        }

        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the request timeout in seconds. The dashboard API expects
    /// [`DEFAULT_TIMEOUT_SECS`], other values are for tests and tooling.
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_session_dir(mut self, session_dir: impl Into<PathBuf>) -> Self {
        self.session_dir = session_dir.into();
        self
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::Configuration(
                "Base URL cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::Configuration(format!(
                "Invalid base URL: {}. Must start with http:// or https://",
                self.base_url
            )));
        }

        url::Url::parse(&self.base_url)?;

        if self.timeout == 0 {
            return Err(ClientError::Configuration(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_duration(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_url_precedence() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("MARKET_API_BASE_URL", "https://api.example.com"),
            ("MARKET_API_URL", "https://fallback.example.com"),
        ]));
        assert_eq!(config.base_url, "https://api.example.com");

        let config =
            ClientConfig::from_lookup(lookup(&[("MARKET_API_URL", "https://fallback.example.com")]));
        assert_eq!(config.base_url, "https://fallback.example.com");
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::new("").validate().is_err());
        assert!(ClientConfig::new("ftp://example.com").validate().is_err());
        assert!(ClientConfig::default().with_timeout(0).validate().is_err());
        assert!(ClientConfig::new("https://example.com/api").validate().is_ok());
    }
}
