//! Reqwest client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Default base URL of the generation API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default delay between two job state requests: 2 seconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Configuration for the executor HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ReqwestConfig {
    /// Base URL of the generation API
    #[cfg_attr(
        feature = "config",
        arg(long = "api-url", env = "ATELIER_API_URL", default_value = DEFAULT_BASE_URL)
    )]
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "ATELIER_HTTP_TIMEOUT", default_value = "30")
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "http-user-agent", env = "ATELIER_HTTP_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Delay between two job state requests in milliseconds
    #[cfg_attr(
        feature = "config",
        arg(long = "poll-interval", env = "ATELIER_POLL_INTERVAL_MS", default_value = "2000")
    )]
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for ReqwestConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            http_timeout: default_timeout_secs(),
            user_agent: None,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ReqwestConfig {
    /// Creates a new configuration for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Parses the base URL, using the default if empty.
    ///
    /// The URL must be able to carry path segments (`http`, `https`, ...).
    pub fn effective_base_url(&self) -> Result<Url> {
        let raw = match self.base_url.trim() {
            "" => DEFAULT_BASE_URL,
            raw => raw,
        };

        let url = Url::parse(raw).map_err(|err| Error::InvalidUrl {
            url: raw.to_owned(),
            reason: err.to_string(),
        })?;

        if url.cannot_be_a_base() {
            return Err(Error::InvalidUrl {
                url: raw.to_owned(),
                reason: "URL cannot carry a path".to_owned(),
            });
        }

        Ok(url)
    }

    /// Returns the timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout)
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        match self.http_timeout {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .filter(|agent| !agent.trim().is_empty())
            .unwrap_or_else(Self::default_user_agent)
    }

    /// Returns the default user agent string.
    fn default_user_agent() -> String {
        format!("atelier/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Returns the effective poll interval, using default if zero.
    pub fn effective_poll_interval(&self) -> Duration {
        match self.poll_interval_ms {
            0 => Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            millis => Duration::from_millis(millis),
        }
    }

    /// Set the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout = timeout_secs;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the poll interval in milliseconds.
    #[must_use]
    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReqwestConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.effective_poll_interval(), Duration::from_secs(2));
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = ReqwestConfig::new("https://lab.example.com/api")
            .with_timeout(120)
            .with_user_agent("custom-agent/1.0")
            .with_poll_interval_ms(250);

        assert_eq!(config.http_timeout, 120);
        assert_eq!(config.effective_user_agent(), "custom-agent/1.0");
        assert_eq!(config.effective_poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_zero_and_empty_values_use_defaults() {
        let config = ReqwestConfig::new("  ")
            .with_timeout(0)
            .with_user_agent("")
            .with_poll_interval_ms(0);

        assert_eq!(
            config.effective_timeout(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
        assert!(config.effective_user_agent().starts_with("atelier/"));
        assert_eq!(
            config.effective_poll_interval(),
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
        );
        assert_eq!(
            config.effective_base_url().unwrap().as_str(),
            DEFAULT_BASE_URL
        );
    }

    #[test]
    fn test_invalid_base_url() {
        for raw in ["not a url", "mailto:lab@example.com"] {
            let err = ReqwestConfig::new(raw).effective_base_url().unwrap_err();
            assert!(matches!(err, Error::InvalidUrl { .. }), "{raw}");
        }
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: ReqwestConfig =
            serde_json::from_str(r#"{ "base_url": "http://10.0.0.2:8000/api" }"#).unwrap();
        assert_eq!(config.http_timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }
}
