//! Reqwest-based HTTP client for the workflow executor.

use std::sync::Arc;

use atelier_graph::dispatch::ExecutionDispatcher;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::ReqwestConfig;
use crate::error::{Error, Result};

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "atelier_reqwest::client";

/// Inner client that holds the HTTP client and configuration.
struct ReqwestClientInner {
    http: Client,
    base_url: Url,
    config: ReqwestConfig,
}

/// Reqwest-based HTTP client for the remote workflow executor.
///
/// This client implements the [`ExecutorProvider`] trait. Cloning is cheap:
/// clones share one connection pool.
///
/// # Examples
///
/// ```rust,ignore
/// use atelier_graph::prelude::*;
/// use atelier_reqwest::{ReqwestClient, ReqwestConfig};
///
/// let client = ReqwestClient::new(ReqwestConfig::new("http://localhost:8000/api"))?;
/// let dispatcher = client.into_dispatcher();
///
/// let report = dispatcher.execute(&workflow).await?;
/// report.apply_if_current(&mut workflow);
/// ```
///
/// [`ExecutorProvider`]: atelier_graph::dispatch::ExecutorProvider
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Error body of a rejected request.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ReqwestClient {
    /// Creates a new reqwest client with the given configuration.
    ///
    /// Fails when the configured base URL is unusable.
    pub fn new(config: ReqwestConfig) -> Result<Self> {
        let base_url = config.effective_base_url()?;
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %base_url,
            timeout_ms = timeout.as_millis(),
            "Creating reqwest client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .expect("failed to create HTTP client");

        let inner = ReqwestClientInner {
            http,
            base_url,
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the underlying HTTP client.
    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Gets the parsed base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolves an endpoint below the base URL.
    ///
    /// Segments are percent-encoded, so IDs cannot escape their path slot.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .expect("base URL was checked to carry a path")
            .pop_if_empty()
            .extend(segments);
        url
    }

    /// Converts this client into an [`ExecutionDispatcher`] polling at the
    /// configured interval.
    pub fn into_dispatcher(self) -> ExecutionDispatcher {
        let poll_interval = self.config().effective_poll_interval();
        ExecutionDispatcher::new(self).with_poll_interval(poll_interval)
    }

    /// Sends a request and parses a JSON answer.
    ///
    /// Non-2xx answers become [`Error::Rejected`], using the `detail` field of
    /// the body when there is one.
    pub(crate) async fn send_json<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let detail = match serde_json::from_slice::<ErrorBody>(&body) {
                Ok(ErrorBody {
                    detail: serde_json::Value::String(detail),
                }) => detail,
                Ok(ErrorBody { detail }) => detail.to_string(),
                Err(_) => match String::from_utf8_lossy(&body).trim() {
                    "" => status.canonical_reason().unwrap_or("no detail").to_owned(),
                    text => text.to_owned(),
                },
            };

            tracing::warn!(
                target: TRACING_TARGET,
                status = status.as_u16(),
                detail = %detail,
                "Executor rejected request"
            );

            return Err(Error::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new(ReqwestConfig::default()).expect("default base URL is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_resolution() {
        let client = ReqwestClient::default();
        assert_eq!(
            client.endpoint(&["workflows", "validate"]).as_str(),
            "http://localhost:8000/api/workflows/validate"
        );

        let client = ReqwestClient::new(ReqwestConfig::new("https://lab.example.com/v1/")).unwrap();
        assert_eq!(
            client.endpoint(&["generate", "job/1"]).as_str(),
            "https://lab.example.com/v1/generate/job%2F1"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let err = ReqwestClient::new(ReqwestConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }
}
