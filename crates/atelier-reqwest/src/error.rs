//! Internal error types for atelier-reqwest.

use thiserror::Error;

/// Result type alias for atelier-reqwest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Internal error type for atelier-reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Response body could not be parsed.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Executor answered with a non-2xx status.
    #[error("executor rejected the request ({status}): {detail}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Detail reported by the executor.
        detail: String,
    },
    /// Configured base URL is unusable.
    #[error("invalid base URL {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl From<Error> for atelier_graph::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) if e.is_decode() => Self::ResponseParseFailure(e.to_string()),
            Error::Reqwest(e) => {
                let message = if e.is_timeout() {
                    format!("request timed out: {e}")
                } else if e.is_connect() {
                    format!("connection failed: {e}")
                } else {
                    e.to_string()
                };

                Self::TransportFailure {
                    status: e.status().map(|status| status.as_u16()),
                    message,
                }
            }
            Error::Serde(e) => Self::ResponseParseFailure(e.to_string()),
            Error::Rejected { status, detail } => Self::rejected(status, detail),
            err @ Error::InvalidUrl { .. } => Self::transport(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_maps_to_transport_failure() {
        let err: atelier_graph::Error = Error::Rejected {
            status: 400,
            detail: "Edge connects non-existent node: 1 -> 9".into(),
        }
        .into();

        assert!(matches!(
            &err,
            atelier_graph::Error::TransportFailure { status: Some(400), message }
                if message == "Edge connects non-existent node: 1 -> 9"
        ));
    }

    #[test]
    fn test_parse_error_maps_to_response_parse_failure() {
        let serde = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err: atelier_graph::Error = Error::from(serde).into();
        assert!(matches!(err, atelier_graph::Error::ResponseParseFailure(_)));
    }
}
