//! Workflow error types.

use thiserror::Error;

use crate::node::{NodeId, NodeKind};

/// Result type for workflow operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while editing, persisting or dispatching a workflow.
///
/// Validation failures (cycles, dangling references) are not errors: they are
/// reported as [`ValidationFailure`](crate::validation::ValidationFailure) values.
#[derive(Debug, Error)]
pub enum Error {
    /// Node type tag outside the closed set of node kinds.
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    /// Operation referenced a node that is not in the workflow.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// Replacement data does not belong to the node's kind.
    #[error("node {node} is a {expected} node, got {found} data")]
    KindMismatch {
        /// ID of the edited node.
        node: NodeId,
        /// Kind of the node.
        expected: NodeKind,
        /// Kind of the supplied data.
        found: NodeKind,
    },

    /// Node coordinate or numeric field is NaN or infinite.
    #[error("node {node} has a non-finite {field}")]
    NonFiniteValue {
        /// ID of the offending node.
        node: NodeId,
        /// Name of the offending field.
        field: &'static str,
    },

    /// Node or edge identifier already taken.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// Imported text is not a workflow document.
    #[error("malformed workflow document: {0}")]
    MalformedDocument(String),

    /// Reading or writing an exported document failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The executor could not be reached or answered with a non-2xx status.
    #[error("transport failure: {message}")]
    TransportFailure {
        /// HTTP status code, when a response was received.
        status: Option<u16>,
        /// Error message.
        message: String,
    },

    /// The executor answered 2xx with a body that could not be parsed.
    #[error("unparseable executor response: {0}")]
    ResponseParseFailure(String),

    /// Polling was cancelled before the job reached a terminal state.
    #[error("polling cancelled")]
    Cancelled,
}

impl Error {
    /// Creates a transport failure without an HTTP status.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportFailure {
            status: None,
            message: message.into(),
        }
    }

    /// Creates a transport failure for a non-2xx response.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::TransportFailure {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Returns whether this error came from talking to the executor.
    pub const fn is_dispatch(&self) -> bool {
        matches!(
            self,
            Self::TransportFailure { .. } | Self::ResponseParseFailure(_) | Self::Cancelled
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedDocument(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_keeps_status() {
        let err = Error::rejected(400, "bad graph");
        assert!(matches!(
            err,
            Error::TransportFailure {
                status: Some(400),
                ..
            }
        ));
        assert_eq!(err.to_string(), "transport failure: bad graph");
        assert!(err.is_dispatch());
    }

    #[test]
    fn test_json_error_is_malformed_document() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::MalformedDocument(_)));
        assert!(!err.is_dispatch());
    }
}
