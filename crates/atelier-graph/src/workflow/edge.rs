//! Edge type for connecting nodes in a workflow.

use serde::{Deserialize, Serialize};

use crate::node::{EdgeId, NodeId};

/// A directed connection from one node's output to another node's input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Unique edge ID.
    pub id: EdgeId,
    /// Source node ID.
    pub source: NodeId,
    /// Target node ID.
    pub target: NodeId,
    /// Optional handle name on the source node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    /// Optional handle name on the target node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    /// Whether the editor animates the connection.
    #[serde(default)]
    pub animated: bool,
}

impl Edge {
    /// Creates a new edge between two nodes.
    pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
            animated: false,
        }
    }

    /// Sets the animation flag.
    #[must_use]
    pub fn with_animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }

    /// Returns whether either endpoint is the given node.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source.as_str() == node_id || self.target.as_str() == node_id
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_edge_wire_shape() {
        let edge = Edge::new("e1-2", "1", "2").with_animated(true);
        assert_eq!(
            serde_json::to_value(&edge).unwrap(),
            json!({ "id": "e1-2", "source": "1", "target": "2", "animated": true })
        );
    }

    #[test]
    fn test_edge_handles_and_missing_animated() {
        let edge: Edge = serde_json::from_value(json!({
            "id": "a",
            "source": "1",
            "target": "2",
            "sourceHandle": "out",
        }))
        .unwrap();

        assert_eq!(edge.source_handle.as_deref(), Some("out"));
        assert_eq!(edge.target_handle, None);
        assert!(!edge.animated);
        assert!(edge.touches("2"));
        assert!(!edge.touches("3"));
    }
}
