//! Node placed in a workflow.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::position::Position;
use crate::node::{NodeData, NodeId, NodeKind};

/// One instance of a [`NodeKind`] placed in a workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique node ID.
    pub id: NodeId,
    /// Editor position.
    pub position: Position,
    /// Type-specific data; its variant determines the node's kind.
    pub data: NodeData,
}

impl Node {
    /// Creates a node from its parts.
    pub fn new(id: impl Into<NodeId>, position: Position, data: impl Into<NodeData>) -> Self {
        Self {
            id: id.into(),
            position,
            data: data.into(),
        }
    }

    /// Returns the node's kind.
    #[inline]
    pub const fn kind(&self) -> NodeKind {
        self.data.kind()
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Node", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", &self.kind())?;
        state.serialize_field("position", &self.position)?;
        state.serialize_field("data", &self.data)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::node::UpscalerData;

    #[test]
    fn test_node_wire_shape() {
        let node = Node::new(
            "4",
            Position::new(750.0, 100.0),
            UpscalerData {
                label: "Upscale".into(),
                factor: 4.0,
                status: None,
            },
        );

        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({
                "id": "4",
                "type": "upscaleNode",
                "position": { "x": 750.0, "y": 100.0 },
                "data": { "label": "Upscale", "factor": 4.0 },
            })
        );
    }
}
