//! Execution request sent to the remote executor.

use serde::Serialize;

use crate::workflow::{Edge, Node, Workflow};

/// Owned snapshot of a workflow, taken when a dispatch starts.
///
/// The snapshot is detached from the live document: the user may keep editing
/// while the request is in flight. Serializes to the portable document shape.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRequest {
    /// Revision of the document at snapshot time.
    #[serde(skip)]
    revision: u64,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl ExecutionRequest {
    /// Takes a snapshot of the workflow.
    pub fn snapshot(workflow: &Workflow) -> Self {
        Self {
            revision: workflow.revision(),
            nodes: workflow.nodes().to_vec(),
            edges: workflow.edges().to_vec(),
        }
    }

    /// Returns the document revision the snapshot was taken at.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the snapshot's nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the snapshot's edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}

impl From<&Workflow> for ExecutionRequest {
    fn from(workflow: &Workflow) -> Self {
        Self::snapshot(workflow)
    }
}
