//! Workflow document and its mutation operations.
//!
//! A [`Workflow`] is the authoritative node and edge set of one editing
//! session. It enforces id uniqueness and, for edits made through its
//! methods, referential integrity of edges. Acyclicity and handle
//! compatibility are left to [`validate`](crate::validation::validate).

mod edge;
mod node;
mod position;

use std::collections::HashSet;

pub use edge::Edge;
pub use node::Node;
pub use position::Position;

use crate::error::{Error, Result};
use crate::node::{EdgeId, NodeData, NodeId, NodeKind};

/// Tracing target for workflow mutations.
pub const TRACING_TARGET: &str = "atelier_graph::workflow";

/// Horizontal distance between nodes laid out by [`Workflow::chain`].
const CHAIN_SPACING: f64 = 250.0;

/// The editable workflow document.
///
/// Nodes and edges keep their insertion order, which is also the tie-break
/// order used when computing an execution order.
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    /// Nodes in insertion order.
    nodes: Vec<Node>,
    /// Edges in insertion order.
    edges: Vec<Edge>,
    /// Last numeric id handed out or observed.
    node_counter: u64,
    /// Bumped on every semantic edit.
    revision: u64,
}

impl Workflow {
    /// Creates a new empty workflow.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a workflow from existing nodes and edges.
    ///
    /// Node and edge ids must be unique. Edge endpoints are not checked, so
    /// partially broken documents can still be opened and repaired.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self> {
        let mut workflow = Self::new();
        for node in nodes {
            workflow.insert_node(node)?;
        }

        let mut seen = HashSet::with_capacity(edges.len());
        for edge in &edges {
            if !seen.insert(edge.id.as_str()) {
                return Err(Error::DuplicateId(edge.id.to_string()));
            }
        }

        workflow.edges = edges;
        workflow.revision = 0;
        Ok(workflow)
    }

    /// Builds a linear pipeline with one node per kind, each connected to the
    /// next one.
    pub fn chain(kinds: impl IntoIterator<Item = NodeKind>) -> Self {
        let mut workflow = Self::new();
        let mut previous: Option<NodeId> = None;

        for (index, kind) in kinds.into_iter().enumerate() {
            let position = Position::new(index as f64 * CHAIN_SPACING, 100.0);
            let id = workflow.add_node(kind, position).id.clone();
            if let Some(source) = previous.replace(id.clone()) {
                workflow.push_edge(source, id);
            }
        }

        workflow
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns whether the workflow has no nodes and no edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Returns the revision, bumped on every semantic edit.
    ///
    /// Moving nodes and writing status annotations leave it unchanged.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns all nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns all edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns a node by ID.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id.as_str() == id)
    }

    /// Returns an edge by ID.
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id.as_str() == id)
    }

    /// Returns whether a node exists.
    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Returns whether an edge exists.
    pub fn contains_edge(&self, id: &str) -> bool {
        self.edge(id).is_some()
    }

    /// Adds a node of the given kind with fresh default data.
    ///
    /// A non-finite position is replaced by the origin.
    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> &Node {
        let id = self.next_node_id();
        let position = if position.is_finite() {
            position
        } else {
            tracing::warn!(
                target: TRACING_TARGET,
                node_id = %id,
                x = position.x,
                y = position.y,
                "Placing node with non-finite position at the origin"
            );
            Position::default()
        };

        tracing::trace!(
            target: TRACING_TARGET,
            node_id = %id,
            kind = %kind,
            "Adding node"
        );

        self.revision += 1;
        self.nodes.push(Node::new(id, position, kind.default_data()));
        &self.nodes[self.nodes.len() - 1]
    }

    /// Inserts a node with a caller-chosen ID.
    pub fn insert_node(&mut self, node: Node) -> Result<&Node> {
        if self.contains_node(&node.id) {
            return Err(Error::DuplicateId(node.id.to_string()));
        }

        if !node.position.is_finite() {
            return Err(Error::NonFiniteValue {
                node: node.id,
                field: "position",
            });
        }
        if let Some(field) = node.data.non_finite_field() {
            return Err(Error::NonFiniteValue {
                node: node.id,
                field,
            });
        }

        // The counter cannot move past `u64::MAX`, so such ids are not tracked.
        if let Some(numeric) = node.id.parse::<u64>().ok().filter(|n| *n < u64::MAX) {
            self.node_counter = self.node_counter.max(numeric);
        }

        self.revision += 1;
        self.nodes.push(node);
        Ok(&self.nodes[self.nodes.len() - 1])
    }

    /// Removes a node and every edge that references it.
    ///
    /// Removing an absent node is a no-op.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let index = self.nodes.iter().position(|node| node.id.as_str() == id)?;
        let node = self.nodes.remove(index);

        let edge_count = self.edges.len();
        self.edges.retain(|edge| !edge.touches(id));

        tracing::debug!(
            target: TRACING_TARGET,
            node_id = %node.id,
            removed_edges = edge_count - self.edges.len(),
            "Removed node"
        );

        self.revision += 1;
        Some(node)
    }

    /// Connects the output of `source` to the input of `target`.
    ///
    /// Duplicate edges and self-loops are accepted here and reported by
    /// validation instead.
    pub fn connect(&mut self, source: &str, target: &str) -> Result<&Edge> {
        let source = self.require_node(source)?;
        let target = self.require_node(target)?;
        Ok(self.push_edge(source, target))
    }

    /// Inserts a fully specified edge.
    ///
    /// Both endpoints must exist and the edge ID must be free.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<&Edge> {
        self.require_node(&edge.source)?;
        self.require_node(&edge.target)?;
        if self.contains_edge(&edge.id) {
            return Err(Error::DuplicateId(edge.id.to_string()));
        }

        self.revision += 1;
        self.edges.push(edge);
        Ok(&self.edges[self.edges.len() - 1])
    }

    /// Removes an edge.
    ///
    /// Removing an absent edge is a no-op.
    pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        let index = self.edges.iter().position(|edge| edge.id.as_str() == id)?;

        tracing::trace!(target: TRACING_TARGET, edge_id = id, "Removing edge");

        self.revision += 1;
        Some(self.edges.remove(index))
    }

    /// Removes all nodes and edges.
    pub fn clear(&mut self) {
        tracing::debug!(
            target: TRACING_TARGET,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "Clearing workflow"
        );

        self.nodes.clear();
        self.edges.clear();
        self.revision += 1;
    }

    /// Moves a node. Returns `false` when the node does not exist or the
    /// position is not finite.
    pub fn move_node(&mut self, id: &str, position: Position) -> bool {
        if !position.is_finite() {
            return false;
        }

        match self.node_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Replaces a node's data with data of the same kind.
    pub fn update_data(&mut self, id: &str, data: NodeData) -> Result<()> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| Error::UnknownNode(id.into()))?;

        if node.kind() != data.kind() {
            return Err(Error::KindMismatch {
                node: node.id.clone(),
                expected: node.kind(),
                found: data.kind(),
            });
        }

        if let Some(field) = data.non_finite_field() {
            return Err(Error::NonFiniteValue {
                node: node.id.clone(),
                field,
            });
        }

        node.data = data;
        self.revision += 1;
        Ok(())
    }

    /// Writes a status annotation. Returns `false` when the node does not
    /// exist.
    pub fn set_status(&mut self, id: &str, status: Option<String>) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.data.set_status(status);
                true
            }
            None => false,
        }
    }

    /// Removes every status annotation.
    pub fn clear_statuses(&mut self) {
        for node in &mut self.nodes {
            node.data.set_status(None);
        }
    }

    /// Removes and returns edges whose source or target node is missing.
    pub fn prune_dangling_edges(&mut self) -> Vec<Edge> {
        let ids: HashSet<&str> = self.nodes.iter().map(|node| node.id.as_str()).collect();
        let (kept, dangling): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|edge| ids.contains(edge.source.as_str()) && ids.contains(edge.target.as_str()));

        self.edges = kept;
        if !dangling.is_empty() {
            tracing::debug!(
                target: TRACING_TARGET,
                pruned = dangling.len(),
                "Pruned dangling edges"
            );
            self.revision += 1;
        }

        dangling
    }

    /// Continues the revision sequence of a document this one replaces.
    pub(crate) fn revision_after(&mut self, previous: &Self) {
        self.revision = previous.revision + 1;
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id.as_str() == id)
    }

    fn require_node(&self, id: &str) -> Result<NodeId> {
        self.node(id)
            .map(|node| node.id.clone())
            .ok_or_else(|| Error::UnknownNode(id.into()))
    }

    fn next_node_id(&mut self) -> NodeId {
        loop {
            self.node_counter = self.node_counter.wrapping_add(1);
            let candidate = self.node_counter.to_string();
            if !self.contains_node(&candidate) {
                return NodeId::new(candidate);
            }
        }
    }

    fn next_edge_id(&self, source: &str, target: &str) -> EdgeId {
        let base = format!("e{source}-{target}");
        if !self.contains_edge(&base) {
            return EdgeId::new(base);
        }

        (1..)
            .map(|suffix| format!("{base}-{suffix}"))
            .find(|candidate| !self.contains_edge(candidate))
            .map(EdgeId::new)
            .unwrap_or_else(|| EdgeId::new(base))
    }

    fn push_edge(&mut self, source: NodeId, target: NodeId) -> &Edge {
        let id = self.next_edge_id(&source, &target);

        tracing::trace!(
            target: TRACING_TARGET,
            edge_id = %id,
            source = %source,
            target = %target,
            "Connecting nodes"
        );

        self.revision += 1;
        self.edges.push(Edge::new(id, source, target));
        &self.edges[self.edges.len() - 1]
    }
}

/// Structural equality: same nodes and edges in the same order.
impl PartialEq for Workflow {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.edges == other.edges
    }
}
