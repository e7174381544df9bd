//! Petgraph view of a workflow used by validation.

use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef, Reversed};

use super::{ValidationFailure, ValidationWarning};
use crate::node::NodeId;
use crate::workflow::{Edge, Node, Workflow};

/// Borrowed directed graph over a workflow snapshot.
///
/// Node indices follow the document's insertion order, so comparing indices
/// compares insertion ranks.
pub(crate) struct ValidationGraph<'a> {
    graph: DiGraph<&'a Node, &'a Edge>,
}

impl<'a> ValidationGraph<'a> {
    /// Builds the graph, failing on the first edge whose endpoint is missing.
    pub fn build(workflow: &'a Workflow) -> Result<Self, ValidationFailure> {
        let mut graph = DiGraph::with_capacity(workflow.node_count(), workflow.edge_count());
        let mut indices: HashMap<&str, NodeIndex> = HashMap::with_capacity(workflow.node_count());

        for node in workflow.nodes() {
            indices.insert(node.id.as_str(), graph.add_node(node));
        }

        for edge in workflow.edges() {
            let lookup = |id: &NodeId| {
                indices.get(id.as_str()).copied().ok_or_else(|| {
                    ValidationFailure::UnknownNodeReference {
                        edge: edge.id.clone(),
                        node: id.clone(),
                    }
                })
            };
            let source = lookup(&edge.source)?;
            let target = lookup(&edge.target)?;
            graph.add_edge(source, target, edge);
        }

        Ok(Self { graph })
    }

    fn ids(&self, members: &[bool]) -> Vec<NodeId> {
        self.graph
            .node_indices()
            .filter(|index| members[index.index()])
            .map(|index| self.graph[index].id.clone())
            .collect()
    }

    /// Returns the nodes that sit on a cycle, in insertion order.
    pub fn cycle_members(&self) -> Vec<NodeId> {
        let mut members = vec![false; self.graph.node_count()];

        for component in tarjan_scc(&self.graph) {
            if component.len() > 1 {
                for index in component {
                    members[index.index()] = true;
                }
            }
        }

        for edge in self.graph.edge_references() {
            if edge.source() == edge.target() {
                members[edge.source().index()] = true;
            }
        }

        self.ids(&members)
    }

    /// Computes a topological order of an acyclic graph.
    ///
    /// Among ready nodes the earliest inserted one is emitted first.
    pub fn execution_order(&self) -> Vec<NodeId> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|index| self.graph.edges_directed(index, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> = self
            .graph
            .node_indices()
            .filter(|index| in_degree[index.index()] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(index)) = ready.pop() {
            order.push(self.graph[index].id.clone());

            for edge in self.graph.edges_directed(index, Direction::Outgoing) {
                let degree = &mut in_degree[edge.target().index()];
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(edge.target()));
                }
            }
        }

        order
    }

    /// Collects the non-fatal findings.
    pub fn warnings(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        let stranded = self.stranded_nodes();
        if !stranded.is_empty() {
            warnings.push(ValidationWarning::NoPathToOutput { nodes: stranded });
        }

        let mut parallel: HashMap<(NodeIndex, NodeIndex), usize> = HashMap::new();
        for edge in self.graph.edge_references() {
            let (source, target) = (self.graph[edge.source()], self.graph[edge.target()]);

            match parallel.entry((edge.source(), edge.target())) {
                Entry::Occupied(mut seen) => {
                    *seen.get_mut() += 1;
                    if *seen.get() == 2 {
                        warnings.push(ValidationWarning::DuplicateEdge {
                            source: source.id.clone(),
                            target: target.id.clone(),
                        });
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(1);
                }
            }

            if !target.kind().accepts_input() {
                warnings.push(ValidationWarning::UnexpectedInput {
                    edge: edge.weight().id.clone(),
                    node: target.id.clone(),
                });
            }
            if !source.kind().produces_output() {
                warnings.push(ValidationWarning::UnexpectedOutput {
                    edge: edge.weight().id.clone(),
                    node: source.id.clone(),
                });
            }
        }

        warnings
    }

    /// Returns the nodes from which no output node can be reached.
    fn stranded_nodes(&self) -> Vec<NodeId> {
        let reversed = Reversed(&self.graph);
        let mut reaches_output = vec![false; self.graph.node_count()];
        let mut dfs = Dfs::empty(reversed);

        for index in self.graph.node_indices() {
            if !self.graph[index].kind().is_output() {
                continue;
            }

            dfs.move_to(index);
            while let Some(visited) = dfs.next(reversed) {
                reaches_output[visited.index()] = true;
            }
        }

        let stranded: Vec<bool> = reaches_output.iter().map(|reaches| !reaches).collect();
        self.ids(&stranded)
    }
}
