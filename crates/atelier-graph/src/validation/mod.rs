//! Workflow validation and execution ordering.
//!
//! Validation never fails with an [`Error`](crate::Error): a cyclic or
//! dangling workflow is ordinary editor state, reported as an
//! [`Validation::Invalid`] value. The document stays editable either way.

mod graph;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use self::graph::ValidationGraph;
use crate::node::{EdgeId, NodeId};
use crate::workflow::Workflow;

/// Tracing target for workflow validation.
pub const TRACING_TARGET: &str = "atelier_graph::validation";

/// Reason a workflow cannot be executed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    /// The listed nodes sit on at least one cycle.
    #[error("workflow contains a cycle through nodes {}", join(.nodes))]
    CycleDetected {
        /// Nodes on a cycle, in insertion order.
        nodes: Vec<NodeId>,
    },

    /// An edge references a node that is not in the workflow.
    #[error("edge {edge} references unknown node {node}")]
    UnknownNodeReference {
        /// The dangling edge.
        edge: EdgeId,
        /// The missing endpoint.
        node: NodeId,
    },
}

/// Non-fatal finding on an executable workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// No output node is reachable from these nodes.
    NoPathToOutput {
        /// Stranded nodes, in insertion order.
        nodes: Vec<NodeId>,
    },
    /// More than one edge connects the same pair of nodes.
    DuplicateEdge {
        /// Source node.
        source: NodeId,
        /// Target node.
        target: NodeId,
    },
    /// An edge enters a node kind without an input handle.
    UnexpectedInput {
        /// Offending edge.
        edge: EdgeId,
        /// Target node.
        node: NodeId,
    },
    /// An edge leaves a node kind without an output handle.
    UnexpectedOutput {
        /// Offending edge.
        edge: EdgeId,
        /// Source node.
        node: NodeId,
    },
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPathToOutput { nodes } => {
                write!(f, "nodes {} have no path to an output", join(nodes))
            }
            Self::DuplicateEdge { source, target } => {
                write!(f, "nodes {source} and {target} are connected more than once")
            }
            Self::UnexpectedInput { edge, node } => {
                write!(f, "edge {edge} enters node {node}, which takes no input")
            }
            Self::UnexpectedOutput { edge, node } => {
                write!(f, "edge {edge} leaves node {node}, which produces no output")
            }
        }
    }
}

/// Outcome class of a validation, shared with the remote executor's wire
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// Executable, no findings.
    Valid,
    /// Executable, with warnings.
    Warning,
    /// Not executable.
    Invalid,
}

/// Order and findings of an executable workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Every node ID, each after all of its upstream nodes.
    pub order: Vec<NodeId>,
    /// Non-fatal findings.
    pub warnings: Vec<ValidationWarning>,
}

/// Result of validating a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The workflow can be executed.
    Valid(ValidationReport),
    /// The workflow cannot be executed.
    Invalid(ValidationFailure),
}

impl Validation {
    /// Returns whether the workflow can be executed.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Returns the execution order of a valid workflow.
    pub fn order(&self) -> Option<&[NodeId]> {
        match self {
            Self::Valid(report) => Some(&report.order),
            Self::Invalid(_) => None,
        }
    }

    /// Returns the warnings of a valid workflow.
    pub fn warnings(&self) -> &[ValidationWarning] {
        match self {
            Self::Valid(report) => &report.warnings,
            Self::Invalid(_) => &[],
        }
    }

    /// Returns the failure of an invalid workflow.
    pub fn failure(&self) -> Option<&ValidationFailure> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(failure) => Some(failure),
        }
    }

    /// Returns the outcome class.
    pub fn status(&self) -> ValidationStatus {
        match self {
            Self::Valid(report) if report.warnings.is_empty() => ValidationStatus::Valid,
            Self::Valid(_) => ValidationStatus::Warning,
            Self::Invalid(_) => ValidationStatus::Invalid,
        }
    }

    /// Returns a one-line summary for display.
    pub fn message(&self) -> String {
        match self {
            Self::Valid(report) if report.warnings.is_empty() => {
                format!("workflow is valid ({} nodes)", report.order.len())
            }
            Self::Valid(report) => format!(
                "workflow is valid with {} warning(s): {}",
                report.warnings.len(),
                report
                    .warnings
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ")
            ),
            Self::Invalid(failure) => failure.to_string(),
        }
    }
}

/// Validates a workflow and computes its execution order.
pub fn validate(workflow: &Workflow) -> Validation {
    if workflow.is_empty() {
        return Validation::Valid(ValidationReport::default());
    }

    let graph = match ValidationGraph::build(workflow) {
        Ok(graph) => graph,
        Err(failure) => {
            tracing::debug!(target: TRACING_TARGET, %failure, "Workflow is invalid");
            return Validation::Invalid(failure);
        }
    };

    let cycle = graph.cycle_members();
    if !cycle.is_empty() {
        let failure = ValidationFailure::CycleDetected { nodes: cycle };
        tracing::debug!(target: TRACING_TARGET, %failure, "Workflow is invalid");
        return Validation::Invalid(failure);
    }

    let report = ValidationReport {
        order: graph.execution_order(),
        warnings: graph.warnings(),
    };

    tracing::debug!(
        target: TRACING_TARGET,
        nodes = report.order.len(),
        warnings = report.warnings.len(),
        "Workflow is valid"
    );

    Validation::Valid(report)
}

impl Workflow {
    /// Validates this workflow. See [`validate`].
    pub fn validate(&self) -> Validation {
        validate(self)
    }
}

fn join(ids: &[NodeId]) -> String {
    ids.iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
