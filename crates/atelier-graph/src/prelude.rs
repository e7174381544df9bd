//! Prelude module for convenient imports.
//!
//! ```rust
//! use atelier_graph::prelude::*;
//! ```

pub use crate::dispatch::{
    ExecutionDispatcher, ExecutionReport, ExecutionRequest, ExecutorProvider, JobState, JobStatus,
};
pub use crate::error::{Error, Result};
pub use crate::node::{NodeData, NodeId, NodeKind};
pub use crate::validation::{Validation, ValidationFailure, ValidationStatus, ValidationWarning};
pub use crate::workflow::{Edge, Node, Position, Workflow};
