//! Remote executor contract.
//!
//! [`ExecutorProvider`] is the seam to the generation backend; the HTTP
//! implementation lives in `atelier-reqwest`. [`ExecutionDispatcher`] drives a
//! provider on behalf of an editing session.

mod request;
mod response;
mod service;

pub use request::ExecutionRequest;
pub use response::{
    ExecutionReport, ExecutionResponse, JobOutput, JobState, JobStatus, RemoteValidation,
    WorkflowStatus,
};
pub use service::ExecutionDispatcher;

use crate::error::Result;

/// Tracing target for dispatch operations.
pub const TRACING_TARGET: &str = "atelier_graph::dispatch";

/// Remote executor of workflows.
///
/// Implementations issue exactly one request per call and map transport and
/// parse errors onto [`Error::TransportFailure`](crate::Error::TransportFailure)
/// and [`Error::ResponseParseFailure`](crate::Error::ResponseParseFailure).
#[async_trait::async_trait]
pub trait ExecutorProvider: Send + Sync {
    /// Asks the executor to validate a workflow snapshot.
    async fn validate(&self, request: &ExecutionRequest) -> Result<RemoteValidation>;

    /// Submits a workflow snapshot for execution.
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResponse>;

    /// Fetches the current state of a generation job.
    async fn job_state(&self, job_id: &str) -> Result<JobState>;

    /// Fetches the progress of a workflow run.
    async fn workflow_status(&self, workflow_id: &str) -> Result<WorkflowStatus>;
}
