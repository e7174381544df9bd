//! Execution dispatcher.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{
    ExecutionReport, ExecutionRequest, ExecutorProvider, JobState, RemoteValidation,
    TRACING_TARGET, WorkflowStatus,
};
use crate::error::{Error, Result};
use crate::workflow::Workflow;

/// Submits workflows to an [`ExecutorProvider`] and tracks their jobs.
///
/// The dispatcher is stateless: it does not track in-flight calls, so callers
/// must not start a new execution while a previous one is pending.
#[derive(Clone)]
pub struct ExecutionDispatcher {
    provider: Arc<dyn ExecutorProvider>,
    poll_interval: Duration,
}

impl std::fmt::Debug for ExecutionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionDispatcher")
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl ExecutionDispatcher {
    /// Delay between two job state requests.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

    /// Creates a dispatcher over the given provider.
    pub fn new<P>(provider: P) -> Self
    where
        P: ExecutorProvider + 'static,
    {
        Self::from_arc(Arc::new(provider))
    }

    /// Creates a dispatcher over a shared provider.
    pub fn from_arc(provider: Arc<dyn ExecutorProvider>) -> Self {
        Self {
            provider,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the delay between two job state requests.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Returns the delay between two job state requests.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Asks the executor to validate the workflow.
    pub async fn validate_remote(&self, workflow: &Workflow) -> Result<RemoteValidation> {
        let request = ExecutionRequest::snapshot(workflow);
        let validation = self.provider.validate(&request).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            status = %validation.status,
            order = validation.execution_order.len(),
            "Remote validation completed"
        );

        Ok(validation)
    }

    /// Snapshots the workflow and submits it. See [`submit`](Self::submit).
    pub async fn execute(&self, workflow: &Workflow) -> Result<ExecutionReport> {
        self.submit(ExecutionRequest::snapshot(workflow)).await
    }

    /// Submits a snapshot for execution.
    ///
    /// The document is never touched here: callers apply the returned report
    /// with [`ExecutionReport::apply_to`] or
    /// [`ExecutionReport::apply_if_current`].
    pub async fn submit(&self, request: ExecutionRequest) -> Result<ExecutionReport> {
        tracing::info!(
            target: TRACING_TARGET,
            revision = request.revision(),
            nodes = request.nodes().len(),
            edges = request.edges().len(),
            "Dispatching workflow"
        );

        let response = match self.provider.execute(&request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    revision = request.revision(),
                    error = %err,
                    "Workflow dispatch failed"
                );
                return Err(err);
            }
        };

        tracing::info!(
            target: TRACING_TARGET,
            revision = request.revision(),
            results = response.results.len(),
            jobs = response.job_ids.len(),
            "Workflow dispatched"
        );

        Ok(ExecutionReport {
            revision: request.revision(),
            response,
        })
    }

    /// Polls a generation job until it reaches a terminal state.
    ///
    /// Returns [`Error::Cancelled`] as soon as `cancel` fires, and the first
    /// request error otherwise.
    pub async fn poll_job(&self, job_id: &str, cancel: &CancellationToken) -> Result<JobState> {
        let mut attempts: u32 = 0;

        loop {
            let state = tokio::select! {
                biased;

                () = cancel.cancelled() => return Err(cancelled(job_id, attempts)),
                state = self.provider.job_state(job_id) => state?,
            };

            attempts += 1;
            if state.is_terminal() {
                tracing::info!(
                    target: TRACING_TARGET,
                    job_id,
                    status = %state.status,
                    attempts,
                    "Job finished"
                );
                return Ok(state);
            }

            tracing::trace!(
                target: TRACING_TARGET,
                job_id,
                status = %state.status,
                progress = state.progress,
                "Job still running"
            );

            tokio::select! {
                biased;

                () = cancel.cancelled() => return Err(cancelled(job_id, attempts)),
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// Fetches the progress of a workflow run.
    pub async fn workflow_status(&self, workflow_id: &str) -> Result<WorkflowStatus> {
        self.provider.workflow_status(workflow_id).await
    }
}

fn cancelled(job_id: &str, attempts: u32) -> Error {
    tracing::debug!(target: TRACING_TARGET, job_id, attempts, "Job polling cancelled");
    Error::Cancelled
}
