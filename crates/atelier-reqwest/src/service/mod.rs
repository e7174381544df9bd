//! Executor provider implementation.
//!
//! This module implements the [`ExecutorProvider`] trait for [`ReqwestClient`].

use atelier_graph::dispatch::{
    ExecutionRequest, ExecutionResponse, ExecutorProvider, JobState, RemoteValidation,
    WorkflowStatus,
};

use crate::connect::{ReqwestClient, TRACING_TARGET};

#[async_trait::async_trait]
impl ExecutorProvider for ReqwestClient {
    async fn validate(&self, request: &ExecutionRequest) -> atelier_graph::Result<RemoteValidation> {
        let url = self.endpoint(&["workflows", "validate"]);

        tracing::debug!(
            target: TRACING_TARGET,
            url = %url,
            nodes = request.nodes().len(),
            "Requesting remote validation"
        );

        let validation: RemoteValidation = self.send_json(self.http().post(url).json(request)).await?;
        Ok(validation)
    }

    async fn execute(&self, request: &ExecutionRequest) -> atelier_graph::Result<ExecutionResponse> {
        let url = self.endpoint(&["workflows", "execute"]);

        tracing::debug!(
            target: TRACING_TARGET,
            url = %url,
            revision = request.revision(),
            nodes = request.nodes().len(),
            edges = request.edges().len(),
            "Submitting workflow"
        );

        let response: ExecutionResponse = self.send_json(self.http().post(url).json(request)).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            status = response.status.as_deref().unwrap_or("unknown"),
            message = %response.message,
            "Workflow submitted"
        );

        Ok(response)
    }

    async fn job_state(&self, job_id: &str) -> atelier_graph::Result<JobState> {
        let url = self.endpoint(&["generate", job_id]);
        tracing::trace!(target: TRACING_TARGET, url = %url, "Fetching job state");

        let state: JobState = self.send_json(self.http().get(url)).await?;
        Ok(state)
    }

    async fn workflow_status(&self, workflow_id: &str) -> atelier_graph::Result<WorkflowStatus> {
        let url = self.endpoint(&["workflows", "status", workflow_id]);
        tracing::trace!(target: TRACING_TARGET, url = %url, "Fetching workflow status");

        let status: WorkflowStatus = self.send_json(self.http().get(url)).await?;
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use atelier_graph::prelude::*;

    use crate::{ReqwestClient, ReqwestConfig};

    #[tokio::test]
    async fn test_unreachable_executor_is_a_transport_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = ReqwestConfig::new(format!("http://{addr}/api")).with_timeout(5);
        let dispatcher = ReqwestClient::new(config).unwrap().into_dispatcher();

        let workflow = Workflow::new();
        let err = dispatcher.execute(&workflow).await.unwrap_err();
        assert!(matches!(err, Error::TransportFailure { status: None, .. }), "{err}");
    }
}
