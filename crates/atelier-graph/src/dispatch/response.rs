//! Responses of the remote executor.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::node::NodeId;
use crate::validation::ValidationStatus;
use crate::workflow::Workflow;

/// Response of the remote validation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteValidation {
    /// Outcome class.
    pub status: ValidationStatus,
    /// Human-readable summary.
    #[serde(default)]
    pub message: String,
    /// Execution order computed by the executor, if any.
    ///
    /// Accepted both as a list and as a comma-joined string.
    #[serde(default, deserialize_with = "deserialize_order")]
    pub execution_order: Vec<NodeId>,
}

impl RemoteValidation {
    /// Returns whether the executor would run the workflow.
    pub fn is_executable(&self) -> bool {
        self.status != ValidationStatus::Invalid
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OrderRepr {
    List(Vec<NodeId>),
    Joined(String),
}

fn deserialize_order<'de, D>(deserializer: D) -> Result<Vec<NodeId>, D::Error>
where
    D: Deserializer<'de>,
{
    let order = match Option::<OrderRepr>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OrderRepr::List(ids)) => ids,
        Some(OrderRepr::Joined(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(NodeId::from)
            .collect(),
    };

    Ok(order)
}

/// Response of the remote execute endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    /// Run status reported by the executor, e.g. `success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Human-readable summary.
    #[serde(default)]
    pub message: String,
    /// Per-node results.
    pub results: HashMap<NodeId, Value>,
    /// Generation job started for each node, if any.
    #[serde(default)]
    pub job_ids: HashMap<NodeId, String>,
}

/// Execution response tagged with the revision of the snapshot it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    /// Revision of the submitted snapshot.
    pub revision: u64,
    /// Executor response.
    pub response: ExecutionResponse,
}

impl ExecutionReport {
    /// Writes every result as a status annotation, whatever the document's
    /// revision. Returns the number of annotated nodes.
    ///
    /// Results for unknown node IDs are ignored.
    pub fn apply_to(&self, workflow: &mut Workflow) -> usize {
        apply_statuses(
            workflow,
            self.response
                .results
                .iter()
                .map(|(id, value)| (id, status_text(value))),
        )
    }

    /// Like [`apply_to`](Self::apply_to), but discards the report when the
    /// document changed since the snapshot was taken.
    ///
    /// Returns `None` when the report was discarded.
    pub fn apply_if_current(&self, workflow: &mut Workflow) -> Option<usize> {
        if workflow.revision() != self.revision {
            tracing::debug!(
                target: super::TRACING_TARGET,
                report_revision = self.revision,
                document_revision = workflow.revision(),
                "Discarding stale execution report"
            );
            return None;
        }

        Some(self.apply_to(workflow))
    }
}

fn status_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn apply_statuses<'a>(
    workflow: &mut Workflow,
    statuses: impl Iterator<Item = (&'a NodeId, Option<String>)>,
) -> usize {
    let mut applied = 0;
    for (id, status) in statuses {
        if workflow.set_status(id, status) {
            applied += 1;
        } else {
            tracing::trace!(
                target: super::TRACING_TARGET,
                node_id = %id,
                "Ignoring status for unknown node"
            );
        }
    }
    applied
}

/// Lifecycle state of a generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Queued.
    Pending,
    /// In progress.
    Running,
    /// Finished successfully.
    Done,
    /// Finished with an error.
    Failed,
}

impl JobStatus {
    /// Returns whether the job will not change state anymore.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Artifact produced by a generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutput {
    /// Position among the job's outputs.
    pub index: u32,
    /// Path of the artifact.
    pub path: String,
    /// Path of a preview image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// State of a generation job as reported by the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobState {
    /// Job ID.
    pub id: String,
    /// Generation type, e.g. `text_to_image`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Lifecycle state.
    pub status: JobStatus,
    /// Completion ratio in `[0, 1]`.
    #[serde(default)]
    pub progress: f64,
    /// Produced artifacts.
    #[serde(default)]
    pub outputs: Vec<JobOutput>,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Executor log lines.
    #[serde(default)]
    pub logs: Vec<String>,
}

impl JobState {
    /// Returns whether the job will not change state anymore.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Progress of a whole workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStatus {
    /// Run ID.
    pub workflow_id: String,
    /// Overall state.
    pub status: String,
    /// State of each node.
    #[serde(default)]
    pub node_statuses: HashMap<NodeId, String>,
    /// Completion ratio in `[0, 1]`.
    #[serde(default)]
    pub progress: f64,
    /// Human-readable summary.
    #[serde(default)]
    pub message: String,
}

impl WorkflowStatus {
    /// Writes each node state as a status annotation. Returns the number of
    /// annotated nodes; unknown node IDs are ignored.
    pub fn apply_to(&self, workflow: &mut Workflow) -> usize {
        apply_statuses(
            workflow,
            self.node_statuses
                .iter()
                .map(|(id, status)| (id, Some(status.clone()))),
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;
    use crate::node::NodeKind;

    fn report(revision: u64, results: Value) -> ExecutionReport {
        let response = serde_json::from_value(json!({
            "status": "success",
            "message": "submitted",
            "results": results,
        }))
        .unwrap();
        ExecutionReport { revision, response }
    }

    #[test]
    fn test_execution_order_formats() {
        let joined: RemoteValidation = serde_json::from_value(json!({
            "status": "warning",
            "message": "disconnected",
            "execution_order": "1,2, 3",
        }))
        .unwrap();
        let listed: RemoteValidation = serde_json::from_value(json!({
            "status": "valid",
            "message": "ok",
            "execution_order": ["1", "2", "3"],
        }))
        .unwrap();
        let missing: RemoteValidation =
            serde_json::from_value(json!({ "status": "invalid", "message": "cycle" })).unwrap();

        assert_eq!(joined.execution_order, listed.execution_order);
        assert!(joined.is_executable());
        assert!(missing.execution_order.is_empty());
        assert!(!missing.is_executable());
    }

    #[test]
    fn test_apply_ignores_unknown_nodes() {
        let mut workflow = Workflow::chain(NodeKind::iter());
        let before = workflow.clone();
        let report = report(
            workflow.revision(),
            json!({ "2": "done", "5": { "path": "out.png" }, "99": "done", "4": null }),
        );

        assert_eq!(report.apply_to(&mut workflow), 3);
        assert_eq!(workflow.node("2").unwrap().data.status(), Some("done"));
        assert_eq!(
            workflow.node("5").unwrap().data.status(),
            Some(r#"{"path":"out.png"}"#)
        );
        assert_eq!(workflow.node("4").unwrap().data.status(), None);
        assert_eq!(workflow.node_count(), before.node_count());
        assert_eq!(workflow.edges(), before.edges());
    }

    #[test]
    fn test_stale_report_is_discarded() {
        let mut workflow = Workflow::chain(NodeKind::iter());
        let report = report(workflow.revision(), json!({ "1": "done" }));

        workflow.connect("1", "3").unwrap();
        assert_eq!(report.apply_if_current(&mut workflow), None);
        assert_eq!(workflow.node("1").unwrap().data.status(), None);

        assert_eq!(report.apply_to(&mut workflow), 1);
        assert_eq!(workflow.node("1").unwrap().data.status(), Some("done"));
    }

    #[test]
    fn test_current_report_is_applied() {
        let mut workflow = Workflow::chain(NodeKind::iter());
        let report = report(workflow.revision(), json!({ "1": "done" }));
        workflow.move_node("1", Default::default());
        assert_eq!(report.apply_if_current(&mut workflow), Some(1));
    }

    #[test]
    fn test_job_state() {
        let state: JobState = serde_json::from_value(json!({
            "id": "job_2",
            "type": "text_to_image",
            "status": "done",
            "created_at": "2024-05-01T10:00:00",
            "progress": 1.0,
            "params": {},
            "outputs": [{ "index": 0, "path": "outputs/job_2_0.png" }],
        }))
        .unwrap();

        assert!(state.is_terminal());
        assert_eq!(state.kind.as_deref(), Some("text_to_image"));
        assert_eq!(state.outputs[0].path, "outputs/job_2_0.png");
        assert!(!JobStatus::Running.is_terminal());
        assert_eq!(JobStatus::Pending.to_string(), "pending");
    }

    #[test]
    fn test_workflow_status_apply() {
        let mut workflow = Workflow::chain(NodeKind::iter());
        let status: WorkflowStatus = serde_json::from_value(json!({
            "workflow_id": "wf-1",
            "status": "running",
            "node_statuses": { "1": "completed", "2": "running", "7": "pending" },
            "progress": 0.4,
            "message": "running",
        }))
        .unwrap();

        assert_eq!(status.apply_to(&mut workflow), 2);
        assert_eq!(workflow.node("1").unwrap().data.status(), Some("completed"));
    }
}
