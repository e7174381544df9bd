//! Portable JSON form of a workflow.
//!
//! The document shape is `{"nodes": [...], "edges": [...]}`, the same body the
//! remote executor accepts. Import checks ids and node types but leaves edge
//! endpoints alone, so a partially broken file can still be opened and then
//! repaired with [`Workflow::prune_dangling_edges`].

use std::fs;
use std::path::{Path, PathBuf};

use jiff::Timestamp;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::node::{NodeData, NodeId, NodeKind};
use crate::workflow::{Edge, Node, Position, Workflow};

/// Tracing target for export and import.
pub const TRACING_TARGET: &str = "atelier_graph::persist";

/// Node as it appears in an imported document, before its type is checked.
#[derive(Debug, Deserialize)]
struct RawNode {
    id: NodeId,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    data: serde_json::Value,
}

impl RawNode {
    fn into_node(self) -> Result<Node> {
        let kind = NodeKind::parse(&self.kind)?;
        let data = NodeData::from_value(kind, self.data)?;
        Ok(Node::new(self.id, self.position, data))
    }
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    nodes: Vec<RawNode>,
    #[serde(default)]
    edges: Vec<Edge>,
}

impl Serialize for Workflow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Workflow", 2)?;
        state.serialize_field("nodes", self.nodes())?;
        state.serialize_field("edges", self.edges())?;
        state.end()
    }
}

impl Workflow {
    /// Serializes the workflow to its portable JSON form.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("workflow documents always serialize")
    }

    /// Parses a workflow from its portable JSON form.
    ///
    /// Fails with [`Error::MalformedDocument`](crate::Error::MalformedDocument)
    /// on invalid JSON or a missing `nodes` list, with
    /// [`Error::UnknownNodeType`](crate::Error::UnknownNodeType) on an unknown
    /// node type, and with [`Error::DuplicateId`](crate::Error::DuplicateId) on
    /// repeated node or edge ids.
    pub fn from_json(text: &str) -> Result<Self> {
        let document: RawDocument = serde_json::from_str(text)?;
        let nodes = document
            .nodes
            .into_iter()
            .map(RawNode::into_node)
            .collect::<Result<Vec<_>>>()?;

        Self::from_parts(nodes, document.edges)
    }

    /// Replaces this workflow with a parsed document.
    ///
    /// On failure the current workflow is left untouched.
    pub fn import_json(&mut self, text: &str) -> Result<()> {
        let mut imported = Self::from_json(text)?;
        imported.revision_after(self);
        *self = imported;
        Ok(())
    }

    /// Replaces this workflow with the document stored at `path`.
    ///
    /// On failure the current workflow is left untouched.
    pub fn import_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;

        let imported = String::from_utf8(bytes)
            .map_err(|err| Error::MalformedDocument(err.to_string()))
            .and_then(|text| self.import_json(&text));

        if let Err(err) = imported {
            tracing::warn!(
                target: TRACING_TARGET,
                path = %path.display(),
                error = %err,
                "Rejected workflow import"
            );
            return Err(err);
        }

        tracing::info!(
            target: TRACING_TARGET,
            path = %path.display(),
            nodes = self.node_count(),
            edges = self.edge_count(),
            "Imported workflow"
        );

        Ok(())
    }

    /// Writes the workflow to `dir/workflow-<unixtime>.json` and returns the
    /// file path.
    pub fn export_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(export_file_name(Timestamp::now()));
        fs::write(&path, self.to_json())?;

        tracing::info!(
            target: TRACING_TARGET,
            path = %path.display(),
            nodes = self.node_count(),
            edges = self.edge_count(),
            "Exported workflow"
        );

        Ok(path)
    }
}

/// Returns the export file name for a point in time.
pub fn export_file_name(at: Timestamp) -> String {
    format!("workflow-{}.json", at.as_second())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;
    use crate::error::Error;
    use crate::node::VideoGeneratorData;

    fn edited_pipeline() -> Workflow {
        let mut workflow = Workflow::chain(NodeKind::iter());
        workflow.move_node("2", Position::new(12.5, -0.125));
        workflow.set_status("2", Some("done".into()));
        workflow
            .update_data(
                "3",
                VideoGeneratorData {
                    label: "Clip".into(),
                    duration: 7.5,
                    camera: None,
                    status: None,
                }
                .into(),
            )
            .unwrap();
        workflow
            .insert_edge(Edge {
                source_handle: Some("out".into()),
                target_handle: Some("in".into()),
                ..Edge::new("custom", "1", "5").with_animated(true)
            })
            .unwrap();
        workflow
    }

    #[test]
    fn test_round_trip() {
        let workflow = edited_pipeline();
        let restored = Workflow::from_json(&workflow.to_json()).unwrap();
        assert_eq!(restored, workflow);
    }

    #[test]
    fn test_round_trip_keeps_dangling_edges() {
        let text = json!({
            "nodes": [{ "id": "1", "type": "textNode", "position": { "x": 0, "y": 0 }, "data": { "prompt": "p" } }],
            "edges": [{ "id": "e1-7", "source": "1", "target": "7", "animated": false }],
        })
        .to_string();

        let workflow = Workflow::from_json(&text).unwrap();
        assert_eq!(workflow.edge_count(), 1);
        assert_eq!(Workflow::from_json(&workflow.to_json()).unwrap(), workflow);
    }

    #[test]
    fn test_document_shape() {
        let mut workflow = Workflow::new();
        workflow.add_node(NodeKind::Output, Position::new(1.0, 2.0));
        let value: serde_json::Value = serde_json::from_str(&workflow.to_json()).unwrap();
        assert_eq!(
            value,
            json!({
                "nodes": [{
                    "id": "1",
                    "type": "outputNode",
                    "position": { "x": 1.0, "y": 2.0 },
                    "data": { "label": "Output" },
                }],
                "edges": [],
            })
        );
    }

    #[test]
    fn test_malformed_documents() {
        for text in ["not json", "[]", r#"{"edges": []}"#, r#"{"nodes": [{"type": "textNode"}]}"#] {
            let err = Workflow::from_json(text).unwrap_err();
            assert!(matches!(err, Error::MalformedDocument(_)), "{text}: {err}");
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let text = r#"{"nodes":[{"id":"1","type":"bogusType","position":{"x":0,"y":0},"data":{}}],"edges":[]}"#;
        let err = Workflow::from_json(text).unwrap_err();
        assert!(matches!(err, Error::UnknownNodeType(tag) if tag == "bogusType"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let text = json!({
            "nodes": [
                { "id": "1", "type": "outputNode", "data": {} },
                { "id": "1", "type": "textNode", "data": { "prompt": "" } },
            ],
        })
        .to_string();
        let err = Workflow::from_json(&text).unwrap_err();
        assert!(matches!(err, Error::DuplicateId(_)));
    }

    #[test]
    fn test_import_resumes_id_counter() {
        let text = json!({
            "nodes": [
                { "id": "7", "type": "outputNode" },
                { "id": "seed", "type": "textNode", "data": { "prompt": "" } },
            ],
        })
        .to_string();

        let mut workflow = Workflow::from_json(&text).unwrap();
        let id = workflow.add_node(NodeKind::Upscaler, Position::default()).id.clone();
        assert_eq!(id.as_str(), "8");
    }

    #[test]
    fn test_import_with_max_numeric_id() {
        let text = json!({
            "nodes": [
                { "id": "18446744073709551615", "type": "outputNode" },
                { "id": "3", "type": "textNode", "data": { "prompt": "" } },
            ],
        })
        .to_string();

        let mut workflow = Workflow::from_json(&text).unwrap();
        let first = workflow.add_node(NodeKind::TextInput, Position::default()).id.clone();
        let second = workflow.add_node(NodeKind::Upscaler, Position::default()).id.clone();
        assert_eq!(first.as_str(), "4");
        assert_eq!(second.as_str(), "5");
    }

    #[test]
    fn test_import_any_numeric_factor() {
        let text = json!({
            "nodes": [
                { "id": "1", "type": "upscaleNode", "data": { "factor": 1.5 } },
                { "id": "2", "type": "upscaleNode", "data": { "factor": -1 } },
            ],
            "edges": [],
        })
        .to_string();

        let workflow = Workflow::from_json(&text).unwrap();
        let factors: Vec<f64> = workflow
            .nodes()
            .iter()
            .filter_map(|node| match &node.data {
                NodeData::Upscaler(data) => Some(data.factor),
                _ => None,
            })
            .collect();
        assert_eq!(factors, [1.5, -1.0]);
        assert_eq!(Workflow::from_json(&workflow.to_json()).unwrap(), workflow);
    }

    #[test]
    fn test_non_finite_values_never_reach_the_document() {
        let mut workflow = Workflow::new();
        let id = workflow
            .add_node(NodeKind::VideoGenerator, Position::new(f64::INFINITY, 0.0))
            .id
            .clone();
        assert_eq!(workflow.node(&id).unwrap().position, Position::default());

        assert!(!workflow.move_node(&id, Position::new(0.0, f64::NAN)));

        let err = workflow
            .update_data(
                &id,
                VideoGeneratorData {
                    duration: f64::INFINITY,
                    ..VideoGeneratorData::default()
                }
                .into(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::NonFiniteValue { field: "duration", .. }));

        let restored = Workflow::from_json(&workflow.to_json()).unwrap();
        assert_eq!(restored, workflow);
    }

    #[test]
    fn test_non_utf8_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.json");
        fs::write(&path, b"{\"nodes\":[{\"id\":\"1\",\"type\":\"textNode\",\"data\":{\"prompt\":\"caf\xe9\"}}]}").unwrap();

        let mut workflow = edited_pipeline();
        let before = workflow.clone();

        let err = workflow.import_file(&path).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)), "{err}");
        assert_eq!(workflow, before);
    }

    #[test]
    fn test_failed_import_keeps_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(
            &path,
            r#"{"nodes":[{"id":"1","type":"bogusType","position":{"x":0,"y":0},"data":{}}],"edges":[]}"#,
        )
        .unwrap();

        let mut workflow = edited_pipeline();
        let before = workflow.clone();
        let revision = workflow.revision();

        let err = workflow.import_file(&path).unwrap_err();
        assert!(matches!(err, Error::UnknownNodeType(_)));
        assert_eq!(workflow, before);
        assert_eq!(workflow.revision(), revision);

        let err = workflow.import_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(workflow, before);
    }

    #[test]
    fn test_export_then_import() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = edited_pipeline();

        let path = workflow.export_to_dir(dir.path()).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("workflow-") && name.ends_with(".json"), "{name}");

        let mut imported = Workflow::new();
        imported.import_file(&path).unwrap();
        assert_eq!(imported, workflow);
        assert!(imported.revision() > 0);
    }

    #[test]
    fn test_export_file_name() {
        let at = Timestamp::from_second(1_700_000_000).unwrap();
        assert_eq!(export_file_name(at), "workflow-1700000000.json");
    }
}
