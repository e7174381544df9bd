//! Per-kind node data.
//!
//! Field sets are closed: unknown keys in imported documents are dropped.

use derive_more::From;
use serde::{Deserialize, Serialize};

use super::kind::NodeKind;
use crate::error::{Error, Result};

/// Data of a [`NodeKind::TextInput`] node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextInputData {
    /// Display label.
    #[serde(default = "TextInputData::default_label")]
    pub label: String,
    /// Prompt passed to downstream generators.
    pub prompt: String,
    /// Status annotation written after execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl TextInputData {
    fn default_label() -> String {
        NodeKind::TextInput.default_label().to_owned()
    }
}

impl Default for TextInputData {
    fn default() -> Self {
        Self {
            label: Self::default_label(),
            prompt: String::new(),
            status: None,
        }
    }
}

/// Data of a [`NodeKind::ImageGenerator`] node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGeneratorData {
    /// Display label.
    #[serde(default = "ImageGeneratorData::default_label")]
    pub label: String,
    /// Image model name.
    pub model: String,
    /// Status annotation written after execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ImageGeneratorData {
    /// Model used by new image generator nodes.
    pub const DEFAULT_MODEL: &'static str = "Stable Diffusion 1.5";

    fn default_label() -> String {
        NodeKind::ImageGenerator.default_label().to_owned()
    }
}

impl Default for ImageGeneratorData {
    fn default() -> Self {
        Self {
            label: Self::default_label(),
            model: Self::DEFAULT_MODEL.to_owned(),
            status: None,
        }
    }
}

/// Data of a [`NodeKind::VideoGenerator`] node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoGeneratorData {
    /// Display label.
    #[serde(default = "VideoGeneratorData::default_label")]
    pub label: String,
    /// Clip duration in seconds.
    pub duration: f64,
    /// Camera movement preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    /// Status annotation written after execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl VideoGeneratorData {
    /// Duration of new video generator nodes, in seconds.
    pub const DEFAULT_DURATION: f64 = 5.0;
    /// Camera movement of new video generator nodes.
    pub const DEFAULT_CAMERA: &'static str = "static";

    fn default_label() -> String {
        NodeKind::VideoGenerator.default_label().to_owned()
    }
}

impl Default for VideoGeneratorData {
    fn default() -> Self {
        Self {
            label: Self::default_label(),
            duration: Self::DEFAULT_DURATION,
            camera: Some(Self::DEFAULT_CAMERA.to_owned()),
            status: None,
        }
    }
}

/// Data of a [`NodeKind::Upscaler`] node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpscalerData {
    /// Display label.
    #[serde(default = "UpscalerData::default_label")]
    pub label: String,
    /// Scale factor.
    pub factor: f64,
    /// Status annotation written after execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl UpscalerData {
    /// Factor of new upscaler nodes.
    pub const DEFAULT_FACTOR: f64 = 2.0;

    fn default_label() -> String {
        NodeKind::Upscaler.default_label().to_owned()
    }
}

impl Default for UpscalerData {
    fn default() -> Self {
        Self {
            label: Self::default_label(),
            factor: Self::DEFAULT_FACTOR,
            status: None,
        }
    }
}

/// Data of a [`NodeKind::Output`] node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputData {
    /// Display label.
    #[serde(default = "OutputData::default_label")]
    pub label: String,
    /// Path of the produced artifact, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Status annotation written after execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl OutputData {
    fn default_label() -> String {
        NodeKind::Output.default_label().to_owned()
    }
}

impl Default for OutputData {
    fn default() -> Self {
        Self {
            label: Self::default_label(),
            path: None,
            status: None,
        }
    }
}

/// Type-specific data carried by a node.
///
/// Serializes as the bare field bag of the active variant; the kind tag is
/// written next to it by [`Node`](crate::workflow::Node).
#[derive(Debug, Clone, PartialEq, Serialize, From)]
#[serde(untagged)]
pub enum NodeData {
    /// Text prompt.
    TextInput(TextInputData),
    /// Image generation.
    ImageGenerator(ImageGeneratorData),
    /// Video generation.
    VideoGenerator(VideoGeneratorData),
    /// Upscaling.
    Upscaler(UpscalerData),
    /// Pipeline output.
    Output(OutputData),
}

impl NodeData {
    /// Parses the field bag of a node of the given kind.
    pub fn from_value(kind: NodeKind, value: serde_json::Value) -> Result<Self> {
        let value = match value {
            serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
            value => value,
        };

        let data = match kind {
            NodeKind::TextInput => Self::TextInput(serde_json::from_value(value)?),
            NodeKind::ImageGenerator => Self::ImageGenerator(serde_json::from_value(value)?),
            NodeKind::VideoGenerator => Self::VideoGenerator(serde_json::from_value(value)?),
            NodeKind::Upscaler => Self::Upscaler(serde_json::from_value(value)?),
            NodeKind::Output => Self::Output(serde_json::from_value(value)?),
        };

        Ok(data)
    }

    /// Returns the kind this data belongs to.
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::TextInput(_) => NodeKind::TextInput,
            Self::ImageGenerator(_) => NodeKind::ImageGenerator,
            Self::VideoGenerator(_) => NodeKind::VideoGenerator,
            Self::Upscaler(_) => NodeKind::Upscaler,
            Self::Output(_) => NodeKind::Output,
        }
    }

    /// Returns the display label.
    pub fn label(&self) -> &str {
        match self {
            Self::TextInput(data) => &data.label,
            Self::ImageGenerator(data) => &data.label,
            Self::VideoGenerator(data) => &data.label,
            Self::Upscaler(data) => &data.label,
            Self::Output(data) => &data.label,
        }
    }

    /// Returns the status annotation, if any.
    pub fn status(&self) -> Option<&str> {
        match self {
            Self::TextInput(data) => data.status.as_deref(),
            Self::ImageGenerator(data) => data.status.as_deref(),
            Self::VideoGenerator(data) => data.status.as_deref(),
            Self::Upscaler(data) => data.status.as_deref(),
            Self::Output(data) => data.status.as_deref(),
        }
    }

    /// Returns the name of the first numeric field that is NaN or infinite.
    ///
    /// JSON has no encoding for such values, so they cannot be exported.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        match self {
            Self::VideoGenerator(data) if !data.duration.is_finite() => Some("duration"),
            Self::Upscaler(data) if !data.factor.is_finite() => Some("factor"),
            Self::TextInput(_)
            | Self::ImageGenerator(_)
            | Self::VideoGenerator(_)
            | Self::Upscaler(_)
            | Self::Output(_) => None,
        }
    }

    /// Replaces the status annotation.
    pub fn set_status(&mut self, status: Option<String>) {
        let slot = match self {
            Self::TextInput(data) => &mut data.status,
            Self::ImageGenerator(data) => &mut data.status,
            Self::VideoGenerator(data) => &mut data.status,
            Self::Upscaler(data) => &mut data.status,
            Self::Output(data) => &mut data.status,
        };
        *slot = status;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_value_ignores_unknown_fields() {
        let data = NodeData::from_value(
            NodeKind::ImageGenerator,
            json!({ "label": "Image Gen", "model": "SDXL", "prompt": "ignored" }),
        )
        .unwrap();

        assert_eq!(
            data,
            NodeData::ImageGenerator(ImageGeneratorData {
                label: "Image Gen".into(),
                model: "SDXL".into(),
                status: None,
            })
        );
        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            json!({ "label": "Image Gen", "model": "SDXL" })
        );
    }

    #[test]
    fn test_from_value_requires_kind_fields() {
        let err = NodeData::from_value(NodeKind::Upscaler, json!({ "label": "Up" })).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[test]
    fn test_missing_label_uses_kind_default() {
        let data = NodeData::from_value(NodeKind::Output, serde_json::Value::Null).unwrap();
        assert_eq!(data.label(), "Output");
    }

    #[test]
    fn test_fractional_factor() {
        let data =
            NodeData::from_value(NodeKind::Upscaler, json!({ "factor": 1.5 })).unwrap();
        assert!(matches!(&data, NodeData::Upscaler(up) if up.factor == 1.5));
        assert_eq!(data.non_finite_field(), None);
    }

    #[test]
    fn test_non_finite_field() {
        let data = NodeData::from(VideoGeneratorData {
            duration: f64::NAN,
            ..VideoGeneratorData::default()
        });
        assert_eq!(data.non_finite_field(), Some("duration"));

        let data = NodeData::from(UpscalerData {
            factor: f64::INFINITY,
            ..UpscalerData::default()
        });
        assert_eq!(data.non_finite_field(), Some("factor"));
    }

    #[test]
    fn test_set_status() {
        let mut data = NodeKind::VideoGenerator.default_data();
        data.set_status(Some("running".into()));
        assert_eq!(data.status(), Some("running"));
        data.set_status(None);
        assert_eq!(data.status(), None);
    }
}
