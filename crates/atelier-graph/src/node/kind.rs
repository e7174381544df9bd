//! Node type registry.
//!
//! [`NodeKind`] is the closed set of generation steps a workflow can contain.
//! Every site that inspects a node's kind matches on it exhaustively, so adding
//! a kind forces each of them to be revisited.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use super::data::{
    ImageGeneratorData, NodeData, OutputData, TextInputData, UpscalerData, VideoGeneratorData,
};
use crate::error::{Error, Result};

/// Kind of a workflow node.
///
/// The string form is the tag used by the lab editor and on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, EnumIter, IntoStaticStr)]
#[derive(Serialize, Deserialize)]
pub enum NodeKind {
    /// Text prompt entered by the user.
    #[strum(serialize = "textNode")]
    #[serde(rename = "textNode")]
    TextInput,
    /// Text-to-image generation step.
    #[strum(serialize = "imageGenNode")]
    #[serde(rename = "imageGenNode")]
    ImageGenerator,
    /// Text-to-video or image-to-video generation step.
    #[strum(serialize = "videoGenNode")]
    #[serde(rename = "videoGenNode")]
    VideoGenerator,
    /// Resolution upscaling step.
    #[strum(serialize = "upscaleNode")]
    #[serde(rename = "upscaleNode")]
    Upscaler,
    /// Final sink of a pipeline.
    #[strum(serialize = "outputNode")]
    #[serde(rename = "outputNode")]
    Output,
}

impl NodeKind {
    /// Parses an editor type tag.
    pub fn parse(tag: &str) -> Result<Self> {
        tag.parse()
            .map_err(|_| Error::UnknownNodeType(tag.to_owned()))
    }

    /// Returns fresh default data for this kind.
    ///
    /// Each call allocates a new value, so two nodes of the same kind never
    /// share state.
    pub fn default_data(self) -> NodeData {
        match self {
            Self::TextInput => TextInputData::default().into(),
            Self::ImageGenerator => ImageGeneratorData::default().into(),
            Self::VideoGenerator => VideoGeneratorData::default().into(),
            Self::Upscaler => UpscalerData::default().into(),
            Self::Output => OutputData::default().into(),
        }
    }

    /// Returns the label shown for new nodes of this kind.
    pub const fn default_label(self) -> &'static str {
        match self {
            Self::TextInput => "Text Prompt",
            Self::ImageGenerator => "Image Generator",
            Self::VideoGenerator => "Video Generator",
            Self::Upscaler => "Upscaler",
            Self::Output => "Output",
        }
    }

    /// Returns whether nodes of this kind have an input handle.
    pub const fn accepts_input(self) -> bool {
        match self {
            Self::TextInput => false,
            Self::ImageGenerator | Self::VideoGenerator | Self::Upscaler | Self::Output => true,
        }
    }

    /// Returns whether nodes of this kind have an output handle.
    pub const fn produces_output(self) -> bool {
        match self {
            Self::Output => false,
            Self::TextInput | Self::ImageGenerator | Self::VideoGenerator | Self::Upscaler => true,
        }
    }

    /// Returns whether this kind terminates a pipeline.
    pub const fn is_output(self) -> bool {
        matches!(self, Self::Output)
    }
}

/// Returns fresh default data for an editor type tag.
///
/// Fails with [`Error::UnknownNodeType`] for tags outside the closed set.
pub fn default_data_for(tag: &str) -> Result<NodeData> {
    NodeKind::parse(tag).map(NodeKind::default_data)
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for kind in NodeKind::iter() {
            assert_eq!(NodeKind::parse(kind.as_ref()).unwrap(), kind);
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::Value::String(kind.to_string())
            );
        }
        assert_eq!(NodeKind::ImageGenerator.to_string(), "imageGenNode");
    }

    #[test]
    fn test_unknown_tag() {
        let err = default_data_for("bogusType").unwrap_err();
        assert!(matches!(err, Error::UnknownNodeType(tag) if tag == "bogusType"));
    }

    #[test]
    fn test_default_data_matches_kind() {
        for kind in NodeKind::iter() {
            let data = kind.default_data();
            assert_eq!(data.kind(), kind);
            assert_eq!(data.label(), kind.default_label());
            assert_eq!(data.status(), None);
        }
    }

    #[test]
    fn test_default_data_is_not_shared() {
        let mut first = NodeKind::TextInput.default_data();
        let second = NodeKind::TextInput.default_data();
        if let NodeData::TextInput(text) = &mut first {
            text.prompt.push_str("forest scene");
        }
        assert_ne!(first, second);
    }

    #[test]
    fn test_handles() {
        assert!(!NodeKind::TextInput.accepts_input());
        assert!(!NodeKind::Output.produces_output());
        assert!(NodeKind::Upscaler.accepts_input() && NodeKind::Upscaler.produces_output());
    }
}
