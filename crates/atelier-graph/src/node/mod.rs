//! Node kinds, identifiers and per-kind data.

mod data;
mod id;
mod kind;

pub use data::{
    ImageGeneratorData, NodeData, OutputData, TextInputData, UpscalerData, VideoGeneratorData,
};
pub use id::{EdgeId, NodeId};
pub use kind::{NodeKind, default_data_for};
