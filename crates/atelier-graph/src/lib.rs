#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod dispatch;
mod error;
pub mod node;
mod persist;
pub mod validation;
pub mod workflow;

#[doc(hidden)]
pub mod prelude;

pub use error::{Error, Result};
pub use persist::export_file_name;

/// Tracing target for graph operations.
pub const TRACING_TARGET: &str = "atelier_graph";
