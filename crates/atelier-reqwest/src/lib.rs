//! Reqwest-based executor client for Atelier lab workflows.
//!
//! This crate provides the [`ReqwestClient`], an HTTP implementation of the
//! [`ExecutorProvider`](atelier_graph::dispatch::ExecutorProvider) trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use atelier_reqwest::{ReqwestClient, ReqwestConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let dispatcher = ReqwestClient::new(ReqwestConfig::default())?.into_dispatcher();
//!
//! let report = dispatcher.execute(&workflow).await?;
//! for job_id in report.response.job_ids.values() {
//!     let state = dispatcher.poll_job(job_id, &CancellationToken::new()).await?;
//!     println!("{job_id}: {}", state.status);
//! }
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod connect;
mod error;
mod service;

pub use crate::connect::{
    DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_SECS, ReqwestClient,
    ReqwestConfig, TRACING_TARGET,
};
pub use crate::error::{Error, Result};
