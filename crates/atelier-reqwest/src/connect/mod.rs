//! Reqwest client module.
//!
//! This module provides the HTTP client used to reach the workflow executor
//! and its configuration.

mod client;
mod config;

pub use client::{ReqwestClient, TRACING_TARGET};
pub use config::{
    DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_SECS, ReqwestConfig,
};
