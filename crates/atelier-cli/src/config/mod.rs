//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── client: ReqwestConfig   # API base URL, timeouts, poll interval
//! └── command: Command        # new, validate, check, execute, poll, status
//! ```
//!
//! Client settings can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

use std::path::PathBuf;

use atelier_reqwest::ReqwestConfig;
use clap::{Parser, Subcommand};

use crate::TRACING_TARGET_CONFIG;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "atelier")]
#[command(about = "Build, validate and run Atelier lab workflows")]
#[command(version)]
pub struct Cli {
    /// Generation API client configuration.
    #[clap(flatten)]
    pub client: ReqwestConfig,

    /// Operation to perform.
    #[command(subcommand)]
    pub command: Command,
}

/// Operations offered by the CLI.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Export the sample text-to-output pipeline as a new workflow file.
    New {
        /// Directory the workflow file is written to.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Validate a workflow file locally and print its execution order.
    Validate {
        /// Workflow file to validate.
        file: PathBuf,

        /// Drop edges pointing at missing nodes and save the file.
        #[arg(long)]
        prune: bool,
    },

    /// Ask the generation API to validate a workflow file.
    Check {
        /// Workflow file to validate.
        file: PathBuf,
    },

    /// Submit a workflow file for execution.
    Execute {
        /// Workflow file to execute.
        file: PathBuf,

        /// Write the returned node statuses back into the file.
        #[arg(long)]
        write: bool,

        /// Poll every started job until it finishes.
        #[arg(long)]
        wait: bool,
    },

    /// Poll a generation job until it finishes.
    Poll {
        /// Job ID returned by an execution.
        job_id: String,
    },

    /// Print the progress of a workflow run.
    Status {
        /// Workflow run ID.
        workflow_id: String,
    },
}

impl Cli {
    /// Logs the effective client configuration.
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            base_url = %self.client.base_url,
            timeout_secs = self.client.effective_timeout().as_secs(),
            poll_interval_ms = self.client.effective_poll_interval().as_millis(),
            user_agent = %self.client.effective_user_agent(),
            "client configuration"
        );
    }
}
