//! Command implementations.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use atelier_graph::prelude::*;
use atelier_reqwest::{ReqwestClient, ReqwestConfig};
use strum::IntoEnumIterator;
use tokio::signal::ctrl_c;
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_COMMAND;
use crate::config::{Cli, Command};

/// Runs the selected command.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli { client, command } = cli;

    match command {
        Command::New { dir } => {
            let path = new_workflow(&dir)?;
            println!("{}", path.display());
        }
        Command::Validate { file, prune } => validate_file(&file, prune)?,
        Command::Check { file } => check_file(&client, &file).await?,
        Command::Execute { file, write, wait } => execute_file(&client, &file, write, wait).await?,
        Command::Poll { job_id } => {
            let dispatcher = dispatcher(&client)?;
            let state = poll(&dispatcher, &job_id, &cancel_on_ctrl_c()).await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Command::Status { workflow_id } => {
            let status = dispatcher(&client)?
                .workflow_status(&workflow_id)
                .await
                .context("failed to fetch workflow status")?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

/// Exports the sample pipeline into `dir`.
pub fn new_workflow(dir: &Path) -> anyhow::Result<PathBuf> {
    let workflow = Workflow::chain(NodeKind::iter());
    workflow
        .export_to_dir(dir)
        .with_context(|| format!("failed to export workflow to {}", dir.display()))
}

/// Validates a workflow file locally.
pub fn validate_file(file: &Path, prune: bool) -> anyhow::Result<()> {
    let mut workflow = load(file)?;

    if prune {
        let pruned = workflow.prune_dangling_edges();
        if !pruned.is_empty() {
            save(file, &workflow)?;
            println!("pruned {} dangling edge(s)", pruned.len());
        }
    }

    let validation = workflow.validate();
    println!("{}: {}", validation.status(), validation.message());
    if let Some(order) = validation.order() {
        println!("order: {}", join(order));
    }

    if let Validation::Invalid(failure) = validation {
        bail!("workflow {} is invalid: {failure}", file.display());
    }

    Ok(())
}

async fn check_file(client: &ReqwestConfig, file: &Path) -> anyhow::Result<()> {
    let workflow = load(file)?;
    let validation = dispatcher(client)?
        .validate_remote(&workflow)
        .await
        .context("remote validation failed")?;

    println!("{}: {}", validation.status, validation.message);
    if !validation.execution_order.is_empty() {
        println!("order: {}", join(&validation.execution_order));
    }

    if !validation.is_executable() {
        bail!("the executor rejected workflow {}", file.display());
    }

    Ok(())
}

async fn execute_file(
    client: &ReqwestConfig,
    file: &Path,
    write: bool,
    wait: bool,
) -> anyhow::Result<()> {
    let mut workflow = load(file)?;

    let validation = workflow.validate();
    if let Some(failure) = validation.failure() {
        bail!("refusing to execute invalid workflow {}: {failure}", file.display());
    }
    for warning in validation.warnings() {
        tracing::warn!(target: TRACING_TARGET_COMMAND, %warning, "validation warning");
    }

    let dispatcher = dispatcher(client)?;
    let report = dispatcher
        .execute(&workflow)
        .await
        .context("workflow execution failed")?;
    println!("{}", serde_json::to_string_pretty(&report.response)?);

    if write {
        let applied = report.apply_to(&mut workflow);
        save(file, &workflow)?;
        tracing::info!(
            target: TRACING_TARGET_COMMAND,
            file = %file.display(),
            applied,
            "Wrote node statuses"
        );
    }

    if wait {
        wait_for_jobs(&dispatcher, &report.response.job_ids).await?;
    }

    Ok(())
}

/// Polls every job of an execution, in node ID order.
async fn wait_for_jobs(
    dispatcher: &ExecutionDispatcher,
    job_ids: &HashMap<NodeId, String>,
) -> anyhow::Result<()> {
    let cancel = cancel_on_ctrl_c();
    let mut jobs: Vec<_> = job_ids.iter().collect();
    jobs.sort();

    let mut failed = 0;
    for (node_id, job_id) in jobs {
        let state = poll(dispatcher, job_id, &cancel).await?;
        match state.error.as_deref() {
            Some(error) => println!("{node_id}: {job_id} {} ({error})", state.status),
            None => println!("{node_id}: {job_id} {}", state.status),
        }
        if state.status == JobStatus::Failed {
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{failed} job(s) failed");
    }

    Ok(())
}

async fn poll(
    dispatcher: &ExecutionDispatcher,
    job_id: &str,
    cancel: &CancellationToken,
) -> anyhow::Result<JobState> {
    dispatcher
        .poll_job(job_id, cancel)
        .await
        .with_context(|| format!("failed to follow job {job_id}"))
}

fn dispatcher(config: &ReqwestConfig) -> anyhow::Result<ExecutionDispatcher> {
    let client = ReqwestClient::new(config.clone()).context("invalid API client configuration")?;
    Ok(client.into_dispatcher())
}

/// Returns a token cancelled on Ctrl+C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        match ctrl_c().await {
            Ok(()) => {
                tracing::info!(target: TRACING_TARGET_COMMAND, "Received Ctrl+C signal, cancelling");
                trigger.cancel();
            }
            Err(e) => {
                tracing::error!(
                    target: TRACING_TARGET_COMMAND,
                    error = %e,
                    "Failed to install Ctrl+C handler"
                );
            }
        }
    });

    token
}

fn load(file: &Path) -> anyhow::Result<Workflow> {
    let mut workflow = Workflow::new();
    workflow
        .import_file(file)
        .with_context(|| format!("failed to import {}", file.display()))?;
    Ok(workflow)
}

fn save(file: &Path, workflow: &Workflow) -> anyhow::Result<()> {
    fs::write(file, workflow.to_json()).with_context(|| format!("failed to write {}", file.display()))
}

fn join(ids: &[NodeId]) -> String {
    ids.iter().map(NodeId::as_str).collect::<Vec<_>>().join(", ")
}
