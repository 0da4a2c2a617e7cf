// src/error.rs

use crate::data_structures::KillFailure;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcError {
    #[error("no arguments expected, use the --id or --name flags")]
    UnexpectedArguments,
    #[error("only one of --id or --name may be provided")]
    ConflictingSelectors,
    #[error("either --id or --name must be provided")]
    MissingSelector,
    #[error("process {0} not found")]
    PidNotFound(u32),
    #[error("process not found")]
    NameNotFound,
    #[error("failed to send {signal} to process {pid}: {reason}")]
    Signal {
        pid: u32,
        signal: &'static str,
        reason: String,
    },
    #[error("{}", join_failures(.0))]
    PartialFailure(Vec<KillFailure>),
    #[error("failed to read process table: {0}")]
    ProcessTable(String),
    #[error("failed to list partitions: {0}")]
    Partitions(String),
    #[error("failed to read usage for {mount}: {reason}")]
    Usage { mount: String, reason: String },
    #[error("failed to render volumes: {0}")]
    Render(#[from] serde_json::Error),
}

fn join_failures(failures: &[KillFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("failed to kill process {} ({}): {}", f.pid, f.name, f.reason))
        .collect::<Vec<_>>()
        .join("\n")
}
