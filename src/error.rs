//! Error types for the benchmark pipeline.

use std::path::PathBuf;

/// Setup-level failures. Any of these aborts the whole run.
///
/// Per-file write failures are not represented here; they are recorded as
/// [`TaskFailure`](crate::TaskFailure) entries and never abort sibling writers.
#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to stat filesystem for {path}: {source}")]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to remove {path}: {source}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BenchError>;
