//! Error types for Farmhand
//!
//! Library errors use `thiserror`; the binary surface wraps them in `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Farmhand operations
pub type FarmhandResult<T> = Result<T, FarmhandError>;

/// Main error type for Farmhand operations
#[derive(Error, Debug)]
pub enum FarmhandError {
    /// A deployment step exited non-zero (or died to a signal)
    #[error("step '{step}' failed{}", fmt_status(.status))]
    StepFailed {
        step: String,
        status: Option<i32>,
        output: String,
    },

    /// A step's command could not be started at all
    #[error("could not spawn command for step '{step}': {source}")]
    Spawn {
        step: String,
        #[source]
        source: std::io::Error,
    },

    /// Plan file could not be parsed
    #[error("invalid plan file {file}: {message}")]
    InvalidPlan { file: PathBuf, message: String },

    /// Plan file does not exist
    #[error("plan file not found: {path}")]
    PlanNotFound { path: PathBuf },

    /// A plan declared no steps to run
    #[error("plan contains no steps")]
    EmptyPlan,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn fmt_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!(" with exit status {code}"),
        None => " (terminated by signal)".to_string(),
    }
}

impl FarmhandError {
    /// Process exit code mandated by the failure.
    ///
    /// Conventional shell semantics: the first failing step's status, or 1
    /// when no status is available (signal death, spawn failure, bad plan).
    pub fn exit_code(&self) -> i32 {
        match self {
            FarmhandError::StepFailed {
                status: Some(code), ..
            } => *code,
            _ => 1,
        }
    }
}
