use std::path::PathBuf;
use thiserror::Error;

use crate::types::Year;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("Cohort is empty")]
    EmptyCohort,

    #[error("No non-sentinel values for '{field}'")]
    NoValues { field: &'static str },

    #[error("Run for year {year} didn't work: {lines} output lines (need more than {required})")]
    NoOutput {
        year: Year,
        lines: usize,
        required: usize,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HarnessError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
