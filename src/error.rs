//! Error types for tasklist
//!
//! Library operations return `TaskError`; the binary wraps them in eyre.

use std::path::PathBuf;
use thiserror::Error;

/// All error types that can occur in the task engine
#[derive(Debug, Error)]
pub enum TaskError {
    /// Store unreachable or statement rejected
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Input rejected before reaching the store
    #[error("Validation error: {0}")]
    Validation(String),

    /// Export destination could not be written
    #[error("Export to {} failed: {source}", path.display())]
    ExportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<rusqlite::Error> for TaskError {
    fn from(err: rusqlite::Error) -> Self {
        TaskError::Persistence(err.to_string())
    }
}

/// Result type alias for task engine operations
pub type Result<T> = std::result::Result<T, TaskError>;
