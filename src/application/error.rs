//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{BlockId, DomainError};

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("block not found: {0}")]
    BlockNotFound(BlockId),

    #[error("invalid edit: {0}")]
    InvalidEdit(String),

    #[error("edit #{} failed: {source}", .position + 1)]
    EditFailed {
        /// 0-based index into the batch; shown 1-based
        position: usize,
        #[source]
        source: Box<ApplicationError>,
    },

    #[error("document not found: {}", .path.display())]
    DocumentMissing { path: PathBuf },

    #[error("invalid document {}: {message}", .path.display())]
    Document { path: PathBuf, message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// The innermost error of a failed batch edit.
    pub fn root_cause(&self) -> &ApplicationError {
        match self {
            ApplicationError::EditFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
