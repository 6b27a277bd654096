use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures of a fill operation. Anything not listed here (pool exhaustion,
/// lock persistence) degrades locally and never reaches the caller.
#[derive(Debug, Error)]
pub enum FillError {
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("required columns not found in the header rows: {0}")]
    MissingColumns(String),

    #[error("failed to read workbook {path}: {reason}")]
    Workbook { path: PathBuf, reason: String },

    #[error("failed to save workbook: {0}")]
    Save(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type FillResult<T> = std::result::Result<T, FillError>;
