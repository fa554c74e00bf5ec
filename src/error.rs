// Errors - crate-wide error type and Result alias

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the item registry, the graduates reader and the
/// configuration layer.
#[derive(Error, Debug)]
pub enum MetisError {
    #[error("Item not found")]
    ItemNotFound(u64),

    #[error("Excel file not found")]
    SourceNotFound(PathBuf),

    #[error("{0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Spreadsheet could not be opened or decoded. Carries the reader's
    /// context chain.
    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

impl MetisError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MetisError::ItemNotFound(_) | MetisError::SourceNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, MetisError>;
