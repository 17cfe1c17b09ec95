//! Error types for the parsing and interpreter layers.
//!
//! Uses [`thiserror`] for derivation. [`BackendError`] wraps lopdf failures
//! and converts into [`ExtractError`] at the crate boundary.

use std::path::PathBuf;

use pdftables_core::ExtractError;
use thiserror::Error;

/// Error type for PDF backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The input path does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Error reading PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error resolving font or encoding information.
    #[error("font error: {0}")]
    Font(String),

    /// Error during content stream interpretation.
    #[error("interpreter error: {0}")]
    Interpreter(String),
}

impl From<lopdf::Error> for BackendError {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => BackendError::Io(e),
            other => BackendError::Parse(other.to_string()),
        }
    }
}

impl From<BackendError> for ExtractError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(path) => ExtractError::NotFound(path),
            other => ExtractError::Open(other.to_string()),
        }
    }
}
