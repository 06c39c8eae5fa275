//! Error types for Ledgerbox.

use thiserror::Error;

/// Common error type for Ledgerbox.
#[derive(Error, Debug)]
pub enum LedgerboxError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed owner or path.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A file id that is already present in the file index.
    #[error("duplicate file id: {0}")]
    DuplicateFileId(String),

    /// A new folder claims an id already used by another folder.
    #[error("duplicate folder id: {0}")]
    DuplicateFolderId(String),

    /// Validation error for record fields.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for LedgerboxError {
    fn from(e: sqlx::Error) -> Self {
        LedgerboxError::Database(e.to_string())
    }
}

/// Result type alias for Ledgerbox operations.
pub type Result<T> = std::result::Result<T, LedgerboxError>;
