//! Error types for sqlb
//!
//! Only operational failures are represented here. Misuse of the builder, the
//! registry or [`ScannedRows`](crate::scan::ScannedRows) is a programmer error
//! and panics at the call site with a message naming the broken expectation.

use thiserror::Error;

/// Boxed error produced by a column transform or a value conversion.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for sqlb operations
pub type SqlbResult<T> = Result<T, SqlbError>;

/// Errors returned while executing statements and correlating their rows
#[derive(Debug, Error)]
pub enum SqlbError {
    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// No row where one was expected
    #[error("Not found: {0}")]
    NotFound(String),

    /// The row source failed to fill the scan destinations of a row
    #[error("Scan error on row {row}: {message}")]
    Scan { row: usize, message: String },

    /// A column's deferred transform rejected the scanned raw value
    #[error("Transform error on column '{column}' of row {row}: {source}")]
    Transform {
        row: usize,
        column: String,
        #[source]
        source: BoxError,
    },

    /// A driver value could not be decoded
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl SqlbError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a scan error for a specific row
    pub fn scan(row: usize, message: impl Into<String>) -> Self {
        Self::Scan {
            row,
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if this error came from a column transform
    pub fn is_transform(&self) -> bool {
        matches!(self, Self::Transform { .. })
    }
}
