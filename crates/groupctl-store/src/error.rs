//! Error types for groupctl-store

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from the table store and record decoding
#[derive(Error, Debug)]
pub enum StoreError {
    /// Table or column name that cannot be used as an identifier
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Record type without any columns
    #[error("Record declares no columns")]
    EmptyRecord,

    /// Live table shape and record shape disagree
    #[error("Column count mismatch: expected {expected}, found {found}")]
    ColumnMismatch { expected: usize, found: usize },

    /// Primary key (or other constraint) already taken
    #[error("Row already exists in table {0}")]
    AlreadyExists(String),

    /// Stored value cannot be converted into the field type
    #[error("Cannot decode column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Filesystem error while preparing the database location
    #[error("IO error: {0}")]
    Io(String),

    /// Any other SQLite failure
    #[error("Database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::ColumnMismatch {
            expected: 2,
            found: 3,
        };
        assert_eq!(err.to_string(), "Column count mismatch: expected 2, found 3");

        let err = StoreError::InvalidIdentifier(String::new());
        assert!(err.to_string().contains("Invalid identifier"));
    }

    #[test]
    fn rusqlite_error_maps_to_database() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
