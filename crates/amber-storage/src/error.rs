//! Error types for amber-storage

use thiserror::Error;

/// Errors that can occur in storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error during storage operations
    #[error("I/O error: {0}")]
    Io(String),

    /// No blob stored under the requested address
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// Stored bytes no longer match their address
    #[error("Content hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    /// Blob exceeds the configured size limit
    #[error("Storage capacity exceeded")]
    CapacityExceeded,

    /// Content address could not be parsed
    #[error("Invalid content address: {0}")]
    InvalidAddress(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl StorageError {
    /// Create a new NotFound error
    pub fn not_found(address: impl Into<String>) -> Self {
        Self::NotFound(address.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = StorageError::not_found("abcd1234");
        assert!(matches!(err, StorageError::NotFound(_)));
        assert!(err.to_string().contains("abcd1234"));
    }

    #[test]
    fn test_hash_mismatch_display() {
        let err = StorageError::HashMismatch {
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("aa"));
        assert!(msg.contains("bb"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let storage_err: StorageError = io_err.into();
        assert!(matches!(storage_err, StorageError::Io(_)));
    }

    #[test]
    fn test_capacity_exceeded_error() {
        let err = StorageError::CapacityExceeded;
        assert!(matches!(err, StorageError::CapacityExceeded));
    }
}
