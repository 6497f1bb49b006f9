//! Error types
//!
//! Three layers of failure, kept distinct so callers can tell "not found"
//! from "corrupt" from "the medium itself broke":
//!
//! - [`ValidationError`]: a stored record could not be decoded, or a
//!   document could not be encoded.
//! - [`MediumError`]: the key-value medium failed to read or write.
//! - [`StoreError`]: everything the document store can return.
//!
//! A missing key is never an error; it is an explicit `None`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A document record failed validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The record is not parseable as JSON
    #[error("Malformed document record: {0}")]
    Malformed(String),

    /// The record parsed, but is not a JSON object
    #[error("Document record is not an object")]
    NotARecord,

    /// `id` is absent or empty
    #[error("Missing id")]
    MissingId,

    /// `id` is not a string shaped like a UUID-v4
    #[error("id is not a valid uuid: {0}")]
    InvalidId(String),

    /// `content` is absent or not a string
    #[error("content is not a string")]
    InvalidContent,

    /// `title` is present but not a string
    #[error("title is not a string")]
    InvalidTitle,

    /// A timestamp field is present but not an integer
    #[error("{0} is not an integer timestamp")]
    InvalidTimestamp(&'static str),
}

/// Errors raised by a key-value medium
#[derive(Error, Debug)]
pub enum MediumError {
    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to prepare the storage location
    #[error("Failed to prepare storage at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A shared in-memory origin was poisoned by a panicking holder
    #[error("In-memory storage lock poisoned")]
    Poisoned,
}

impl MediumError {
    /// Create an error from an I/O error with path context
    pub fn from_io(source: io::Error, path: impl Into<PathBuf>) -> Self {
        MediumError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors returned by document store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A stored record is corrupt
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The caller handed the store something it cannot persist
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No stored document matches the given id or key
    #[error("Document not found: {0}")]
    NotFound(String),

    /// An id prefix matches more than one document
    #[error("Id prefix '{prefix}' matches {count} documents")]
    AmbiguousId { prefix: String, count: usize },

    /// The stored manifest is not a list of document keys
    #[error("Manifest is corrupted: {0}")]
    CorruptManifest(String),

    /// The underlying medium failed
    #[error(transparent)]
    Medium(#[from] MediumError),
}

impl StoreError {
    /// Whether this error came from a bad stored record rather than the medium
    ///
    /// Callers use this to decide whether to skip an entry or give up.
    pub fn is_corrupt_data(&self) -> bool {
        matches!(
            self,
            StoreError::Validation(_) | StoreError::CorruptManifest(_)
        )
    }
}

/// Result type for medium operations
pub type MediumResult<T> = Result<T, MediumError>;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        assert_eq!(ValidationError::MissingId.to_string(), "Missing id");
        assert_eq!(
            ValidationError::InvalidId("nope".to_string()).to_string(),
            "id is not a valid uuid: nope"
        );
        assert_eq!(
            ValidationError::InvalidTimestamp("created_at").to_string(),
            "created_at is not an integer timestamp"
        );
    }

    #[test]
    fn test_validation_is_transparent_in_store_error() {
        let err: StoreError = ValidationError::InvalidContent.into();
        assert_eq!(err.to_string(), "content is not a string");
        assert!(err.is_corrupt_data());
    }

    #[test]
    fn test_medium_error_is_not_corrupt_data() {
        let err: StoreError = MediumError::Poisoned.into();
        assert!(!err.is_corrupt_data());
    }

    #[test]
    fn test_ambiguous_id_display() {
        let err = StoreError::AmbiguousId {
            prefix: "3f".to_string(),
            count: 2,
        };
        assert_eq!(err.to_string(), "Id prefix '3f' matches 2 documents");
        assert!(!err.is_corrupt_data());
    }

    #[test]
    fn test_io_error_display() {
        let err = MediumError::from_io(
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            "/data/fuqdocs",
        );
        let msg = err.to_string();
        assert!(msg.contains("/data/fuqdocs"));
        assert!(msg.contains("denied"));
    }
}
