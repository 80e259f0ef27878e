use odb_types::{ObjectId, Truncated};

use crate::object::ObjectKind;

/// Errors from object codecs and the loose object directory.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Content hash disagrees with the id the object was stored under.
    #[error("hash mismatch: expected {expected}, computed {computed}")]
    HashMismatch {
        expected: ObjectId,
        computed: ObjectId,
    },

    /// Malformed header, mode, name, or header line.
    #[error("malformed object: {0}")]
    Format(String),

    /// Fewer bytes than the encoding declared.
    #[error(transparent)]
    Truncated(#[from] Truncated),

    /// A typed view was requested for an object of another kind.
    #[error("expected {expected} object, got {actual}")]
    KindMismatch {
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// I/O error from the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn format(reason: impl Into<String>) -> Self {
        Self::Format(reason.into())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
