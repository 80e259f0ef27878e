use odb_types::{ObjectId, Truncated};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("invalid {what} magic: expected {expected}, got {actual}")]
    InvalidMagic {
        what: &'static str,
        expected: String,
        actual: String,
    },

    /// Index v1, pack versions other than 2/3, tag objects.
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("malformed pack data at offset {offset}: {reason}")]
    Format { offset: u64, reason: String },

    #[error(transparent)]
    Truncated(#[from] Truncated),

    #[error("unknown object type {type_bits} at offset {offset}")]
    UnknownObjectType { offset: u64, type_bits: u8 },

    #[error("{what} checksum mismatch")]
    ChecksumMismatch { what: &'static str },

    #[error("CRC32 mismatch at offset {offset}: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch {
        offset: u64,
        expected: u32,
        actual: u32,
    },

    #[error("object hash mismatch: index lists {expected}, content hashes to {computed}")]
    HashMismatch {
        expected: ObjectId,
        computed: ObjectId,
    },

    #[error("object not found in pack: {0}")]
    ObjectNotFound(ObjectId),

    /// Delta chain too deep, or revisiting an offset.
    #[error("delta resolution from offset {offset} aborted: {reason}")]
    RecursionLimit { offset: u64, reason: String },

    /// A ref-delta base that no attached pack contains.
    #[error("delta base {0} not found in any attached pack")]
    DanglingReference(ObjectId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PackError {
    pub(crate) fn format(offset: u64, reason: impl Into<String>) -> Self {
        Self::Format {
            offset,
            reason: reason.into(),
        }
    }
}

pub type PackResult<T> = Result<T, PackError>;
