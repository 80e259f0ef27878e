use odb_types::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OdbError {
    /// No attached source holds the object.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    #[error("store error: {0}")]
    Store(#[from] odb_store::StoreError),

    #[error("pack error: {0}")]
    Pack(#[from] odb_pack::PackError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type OdbResult<T> = Result<T, OdbError>;
