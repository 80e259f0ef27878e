//! Content-addressable object store.
//!
//! Provides a single API over a loose object directory and attached pack
//! files. This is the main entry point for applications embedding odb.
//!
//! ```no_run
//! use odb::{ObjectKind, ObjectStore, StoreConfig};
//!
//! # fn main() -> odb::OdbResult<()> {
//! let store = ObjectStore::open("/path/to/repo", StoreConfig::default())?;
//! let id = store.put(ObjectKind::Blob, b"hello\n")?;
//! assert!(store.has(&id));
//! let obj = store.get(&id)?;
//! assert_eq!(obj.content(), b"hello\n");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod store;

pub use config::StoreConfig;
pub use error::{OdbError, OdbResult};
pub use store::ObjectStore;

// Re-export key types
pub use odb_pack::{PackConfig, PackError, PackIndex, PackReader};
pub use odb_store::{
    Blob, Commit, CommitHeader, EntryMode, GitObject, ObjectKind, StoreError, Tree, TreeEntry,
};
pub use odb_types::ObjectId;
