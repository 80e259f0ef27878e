//! Object model and codecs for the odb object database.
//!
//! Every object is an immutable value identified by the SHA-1 of its
//! canonical encoding (`"{kind} {len}\0"` followed by the content). This
//! crate owns the three object kinds and their byte formats, plus the loose
//! object directory that stores one compressed file per object.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw content
//! - [`Tree`] -- ordered `(mode, name, id)` entries
//! - [`Commit`] -- tree, parents, authorship and message
//!
//! # Codecs
//!
//! - [`loose`] -- zlib framing with the canonical header
//! - [`tree`] -- tree entry encoding and canonical ordering
//! - [`commit`] -- commit header lines and message
//!
//! # Design Rules
//!
//! 1. Objects are immutable once built; a [`GitObject`]'s id always matches
//!    its content.
//! 2. Codecs never reorder: encode writes what it is given, decode returns
//!    what is stored. Sorting is an explicit step ([`Tree::new`]).
//! 3. Writes are idempotent: storing an existing object is a no-op.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod commit;
pub mod error;
pub mod filesystem;
pub mod loose;
pub mod object;
pub mod tree;

// Re-export primary types at crate root for ergonomic imports.
pub use commit::{decode_commit, encode_commit, Commit, CommitHeader};
pub use error::{StoreError, StoreResult};
pub use filesystem::LooseObjectDir;
pub use loose::{canonical_header, compute_id, decode_loose, encode_loose};
pub use object::{Blob, GitObject, ObjectKind};
pub use tree::{decode_tree, encode_tree, EntryMode, Tree, TreeEntry};
