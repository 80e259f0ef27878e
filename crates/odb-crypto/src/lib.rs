//! Hashing primitives for the odb object database.
//!
//! Provides the content-address hasher (canonical object header followed by
//! content, digested with SHA-1) and the trailing-checksum helpers shared by
//! the pack and pack-index formats.
//!
//! All digests wrap the `sha1` crate; there is no custom cryptography.

pub mod checksum;
pub mod hasher;

pub use checksum::{compute_trailer, split_trailer, verify_trailer, Checksum, CHECKSUM_LEN};
pub use hasher::ContentHasher;
