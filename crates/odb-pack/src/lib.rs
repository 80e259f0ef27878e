//! Pack reading for the odb object database.
//!
//! A pack stores many objects in one file, each zlib-compressed and
//! optionally delta-encoded against another object. A pack index maps ids
//! to entry offsets so objects can be read at random.
//!
//! # Architecture
//!
//! - **Pack index** (`.idx`, v2): fan-out table and sorted ids for
//!   O(log n) lookups, with per-entry CRC32 and 32/64-bit offsets
//! - **Pack file** (`.pack`, v2/v3): header, entries, SHA-1 trailer
//! - **PackReader**: positioned reads and delta resolution over one pack
//! - **PackManager**: ordered packs with cross-pack ref-delta bases
//! - **index_pack**: rebuilds an index by scanning a pack
//!
//! Delta chains are resolved iteratively. Depth is capped by
//! [`PackConfig::max_delta_depth`] and revisited offsets are detected; both
//! fail with [`PackError::RecursionLimit`].

pub mod config;
pub mod delta;
pub mod entry;
pub mod error;
pub mod index;
pub mod manager;
pub mod reader;
pub mod scan;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod fixture;

pub use config::{PackConfig, DEFAULT_MAX_DELTA_DEPTH};
pub use delta::{apply_delta, delta_sizes, DeltaError};
pub use entry::{DeltaBase, EntryKind, PackEntry};
pub use error::{PackError, PackResult};
pub use index::PackIndex;
pub use manager::PackManager;
pub use reader::{PackHeader, PackReader, Verification};
pub use scan::{index_pack, PackScanner, ScannedEntry};
pub use traits::{BaseProvider, NoExternalBases};
