//! Foundation types for the odb object database.
//!
//! Every other odb crate depends on `odb-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- 20-byte content address (SHA-1 of an object's canonical bytes)
//! - [`ByteCursor`] -- bounds-checked forward reader over a byte buffer
//! - [`Truncated`] -- the error a cursor raises when input runs out

pub mod cursor;
pub mod error;
pub mod object;

pub use cursor::{ByteCursor, Truncated};
pub use error::TypeError;
pub use object::{ObjectId, OID_HEX_LEN, OID_LEN};
