//! Trailing SHA-1 checksums.
//!
//! Pack files and pack indexes both end with the SHA-1 of every byte that
//! precedes it.

use crate::hasher::ContentHasher;

/// Length of a trailing checksum.
pub const CHECKSUM_LEN: usize = 20;

/// A raw trailing checksum.
pub type Checksum = [u8; CHECKSUM_LEN];

/// Split a file into its body and trailing checksum. `None` if the data is
/// shorter than a checksum.
pub fn split_trailer(data: &[u8]) -> Option<(&[u8], &Checksum)> {
    let body_len = data.len().checked_sub(CHECKSUM_LEN)?;
    let (body, trailer) = data.split_at(body_len);
    let trailer: &Checksum = trailer.try_into().ok()?;
    Some((body, trailer))
}

/// Checksum a body the way it would be written as a trailer.
pub fn compute_trailer(body: &[u8]) -> Checksum {
    ContentHasher::raw_hash(body)
}

/// Recompute the checksum over everything but the last 20 bytes and compare
/// it to those bytes.
pub fn verify_trailer(data: &[u8]) -> bool {
    match split_trailer(data) {
        Some((body, trailer)) => compute_trailer(body) == *trailer,
        None => false,
    }
}
