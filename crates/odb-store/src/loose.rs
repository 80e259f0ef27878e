//! Loose object encoding.
//!
//! A loose object is `deflate("{kind} {len}\0" || content)`, stored one per
//! file under `objects/<2 hex>/<38 hex>`.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use odb_types::{ByteCursor, ObjectId, Truncated};

use crate::error::{StoreError, StoreResult};
use crate::object::{GitObject, ObjectKind};

/// Canonical header for an object of `kind` with `content_len` bytes.
pub fn canonical_header(kind: ObjectKind, content_len: usize) -> Vec<u8> {
    kind.hasher().header(content_len)
}

/// Content address of `content` as an object of `kind`.
pub fn compute_id(kind: ObjectKind, content: &[u8]) -> ObjectId {
    kind.hasher().hash(content)
}

/// Deflate header and content at the default compression level.
pub fn encode_loose(kind: ObjectKind, content: &[u8]) -> StoreResult<Vec<u8>> {
    encode_loose_with(kind, content, Compression::default())
}

/// Deflate header and content at an explicit compression level.
pub fn encode_loose_with(
    kind: ObjectKind,
    content: &[u8],
    level: Compression,
) -> StoreResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(content.len() / 2 + 32), level);
    encoder.write_all(&canonical_header(kind, content.len()))?;
    encoder.write_all(content)?;
    Ok(encoder.finish()?)
}

/// Inflate a loose object and parse its header.
pub fn decode_loose(raw: &[u8]) -> StoreResult<GitObject> {
    let mut inflated = Vec::new();
    ZlibDecoder::new(raw)
        .read_to_end(&mut inflated)
        .map_err(|e| StoreError::format(format!("inflate failed: {e}")))?;

    let (kind, content) = parse_canonical(&inflated)?;
    Ok(GitObject::new(kind, content.to_vec()))
}

/// Split inflated loose bytes into kind and content.
pub fn parse_canonical(data: &[u8]) -> StoreResult<(ObjectKind, &[u8])> {
    let mut cursor = ByteCursor::new(data);
    let header = cursor
        .take_until(0)
        .map_err(|_| StoreError::format("object header is not NUL-terminated"))?;

    let space = header
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| StoreError::format("object header has no space separator"))?;
    let (name, digits) = (&header[..space], &header[space + 1..]);

    let kind = ObjectKind::from_name(name).ok_or_else(|| {
        StoreError::format(format!(
            "unknown object kind `{}`",
            String::from_utf8_lossy(name)
        ))
    })?;
    let declared = parse_length(digits)?;

    let content = cursor.rest();
    if content.len() < declared {
        return Err(Truncated {
            offset: cursor.position(),
            needed: declared,
            available: content.len(),
        }
        .into());
    }
    if content.len() > declared {
        return Err(StoreError::format(format!(
            "{} trailing bytes after {declared}-byte {kind} content",
            content.len() - declared
        )));
    }
    Ok((kind, content))
}

/// Decimal length without sign or leading zeros.
fn parse_length(digits: &[u8]) -> StoreResult<usize> {
    let malformed = || {
        StoreError::format(format!(
            "invalid object length `{}`",
            String::from_utf8_lossy(digits)
        ))
    };
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(malformed());
    }
    if digits.len() > 1 && digits[0] == b'0' {
        return Err(malformed());
    }
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(malformed)
}
