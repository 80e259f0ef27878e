//! Delta instruction streams.
//!
//! A delta payload starts with the base size and the result size, each a
//! little-endian base-128 varint, followed by instructions:
//!
//! - `1xxxxxxx` copy: the low four bits select which of up to four offset
//!   bytes follow, the next three bits which of up to three size bytes
//!   follow (little-endian). A size of zero means `0x10000`.
//! - `0xxxxxxx` insert: the next `x` literal bytes (1..=127).
//! - `00000000` is reserved.

use odb_types::{ByteCursor, Truncated};
use thiserror::Error;

/// Copy size used when a copy instruction encodes zero.
pub const DEFAULT_COPY_SIZE: u64 = 0x10000;

/// Pre-allocation cap for delta results, independent of declared sizes.
const MAX_PREALLOC: u64 = 1 << 20;

#[derive(Debug, Error)]
pub enum DeltaError {
    #[error("delta expects a {expected}-byte base, got {actual}")]
    BaseSizeMismatch { expected: u64, actual: u64 },

    #[error("delta declares a {expected}-byte result, produced {actual}")]
    ResultSizeMismatch { expected: u64, actual: u64 },

    #[error("copy of {size} bytes at {offset} exceeds the {base_len}-byte base")]
    CopyOutOfRange { offset: u64, size: u64, base_len: u64 },

    #[error("reserved delta opcode 0x00 at instruction offset {0}")]
    ReservedOpcode(usize),

    #[error("delta size varint overflows 64 bits")]
    SizeOverflow,

    #[error(transparent)]
    Truncated(#[from] Truncated),
}

/// Read the `(base_size, result_size)` pair that opens a delta.
pub fn delta_sizes(delta: &[u8]) -> Result<(u64, u64), DeltaError> {
    let mut cursor = ByteCursor::new(delta);
    Ok((read_size(&mut cursor)?, read_size(&mut cursor)?))
}

/// Apply `delta` to `base`, producing the target object content.
pub fn apply_delta(base: &[u8], delta: &[u8]) -> Result<Vec<u8>, DeltaError> {
    let mut cursor = ByteCursor::new(delta);
    let base_size = read_size(&mut cursor)?;
    let result_size = read_size(&mut cursor)?;

    let base_len = base.len() as u64;
    if base_size != base_len {
        return Err(DeltaError::BaseSizeMismatch {
            expected: base_size,
            actual: base_len,
        });
    }

    let mut out = Vec::with_capacity(result_size.min(MAX_PREALLOC) as usize);
    while !cursor.is_empty() {
        let at = cursor.position();
        let op = cursor.read_u8()?;
        if op & 0x80 != 0 {
            let mut offset = 0u64;
            for i in 0..4 {
                if op & (1 << i) != 0 {
                    offset |= u64::from(cursor.read_u8()?) << (8 * i);
                }
            }
            let mut size = 0u64;
            for i in 0..3 {
                if op & (0x10 << i) != 0 {
                    size |= u64::from(cursor.read_u8()?) << (8 * i);
                }
            }
            if size == 0 {
                size = DEFAULT_COPY_SIZE;
            }
            let end = offset
                .checked_add(size)
                .filter(|&end| end <= base_len)
                .ok_or(DeltaError::CopyOutOfRange {
                    offset,
                    size,
                    base_len,
                })?;
            out.extend_from_slice(&base[offset as usize..end as usize]);
        } else if op != 0 {
            out.extend_from_slice(cursor.take(usize::from(op))?);
        } else {
            return Err(DeltaError::ReservedOpcode(at));
        }

        if out.len() as u64 > result_size {
            return Err(DeltaError::ResultSizeMismatch {
                expected: result_size,
                actual: out.len() as u64,
            });
        }
    }

    if out.len() as u64 != result_size {
        return Err(DeltaError::ResultSizeMismatch {
            expected: result_size,
            actual: out.len() as u64,
        });
    }
    Ok(out)
}

fn read_size(cursor: &mut ByteCursor<'_>) -> Result<u64, DeltaError> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = cursor.read_u8()?;
        let bits = u64::from(byte & 0x7f);
        if shift >= 64 || (shift > 57 && bits >> (64 - shift) != 0) {
            return Err(DeltaError::SizeOverflow);
        }
        value |= bits << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

/// One instruction for [`encode_delta`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeltaOp {
    Copy { offset: u64, size: u64 },
    Insert(Vec<u8>),
}

/// Build a delta payload from instructions.
///
/// Copies larger than `0xffffff` and inserts longer than 127 bytes are
/// split into several instructions.
pub fn encode_delta(base_size: u64, result_size: u64, ops: &[DeltaOp]) -> Vec<u8> {
    let mut out = Vec::new();
    write_size(&mut out, base_size);
    write_size(&mut out, result_size);
    for op in ops {
        match op {
            DeltaOp::Copy { offset, size } => {
                let mut offset = *offset;
                let mut remaining = *size;
                while remaining > 0 {
                    let chunk = remaining.min(0xff_ffff);
                    push_copy(&mut out, offset, chunk);
                    offset += chunk;
                    remaining -= chunk;
                }
            }
            DeltaOp::Insert(data) => {
                for chunk in data.chunks(0x7f) {
                    out.push(chunk.len() as u8);
                    out.extend_from_slice(chunk);
                }
            }
        }
    }
    out
}

fn push_copy(out: &mut Vec<u8>, offset: u64, size: u64) {
    let mut op = 0x80u8;
    let mut args = Vec::with_capacity(7);
    for i in 0..4 {
        let byte = (offset >> (8 * i)) as u8;
        if byte != 0 {
            op |= 1 << i;
            args.push(byte);
        }
    }
    if size != DEFAULT_COPY_SIZE {
        for i in 0..3 {
            let byte = (size >> (8 * i)) as u8;
            if byte != 0 {
                op |= 0x10 << i;
                args.push(byte);
            }
        }
    }
    out.push(op);
    out.extend(args);
}

fn write_size(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}
