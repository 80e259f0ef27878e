use crate::object::{ObjectId, OID_LEN};

/// Raised when a read runs past the end of the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("truncated input at offset {offset}: needed {needed} bytes, {available} available")]
pub struct Truncated {
    /// Absolute position of the failed read.
    pub offset: usize,
    /// Bytes the read required.
    pub needed: usize,
    /// Bytes that were left.
    pub available: usize,
}

/// Forward-only reader over a byte slice.
///
/// Every read is bounds-checked and advances the position; a failed read
/// leaves the position unchanged. Integers are big-endian, matching the
/// pack and index formats.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Start reading at `pos`. Positions past the end read as empty.
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos: pos.min(data.len()),
        }
    }

    /// Current absolute position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread tail, without advancing.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Take the next `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], Truncated> {
        if n > self.remaining() {
            return Err(Truncated {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), Truncated> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8, Truncated> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u32_be(&mut self) -> Result<u32, Truncated> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(buf))
    }

    pub fn read_u64_be(&mut self) -> Result<u64, Truncated> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(buf))
    }

    /// Read a fixed-size array, e.g. a 20-byte checksum.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Truncated> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    /// Read a raw 20-byte object id.
    pub fn read_object_id(&mut self) -> Result<ObjectId, Truncated> {
        self.read_array::<OID_LEN>().map(ObjectId::from_hash)
    }

    /// Read up to (not including) the next `delim`, then consume the delimiter.
    pub fn take_until(&mut self, delim: u8) -> Result<&'a [u8], Truncated> {
        match self.rest().iter().position(|&b| b == delim) {
            Some(len) => {
                let slice = &self.data[self.pos..self.pos + len];
                self.pos += len + 1;
                Ok(slice)
            }
            None => Err(Truncated {
                offset: self.pos,
                needed: self.remaining() + 1,
                available: self.remaining(),
            }),
        }
    }
}
