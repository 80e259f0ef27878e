//! Pack entry headers.
//!
//! Each entry starts with a variable-length header: the first byte carries a
//! continuation bit, a 3-bit type and the low 4 bits of the inflated size;
//! every following byte contributes 7 more size bits, least significant
//! first. Delta entries then name their base, either as a backwards offset
//! (`OfsDelta`) or as a raw object id (`RefDelta`), before the zlib stream.

use std::io::Read;

use flate2::bufread::ZlibDecoder;
use odb_store::ObjectKind;
use odb_types::{ByteCursor, ObjectId};

use crate::error::{PackError, PackResult};

/// Pre-allocation cap for inflate buffers, independent of declared sizes.
const MAX_PREALLOC: u64 = 1 << 20;

/// Type tag of a pack entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Commit,
    Tree,
    Blob,
    Tag,
    OfsDelta,
    RefDelta,
}

impl EntryKind {
    /// Parse the 3-bit type field. 0 and 5 are reserved.
    pub fn from_type_bits(bits: u8) -> Option<Self> {
        match bits {
            1 => Some(Self::Commit),
            2 => Some(Self::Tree),
            3 => Some(Self::Blob),
            4 => Some(Self::Tag),
            6 => Some(Self::OfsDelta),
            7 => Some(Self::RefDelta),
            _ => None,
        }
    }

    pub fn type_bits(&self) -> u8 {
        match self {
            Self::Commit => 1,
            Self::Tree => 2,
            Self::Blob => 3,
            Self::Tag => 4,
            Self::OfsDelta => 6,
            Self::RefDelta => 7,
        }
    }

    pub fn from_object_kind(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Blob => Self::Blob,
            ObjectKind::Tree => Self::Tree,
            ObjectKind::Commit => Self::Commit,
        }
    }

    pub fn is_delta(&self) -> bool {
        matches!(self, Self::OfsDelta | Self::RefDelta)
    }

    /// The object kind of a non-delta entry.
    ///
    /// Tag objects are not modelled and report [`PackError::Unsupported`];
    /// delta entries have no kind of their own and report a format error.
    pub fn object_kind(&self, offset: u64) -> PackResult<ObjectKind> {
        match self {
            Self::Commit => Ok(ObjectKind::Commit),
            Self::Tree => Ok(ObjectKind::Tree),
            Self::Blob => Ok(ObjectKind::Blob),
            Self::Tag => Err(PackError::Unsupported(format!(
                "tag object at offset {offset}"
            ))),
            Self::OfsDelta | Self::RefDelta => Err(PackError::format(
                offset,
                "delta entry has no object kind before resolution",
            )),
        }
    }
}

/// Where a delta entry's base lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeltaBase {
    /// Absolute offset of the base entry in the same pack.
    Offset(u64),
    /// Base named by id, in this pack or another.
    Ref(ObjectId),
}

/// A parsed entry header, positioned at its compressed payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackEntry {
    /// Offset of the first header byte.
    pub offset: u64,
    pub kind: EntryKind,
    /// Inflated payload size: object content, or delta instructions.
    pub size: u64,
    pub base: Option<DeltaBase>,
    /// Offset of the zlib stream.
    pub data_offset: u64,
}

impl PackEntry {
    /// Parse the entry header starting at `offset`.
    pub fn parse(data: &[u8], offset: u64) -> PackResult<Self> {
        let start = usize::try_from(offset)
            .ok()
            .filter(|&pos| pos < data.len())
            .ok_or_else(|| PackError::format(offset, "entry offset beyond pack data"))?;
        let mut cursor = ByteCursor::at(data, start);

        let mut byte = cursor.read_u8()?;
        let type_bits = (byte >> 4) & 0x07;
        let kind = EntryKind::from_type_bits(type_bits)
            .ok_or(PackError::UnknownObjectType { offset, type_bits })?;

        let mut size = u64::from(byte & 0x0f);
        let mut shift = 4u32;
        while byte & 0x80 != 0 {
            byte = cursor.read_u8()?;
            let bits = u64::from(byte & 0x7f);
            if shift >= 64 || (shift > 57 && bits >> (64 - shift) != 0) {
                return Err(PackError::format(offset, "entry size overflows 64 bits"));
            }
            size |= bits << shift;
            shift += 7;
        }

        let base = match kind {
            EntryKind::OfsDelta => {
                let distance = read_ofs_distance(&mut cursor, offset)?;
                if distance > offset {
                    return Err(PackError::format(
                        offset,
                        format!("delta base distance {distance} reaches before the pack start"),
                    ));
                }
                Some(DeltaBase::Offset(offset - distance))
            }
            EntryKind::RefDelta => Some(DeltaBase::Ref(cursor.read_object_id()?)),
            _ => None,
        };

        Ok(Self {
            offset,
            kind,
            size,
            base,
            data_offset: cursor.position() as u64,
        })
    }

    /// Inflate the payload. Returns the bytes and the compressed length.
    ///
    /// The stream must inflate to exactly [`PackEntry::size`] bytes.
    pub fn inflate(&self, data: &[u8]) -> PackResult<(Vec<u8>, usize)> {
        let start = usize::try_from(self.data_offset)
            .ok()
            .filter(|&pos| pos <= data.len())
            .ok_or_else(|| PackError::format(self.offset, "payload offset beyond pack data"))?;

        let mut decoder = ZlibDecoder::new(&data[start..]);
        let mut out = Vec::with_capacity(self.size.min(MAX_PREALLOC) as usize);
        // One byte past the declared size is enough to detect an overrun.
        (&mut decoder)
            .take(self.size.saturating_add(1))
            .read_to_end(&mut out)
            .map_err(|e| PackError::format(self.offset, format!("inflate failed: {e}")))?;

        let actual = out.len() as u64;
        if actual > self.size {
            return Err(PackError::format(
                self.offset,
                format!("entry inflates past its declared {} bytes", self.size),
            ));
        }
        if actual < self.size {
            return Err(PackError::format(
                self.offset,
                format!("entry declares {} bytes but inflates to {actual}", self.size),
            ));
        }
        Ok((out, decoder.total_in() as usize))
    }

    /// Length of the header, including any delta base reference.
    pub fn header_len(&self) -> usize {
        (self.data_offset - self.offset) as usize
    }
}

/// Decode an ofs-delta distance: big-endian 7-bit groups where each
/// continuation adds one before shifting, so every distance has exactly one
/// encoding.
fn read_ofs_distance(cursor: &mut ByteCursor<'_>, offset: u64) -> PackResult<u64> {
    let mut byte = cursor.read_u8()?;
    let mut distance = u64::from(byte & 0x7f);
    while byte & 0x80 != 0 {
        byte = cursor.read_u8()?;
        distance = distance
            .checked_add(1)
            .and_then(|d| d.checked_mul(128))
            .map(|d| d | u64::from(byte & 0x7f))
            .ok_or_else(|| PackError::format(offset, "delta base distance overflows 64 bits"))?;
    }
    Ok(distance)
}

/// Encode an entry header for `kind` with inflated `size`.
pub fn encode_entry_header(kind: EntryKind, size: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    let mut byte = (kind.type_bits() << 4) | (size & 0x0f) as u8;
    let mut rest = size >> 4;
    while rest != 0 {
        out.push(byte | 0x80);
        byte = (rest & 0x7f) as u8;
        rest >>= 7;
    }
    out.push(byte);
    out
}

/// Encode an ofs-delta distance.
pub fn encode_ofs_distance(mut distance: u64) -> Vec<u8> {
    let mut out = vec![(distance & 0x7f) as u8];
    distance >>= 7;
    while distance != 0 {
        distance -= 1;
        out.push(0x80 | (distance & 0x7f) as u8);
        distance >>= 7;
    }
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use odb_types::Truncated;
    use proptest::prelude::*;
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn type_bits_roundtrip() {
        for bits in 0u8..8 {
            match EntryKind::from_type_bits(bits) {
                Some(kind) => assert_eq!(kind.type_bits(), bits),
                None => assert!(bits == 0 || bits == 5),
            }
        }
    }

    #[test]
    fn object_kinds() {
        assert_eq!(EntryKind::Blob.object_kind(0).unwrap(), ObjectKind::Blob);
        assert_eq!(EntryKind::from_object_kind(ObjectKind::Tree), EntryKind::Tree);
        assert!(matches!(
            EntryKind::Tag.object_kind(12),
            Err(PackError::Unsupported(_))
        ));
        assert!(EntryKind::RefDelta.is_delta());
        assert!(!EntryKind::Commit.is_delta());
    }

    #[test]
    fn single_byte_header() {
        // blob, size 11
        let data = [0u8, 0, 0, 0x3b];
        let entry = PackEntry::parse(&data, 3).unwrap();
        assert_eq!(entry.kind, EntryKind::Blob);
        assert_eq!(entry.size, 11);
        assert_eq!(entry.header_len(), 1);
        assert_eq!(entry.base, None);
    }

    #[test]
    fn multi_byte_size() {
        // commit, size = 0x5 | (0x12 << 4) = 293
        let data = [0x95, 0x12];
        let entry = PackEntry::parse(&data, 0).unwrap();
        assert_eq!(entry.kind, EntryKind::Commit);
        assert_eq!(entry.size, 293);
        assert_eq!(entry.data_offset, 2);
    }

    #[test]
    fn reserved_types_rejected() {
        for first in [0x05u8, 0x55] {
            let err = PackEntry::parse(&[first], 0).unwrap_err();
            assert!(matches!(err, PackError::UnknownObjectType { offset: 0, .. }));
        }
    }

    #[test]
    fn truncated_header() {
        let err = PackEntry::parse(&[0xb5], 0).unwrap_err();
        assert!(matches!(err, PackError::Truncated(Truncated { .. })));
    }

    #[test]
    fn offset_past_end() {
        let err = PackEntry::parse(&[0x35], 1).unwrap_err();
        assert!(matches!(err, PackError::Format { offset: 1, .. }));
    }

    #[test]
    fn ofs_delta_base() {
        let mut data = vec![0u8; 200];
        data.push(0x65); // ofs-delta, size 5
        data.extend(encode_ofs_distance(190));
        let entry = PackEntry::parse(&data, 200).unwrap();
        assert_eq!(entry.kind, EntryKind::OfsDelta);
        assert_eq!(entry.base, Some(DeltaBase::Offset(10)));
    }

    #[test]
    fn ofs_delta_before_pack_start() {
        let mut data = vec![0u8; 4];
        data.push(0x65);
        data.extend(encode_ofs_distance(5));
        let err = PackEntry::parse(&data, 4).unwrap_err();
        assert!(matches!(err, PackError::Format { offset: 4, .. }));
    }

    #[test]
    fn ref_delta_base() {
        let base = ObjectId::from_hash([0x42; 20]);
        let mut data = vec![0x75];
        data.extend_from_slice(base.as_bytes());
        let entry = PackEntry::parse(&data, 0).unwrap();
        assert_eq!(entry.base, Some(DeltaBase::Ref(base)));
        assert_eq!(entry.header_len(), 21);

        let err = PackEntry::parse(&data[..10], 0).unwrap_err();
        assert!(matches!(err, PackError::Truncated(_)));
    }

    #[test]
    fn known_distance_encodings() {
        assert_eq!(encode_ofs_distance(0), vec![0x00]);
        assert_eq!(encode_ofs_distance(127), vec![0x7f]);
        assert_eq!(encode_ofs_distance(128), vec![0x80, 0x00]);
        assert_eq!(encode_ofs_distance(16511), vec![0xff, 0x7f]);
        assert_eq!(encode_ofs_distance(16512), vec![0x80, 0x80, 0x00]);
    }

    #[test]
    fn inflate_checks_size() {
        let payload = b"hello pack";
        let mut data = encode_entry_header(EntryKind::Blob, payload.len() as u64);
        let compressed = zlib(payload);
        data.extend_from_slice(&compressed);
        data.extend_from_slice(b"trailing entry bytes");

        let entry = PackEntry::parse(&data, 0).unwrap();
        let (out, consumed) = entry.inflate(&data).unwrap();
        assert_eq!(out, payload);
        assert_eq!(consumed, compressed.len());

        let mut short = encode_entry_header(EntryKind::Blob, 4);
        short.extend_from_slice(&compressed);
        let entry = PackEntry::parse(&short, 0).unwrap();
        assert!(matches!(entry.inflate(&short), Err(PackError::Format { .. })));

        let mut long = encode_entry_header(EntryKind::Blob, 64);
        long.extend_from_slice(&compressed);
        let entry = PackEntry::parse(&long, 0).unwrap();
        assert!(matches!(entry.inflate(&long), Err(PackError::Format { .. })));
    }

    #[test]
    fn corrupt_stream_is_format_error() {
        let mut data = encode_entry_header(EntryKind::Blob, 3);
        data.extend_from_slice(b"\x00\x01\x02\x03");
        let entry = PackEntry::parse(&data, 0).unwrap();
        assert!(matches!(entry.inflate(&data), Err(PackError::Format { .. })));
    }

    proptest! {
        #[test]
        fn header_roundtrip(
            bits in prop::sample::select(vec![1u8, 2, 3, 4]),
            size in any::<u64>(),
        ) {
            let kind = EntryKind::from_type_bits(bits).unwrap();
            let data = encode_entry_header(kind, size);
            let entry = PackEntry::parse(&data, 0).unwrap();
            prop_assert_eq!(entry.kind, kind);
            prop_assert_eq!(entry.size, size);
            prop_assert_eq!(entry.header_len(), data.len());
        }

        #[test]
        fn distance_roundtrip(distance in 0u64..(1 << 56)) {
            let encoded = encode_ofs_distance(distance);
            let mut cursor = ByteCursor::new(&encoded);
            prop_assert_eq!(read_ofs_distance(&mut cursor, u64::MAX).unwrap(), distance);
            prop_assert!(cursor.is_empty());
        }
    }
}
