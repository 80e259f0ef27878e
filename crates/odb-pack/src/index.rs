use std::fmt;

use odb_crypto::{compute_trailer, split_trailer, Checksum, CHECKSUM_LEN};
use odb_types::{ByteCursor, ObjectId, Truncated, OID_LEN};

use crate::error::{PackError, PackResult};

/// Magic bytes opening a v2 index (`\377tOc`).
pub const INDEX_MAGIC: [u8; 4] = [0xff, b't', b'O', b'c'];
pub const INDEX_VERSION: u32 = 2;

const FAN_OUT_LEN: usize = 256;
/// Offsets with this bit set index into the 64-bit offset table.
const LARGE_OFFSET_FLAG: u32 = 0x8000_0000;
/// Bytes per object across the id, CRC and 32-bit offset tables.
const PER_OBJECT_LEN: usize = OID_LEN + 4 + 4;

/// A parsed pack index (version 2).
///
/// Layout:
/// - 4-byte magic, 4-byte version
/// - fan-out table: 256 big-endian counts of ids whose first byte is `<= i`
/// - sorted object ids
/// - CRC32 of each entry's packed bytes (parallel)
/// - 32-bit offsets (parallel); the MSB marks an index into the next table
/// - 64-bit offsets for entries beyond 2 GiB
/// - pack checksum, then the checksum of everything above
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackIndex {
    fan_out: [u32; FAN_OUT_LEN],
    object_ids: Vec<ObjectId>,
    crc32s: Vec<u32>,
    offsets: Vec<u64>,
    pack_checksum: Checksum,
    index_checksum: Checksum,
}

/// Tables read after the header, before the checksums.
struct Tables {
    fan_out: [u32; FAN_OUT_LEN],
    object_ids: Vec<ObjectId>,
    crc32s: Vec<u32>,
    offsets: Vec<u64>,
}

impl PackIndex {
    /// Parse a complete index file.
    ///
    /// Parsing runs in two stages: the header is validated first, then the
    /// tables are loaded. Any bytes after the index checksum are an error.
    pub fn parse(data: &[u8]) -> PackResult<Self> {
        let mut cursor = ByteCursor::new(data);
        validate_header(&mut cursor)?;
        let tables = load_tables(&mut cursor)?;
        let pack_checksum = cursor.read_array::<CHECKSUM_LEN>()?;
        let index_checksum = cursor.read_array::<CHECKSUM_LEN>()?;
        if !cursor.is_empty() {
            return Err(PackError::format(
                cursor.position() as u64,
                format!("{} unexpected bytes after the index checksum", cursor.remaining()),
            ));
        }

        Ok(Self {
            fan_out: tables.fan_out,
            object_ids: tables.object_ids,
            crc32s: tables.crc32s,
            offsets: tables.offsets,
            pack_checksum,
            index_checksum,
        })
    }

    /// Build an index from `(id, crc32, offset)` entries.
    ///
    /// Entries may come in any order. Duplicate ids are rejected.
    pub fn build(
        mut entries: Vec<(ObjectId, u32, u64)>,
        pack_checksum: Checksum,
    ) -> PackResult<Self> {
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(PackError::format(
                pair[1].2,
                format!("object {} appears twice in the pack", pair[1].0),
            ));
        }

        let mut fan_out = [0u32; FAN_OUT_LEN];
        for (id, _, _) in &entries {
            fan_out[id.first_byte() as usize] += 1;
        }
        for i in 1..FAN_OUT_LEN {
            fan_out[i] += fan_out[i - 1];
        }

        let mut index = Self {
            fan_out,
            object_ids: entries.iter().map(|e| e.0).collect(),
            crc32s: entries.iter().map(|e| e.1).collect(),
            offsets: entries.iter().map(|e| e.2).collect(),
            pack_checksum,
            index_checksum: [0; CHECKSUM_LEN],
        };
        index.index_checksum = compute_trailer(&index.body_bytes());
        Ok(index)
    }

    /// Serialize as a v2 index file.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = self.body_bytes();
        buf.extend_from_slice(&self.index_checksum);
        buf
    }

    /// Everything except the trailing index checksum.
    fn body_bytes(&self) -> Vec<u8> {
        let count = self.object_ids.len();
        let mut buf =
            Vec::with_capacity(8 + FAN_OUT_LEN * 4 + count * PER_OBJECT_LEN + 2 * CHECKSUM_LEN);
        buf.extend_from_slice(&INDEX_MAGIC);
        buf.extend_from_slice(&INDEX_VERSION.to_be_bytes());
        for count in &self.fan_out {
            buf.extend_from_slice(&count.to_be_bytes());
        }
        for id in &self.object_ids {
            buf.extend_from_slice(id.as_bytes());
        }
        for crc in &self.crc32s {
            buf.extend_from_slice(&crc.to_be_bytes());
        }
        let mut large = Vec::new();
        for &offset in &self.offsets {
            if offset < u64::from(LARGE_OFFSET_FLAG) {
                buf.extend_from_slice(&(offset as u32).to_be_bytes());
            } else {
                let slot = LARGE_OFFSET_FLAG | large.len() as u32;
                buf.extend_from_slice(&slot.to_be_bytes());
                large.push(offset);
            }
        }
        for offset in large {
            buf.extend_from_slice(&offset.to_be_bytes());
        }
        buf.extend_from_slice(&self.pack_checksum);
        buf
    }

    /// Pack offset of `id`, if present.
    pub fn lookup(&self, id: &ObjectId) -> Option<u64> {
        self.position(id).map(|pos| self.offsets[pos])
    }

    /// `(offset, crc32)` of `id`, if present.
    pub fn lookup_entry(&self, id: &ObjectId) -> Option<(u64, u32)> {
        self.position(id).map(|pos| (self.offsets[pos], self.crc32s[pos]))
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.position(id).is_some()
    }

    /// Position of `id` in the sorted tables: fan-out narrows the range to
    /// one first-byte bucket, then binary search.
    fn position(&self, id: &ObjectId) -> Option<usize> {
        let bucket = id.first_byte() as usize;
        let start = if bucket == 0 {
            0
        } else {
            self.fan_out[bucket - 1] as usize
        };
        let end = self.fan_out[bucket] as usize;
        self.object_ids[start..end]
            .binary_search(id)
            .ok()
            .map(|pos| start + pos)
    }

    pub fn object_count(&self) -> usize {
        self.object_ids.len()
    }

    /// All ids, ascending.
    pub fn object_ids(&self) -> &[ObjectId] {
        &self.object_ids
    }

    /// `(id, offset, crc32)` for every entry, in id order.
    pub fn entries(&self) -> impl Iterator<Item = (ObjectId, u64, u32)> + '_ {
        self.object_ids
            .iter()
            .zip(&self.offsets)
            .zip(&self.crc32s)
            .map(|((id, offset), crc)| (*id, *offset, *crc))
    }

    pub fn fan_out(&self) -> &[u32; FAN_OUT_LEN] {
        &self.fan_out
    }

    /// Checksum of the pack this index describes.
    pub fn pack_checksum(&self) -> &Checksum {
        &self.pack_checksum
    }

    pub fn index_checksum(&self) -> &Checksum {
        &self.index_checksum
    }

    /// Check both trailers: the index file's own checksum over its bytes,
    /// and the pack checksum recorded here against the pack's trailer and
    /// content.
    pub fn verify(&self, index_bytes: &[u8], pack_bytes: &[u8]) -> bool {
        self.verify_index(index_bytes) && self.verify_pack(pack_bytes)
    }

    pub fn verify_index(&self, index_bytes: &[u8]) -> bool {
        matches_trailer(index_bytes, &self.index_checksum)
    }

    pub fn verify_pack(&self, pack_bytes: &[u8]) -> bool {
        matches_trailer(pack_bytes, &self.pack_checksum)
    }
}

impl fmt::Display for PackIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pack index v{INDEX_VERSION}: {} objects", self.object_count())
    }
}

fn matches_trailer(data: &[u8], expected: &Checksum) -> bool {
    match split_trailer(data) {
        Some((body, trailer)) => trailer == expected && compute_trailer(body) == *expected,
        None => false,
    }
}

fn validate_header(cursor: &mut ByteCursor<'_>) -> PackResult<()> {
    let magic = cursor.read_array::<4>()?;
    if magic != INDEX_MAGIC {
        // v1 indexes have no magic and open straight into the fan-out table.
        return Err(PackError::Unsupported(
            "pack index version 1 (no v2 magic)".into(),
        ));
    }
    let version = cursor.read_u32_be()?;
    if version != INDEX_VERSION {
        return Err(PackError::Unsupported(format!("pack index version {version}")));
    }
    Ok(())
}

fn load_tables(cursor: &mut ByteCursor<'_>) -> PackResult<Tables> {
    let mut fan_out = [0u32; FAN_OUT_LEN];
    let mut previous = 0u32;
    for (bucket, slot) in fan_out.iter_mut().enumerate() {
        let at = cursor.position() as u64;
        let count = cursor.read_u32_be()?;
        if count < previous {
            return Err(PackError::format(
                at,
                format!("fan-out decreases at bucket {bucket:#04x}"),
            ));
        }
        *slot = count;
        previous = count;
    }

    let count = fan_out[FAN_OUT_LEN - 1] as usize;
    // Refuse to allocate for tables the input cannot hold.
    let needed = count
        .checked_mul(PER_OBJECT_LEN)
        .and_then(|n| n.checked_add(2 * CHECKSUM_LEN))
        .unwrap_or(usize::MAX);
    if cursor.remaining() < needed {
        return Err(Truncated {
            offset: cursor.position(),
            needed,
            available: cursor.remaining(),
        }
        .into());
    }

    let mut object_ids: Vec<ObjectId> = Vec::with_capacity(count);
    for i in 0..count {
        let at = cursor.position() as u64;
        let id = cursor.read_object_id()?;
        if let Some(prev) = object_ids.last() {
            if *prev >= id {
                return Err(PackError::format(
                    at,
                    format!("object ids not strictly ascending at entry {i}"),
                ));
            }
        }
        let bucket = id.first_byte() as usize;
        let bucket_start = if bucket == 0 { 0 } else { fan_out[bucket - 1] as usize };
        if i < bucket_start || i >= fan_out[bucket] as usize {
            return Err(PackError::format(
                at,
                format!("object {id} lies outside its fan-out bucket"),
            ));
        }
        object_ids.push(id);
    }

    let mut crc32s = Vec::with_capacity(count);
    for _ in 0..count {
        crc32s.push(cursor.read_u32_be()?);
    }

    let offsets_at = cursor.position() as u64;
    let mut raw_offsets = Vec::with_capacity(count);
    for _ in 0..count {
        raw_offsets.push(cursor.read_u32_be()?);
    }

    // The 64-bit table has no explicit length: it must cover every slot the
    // 32-bit table refers to.
    let large_len = raw_offsets
        .iter()
        .filter(|&&raw| raw & LARGE_OFFSET_FLAG != 0)
        .map(|&raw| (raw & !LARGE_OFFSET_FLAG) as usize + 1)
        .max()
        .unwrap_or(0);
    let needed = large_len * 8 + 2 * CHECKSUM_LEN;
    if cursor.remaining() < needed {
        return Err(Truncated {
            offset: cursor.position(),
            needed,
            available: cursor.remaining(),
        }
        .into());
    }
    let mut large = Vec::with_capacity(large_len);
    for _ in 0..large_len {
        large.push(cursor.read_u64_be()?);
    }

    let mut offsets = Vec::with_capacity(count);
    for (i, raw) in raw_offsets.into_iter().enumerate() {
        if raw & LARGE_OFFSET_FLAG == 0 {
            offsets.push(u64::from(raw));
        } else {
            let slot = (raw & !LARGE_OFFSET_FLAG) as usize;
            let offset = large.get(slot).copied().ok_or_else(|| {
                PackError::format(
                    offsets_at + 4 * i as u64,
                    format!("64-bit offset slot {slot} out of range"),
                )
            })?;
            offsets.push(offset);
        }
    }

    Ok(Tables {
        fan_out,
        object_ids,
        crc32s,
        offsets,
    })
}
