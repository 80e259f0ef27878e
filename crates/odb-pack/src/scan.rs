//! Sequential pack scanning and index construction.
//!
//! Entries carry no length prefix: the end of each zlib stream locates the
//! next entry, so a scan must inflate every payload in order.

use std::collections::HashMap;

use bytes::Bytes;
use odb_crypto::{split_trailer, verify_trailer, CHECKSUM_LEN};
use odb_types::{ObjectId, Truncated};
use tracing::{debug, info};

use crate::config::PackConfig;
use crate::entry::PackEntry;
use crate::error::{PackError, PackResult};
use crate::index::PackIndex;
use crate::reader::{PackHeader, PackReader};
use crate::traits::BaseProvider;

/// One entry found by a sequential scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannedEntry {
    pub entry: PackEntry,
    /// Header, base reference and compressed payload, in bytes.
    pub packed_len: usize,
    /// CRC32 over those packed bytes, as recorded in the index.
    pub crc32: u32,
}

/// Iterates a pack's entries in file order.
///
/// Stops after the first error, since the next entry cannot be located
/// past a corrupt one. After the declared number of entries, any bytes
/// left before the trailer are reported as a format error.
#[derive(Debug)]
pub struct PackScanner<'a> {
    body: &'a [u8],
    header: PackHeader,
    next: u64,
    remaining: u32,
    done: bool,
}

impl<'a> PackScanner<'a> {
    pub fn new(pack: &'a [u8]) -> PackResult<Self> {
        let header = PackHeader::parse(pack)?;
        let body = split_trailer(pack)
            .map(|(body, _)| body)
            .filter(|body| body.len() >= PackHeader::LEN)
            .ok_or(Truncated {
                offset: PackHeader::LEN,
                needed: CHECKSUM_LEN,
                available: pack.len().saturating_sub(PackHeader::LEN),
            })?;
        Ok(Self {
            body,
            header,
            next: PackHeader::LEN as u64,
            remaining: header.object_count,
            done: false,
        })
    }

    pub fn header(&self) -> PackHeader {
        self.header
    }

    fn scan_one(&mut self) -> PackResult<ScannedEntry> {
        let entry = PackEntry::parse(self.body, self.next)?;
        let (_, compressed_len) = entry.inflate(self.body)?;
        let end = entry.data_offset as usize + compressed_len;
        let packed = &self.body[entry.offset as usize..end];
        self.next = end as u64;
        Ok(ScannedEntry {
            packed_len: packed.len(),
            crc32: crc32fast::hash(packed),
            entry,
        })
    }
}

impl Iterator for PackScanner<'_> {
    type Item = PackResult<ScannedEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.remaining == 0 {
            self.done = true;
            let leftover = self.body.len() as u64 - self.next;
            if leftover != 0 {
                return Some(Err(PackError::format(
                    self.next,
                    format!("{leftover} bytes after the last entry"),
                )));
            }
            return None;
        }
        let result = self.scan_one();
        match result {
            Ok(_) => self.remaining -= 1,
            Err(_) => self.done = true,
        }
        Some(result)
    }
}

/// Bases resolved so far while indexing, all in the pack being indexed.
struct ResolvedBases<'r> {
    reader: &'r PackReader,
    offsets: HashMap<ObjectId, u64>,
}

impl BaseProvider for ResolvedBases<'_> {
    fn locate_base(&self, id: &ObjectId) -> Option<(&PackReader, u64)> {
        self.offsets.get(id).map(|&offset| (self.reader, offset))
    }
}

/// Build a v2 index for a pack that has none.
///
/// Every entry is resolved to learn its id. Ref-deltas may name bases that
/// appear later in the pack, so unresolved entries are retried until a pass
/// makes no progress; any left over are dangling. The pack trailer is
/// always verified first.
pub fn index_pack(pack: &[u8], config: &PackConfig) -> PackResult<PackIndex> {
    if !verify_trailer(pack) {
        return Err(PackError::ChecksumMismatch { what: "pack" });
    }
    let scanned = PackScanner::new(pack)?.collect::<PackResult<Vec<_>>>()?;

    let reader = PackReader::unindexed(Bytes::copy_from_slice(pack), config.clone())?;
    let mut bases = ResolvedBases {
        reader: &reader,
        offsets: HashMap::with_capacity(scanned.len()),
    };
    let mut entries = Vec::with_capacity(scanned.len());
    let mut pending: Vec<&ScannedEntry> = scanned.iter().collect();
    let mut passes = 0usize;

    while !pending.is_empty() {
        passes += 1;
        let before = pending.len();
        let mut deferred = Vec::new();
        let mut dangling = None;
        for scanned in pending {
            let offset = scanned.entry.offset;
            match reader.read_at(offset, &bases) {
                Ok(obj) => {
                    bases.offsets.insert(obj.id(), offset);
                    entries.push((obj.id(), scanned.crc32, offset));
                }
                Err(PackError::DanglingReference(base)) => {
                    dangling = Some(base);
                    deferred.push(scanned);
                }
                Err(e) => return Err(e),
            }
        }
        if deferred.len() == before {
            if let Some(base) = dangling {
                return Err(PackError::DanglingReference(base));
            }
        }
        pending = deferred;
    }

    debug!(objects = entries.len(), passes, "resolved pack entries");
    let index = PackIndex::build(entries, *reader.checksum())?;
    info!(pack = %reader.name(), objects = index.object_count(), "indexed pack");
    Ok(index)
}
