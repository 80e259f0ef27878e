//! Synthetic pack construction for tests.
//!
//! Available to this crate's tests and, through the `test-support` feature,
//! to dependent crates. The builder writes exactly what it is told,
//! including malformed chains and ids that do not match content.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use odb_crypto::compute_trailer;
use odb_store::{compute_id, ObjectKind};
use odb_types::ObjectId;

use crate::config::PackConfig;
use crate::entry::{encode_entry_header, encode_ofs_distance, EntryKind};
use crate::error::PackResult;
use crate::index::PackIndex;
use crate::reader::{PackHeader, PackReader};

/// Builds a pack and its index entry by entry.
#[derive(Debug)]
pub struct PackBuilder {
    version: u32,
    entries: Vec<u8>,
    index: Vec<(ObjectId, u32, u64)>,
}

impl Default for PackBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PackBuilder {
    pub fn new() -> Self {
        Self {
            version: 2,
            entries: Vec::new(),
            index: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Offset the next entry will start at.
    pub fn next_offset(&self) -> u64 {
        (PackHeader::LEN + self.entries.len()) as u64
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Add a non-delta object under its real id.
    pub fn add_object(&mut self, kind: ObjectKind, content: &[u8]) -> u64 {
        self.add_object_as(kind, content, compute_id(kind, content))
    }

    /// Add a non-delta object, indexed under `id` whether or not it matches.
    pub fn add_object_as(&mut self, kind: ObjectKind, content: &[u8], id: ObjectId) -> u64 {
        self.push(EntryKind::from_object_kind(kind), &[], content, id)
    }

    /// Add a tag entry; tags are stored but never decoded.
    pub fn add_tag(&mut self, content: &[u8], id: ObjectId) -> u64 {
        self.push(EntryKind::Tag, &[], content, id)
    }

    /// Add an ofs-delta against the entry at `base_offset`. `id` is the
    /// resolved object's id.
    pub fn add_ofs_delta(&mut self, base_offset: u64, delta: &[u8], id: ObjectId) -> u64 {
        let distance = self.next_offset() - base_offset;
        self.push(EntryKind::OfsDelta, &encode_ofs_distance(distance), delta, id)
    }

    /// Add an ofs-delta whose base is itself.
    pub fn add_self_ofs_delta(&mut self, delta: &[u8], id: ObjectId) -> u64 {
        self.push(EntryKind::OfsDelta, &encode_ofs_distance(0), delta, id)
    }

    /// Add a ref-delta naming `base` by id.
    pub fn add_ref_delta(&mut self, base: ObjectId, delta: &[u8], id: ObjectId) -> u64 {
        self.push(EntryKind::RefDelta, base.as_bytes(), delta, id)
    }

    fn push(&mut self, kind: EntryKind, base: &[u8], payload: &[u8], id: ObjectId) -> u64 {
        let offset = self.next_offset();
        let mut raw = encode_entry_header(kind, payload.len() as u64);
        raw.extend_from_slice(base);
        raw.extend_from_slice(&zlib(payload));
        self.index.push((id, crc32fast::hash(&raw), offset));
        self.entries.extend_from_slice(&raw);
        offset
    }

    /// Pack bytes with header and trailer, without building an index.
    pub fn pack_bytes(&self) -> Vec<u8> {
        let header = PackHeader {
            version: self.version,
            object_count: self.index.len() as u32,
        };
        let mut pack = header.to_bytes().to_vec();
        pack.extend_from_slice(&self.entries);
        let trailer = compute_trailer(&pack);
        pack.extend_from_slice(&trailer);
        pack
    }

    /// Pack bytes and the matching index.
    ///
    /// # Panics
    ///
    /// If two entries were added under the same id.
    pub fn finish(self) -> (Vec<u8>, PackIndex) {
        let pack = self.pack_bytes();
        let mut checksum = [0u8; 20];
        checksum.copy_from_slice(&pack[pack.len() - 20..]);
        let index =
            PackIndex::build(self.index, checksum).expect("fixture entries have unique ids");
        (pack, index)
    }

    /// Finish into an in-memory reader.
    pub fn into_reader(self, config: PackConfig) -> PackResult<PackReader> {
        let (pack, index) = self.finish();
        PackReader::from_bytes(pack, index, config)
    }

    /// Write `<name>.pack` and `<name>.idx` into `dir`.
    pub fn write_to(self, dir: &Path, name: &str) -> PackResult<(PathBuf, PathBuf)> {
        let (pack, index) = self.finish();
        std::fs::create_dir_all(dir)?;
        let pack_path = dir.join(format!("{name}.pack"));
        let index_path = dir.join(format!("{name}.idx"));
        std::fs::write(&pack_path, pack)?;
        std::fs::write(&index_path, index.to_bytes())?;
        Ok((pack_path, index_path))
    }
}

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    // Writes into a Vec cannot fail.
    encoder.write_all(data).expect("in-memory zlib write");
    encoder.finish().expect("in-memory zlib finish")
}
