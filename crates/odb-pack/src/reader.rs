use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use memmap2::Mmap;
use odb_crypto::{Checksum, CHECKSUM_LEN};
use odb_store::{GitObject, ObjectKind};
use odb_types::{ByteCursor, ObjectId, Truncated};
use tracing::{debug, trace};

use crate::config::PackConfig;
use crate::delta::apply_delta;
use crate::entry::{DeltaBase, PackEntry};
use crate::error::{PackError, PackResult};
use crate::index::PackIndex;
use crate::traits::{BaseProvider, NoExternalBases};

/// Magic bytes opening every pack file.
pub const PACK_MAGIC: [u8; 4] = *b"PACK";

/// The fixed 12-byte pack header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackHeader {
    /// 2 or 3; both share the same entry format.
    pub version: u32,
    pub object_count: u32,
}

impl PackHeader {
    pub const LEN: usize = 12;

    pub fn parse(data: &[u8]) -> PackResult<Self> {
        let mut cursor = ByteCursor::new(data);
        let magic = cursor.read_array::<4>()?;
        if magic != PACK_MAGIC {
            return Err(PackError::InvalidMagic {
                what: "pack",
                expected: "PACK".into(),
                actual: String::from_utf8_lossy(&magic).into_owned(),
            });
        }
        let version = cursor.read_u32_be()?;
        if !(2..=3).contains(&version) {
            return Err(PackError::Unsupported(format!("pack version {version}")));
        }
        let object_count = cursor.read_u32_be()?;
        Ok(Self {
            version,
            object_count,
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[..4].copy_from_slice(&PACK_MAGIC);
        out[4..8].copy_from_slice(&self.version.to_be_bytes());
        out[8..].copy_from_slice(&self.object_count.to_be_bytes());
        out
    }
}

/// Whether a reader's trailer checksums were recomputed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verification {
    Skipped,
    Verified,
}

/// Pack bytes, owned or memory-mapped. Both are read by position only.
enum PackData {
    Owned(Bytes),
    Mapped(Mmap),
}

impl Deref for PackData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Owned(bytes) => bytes,
            Self::Mapped(map) => map,
        }
    }
}

/// Random-access reader over one pack and its index.
///
/// All reads are positioned; the reader holds no cursor state, so a shared
/// `&PackReader` can serve concurrent readers.
pub struct PackReader {
    name: String,
    path: Option<PathBuf>,
    data: PackData,
    header: PackHeader,
    index: PackIndex,
    config: PackConfig,
    verification: Verification,
}

impl fmt::Debug for PackReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackReader")
            .field("name", &self.name)
            .field("header", &self.header)
            .field("bytes", &self.data.len())
            .field("verification", &self.verification)
            .finish_non_exhaustive()
    }
}

impl PackReader {
    /// Wrap in-memory pack bytes with their parsed index.
    pub fn from_bytes(
        pack_data: impl Into<Bytes>,
        index: PackIndex,
        config: PackConfig,
    ) -> PackResult<Self> {
        Self::new(PackData::Owned(pack_data.into()), index, config, None)
    }

    /// Open `<name>.pack`, reading its index from the sibling `<name>.idx`.
    pub fn open(pack_path: &Path, config: PackConfig) -> PackResult<Self> {
        Self::open_with_index(pack_path, &pack_path.with_extension("idx"), config)
    }

    /// Open a pack with an index at an explicit path.
    ///
    /// The pack is memory-mapped. With `verify_checksums` set, both trailer
    /// checksums are recomputed before the reader is returned.
    pub fn open_with_index(
        pack_path: &Path,
        index_path: &Path,
        config: PackConfig,
    ) -> PackResult<Self> {
        let index_bytes = std::fs::read(index_path)?;
        let index = PackIndex::parse(&index_bytes)?;

        let file = File::open(pack_path)?;
        // SAFETY: pack files are never modified in place once written.
        let map = unsafe { Mmap::map(&file)? };

        let mut reader = Self::new(PackData::Mapped(map), index, config, Some(pack_path))?;
        if reader.config.verify_checksums {
            reader.verify_with(&index_bytes)?;
        }
        debug!(
            pack = %reader.name,
            objects = reader.object_count(),
            verification = ?reader.verification,
            "opened pack"
        );
        Ok(reader)
    }

    /// A reader with an empty index, for building the real one. Same-pack
    /// ref-delta bases are found only through the caller's provider.
    pub(crate) fn unindexed(pack_data: Bytes, config: PackConfig) -> PackResult<Self> {
        let data = PackData::Owned(pack_data);
        let header = PackHeader::parse(&data)?;
        check_min_len(&data)?;
        let mut trailer = [0u8; CHECKSUM_LEN];
        trailer.copy_from_slice(&data[data.len() - CHECKSUM_LEN..]);
        Ok(Self {
            name: format!("pack-{}", hex::encode(trailer)),
            path: None,
            data,
            header,
            index: PackIndex::build(Vec::new(), trailer)?,
            config,
            verification: Verification::Skipped,
        })
    }

    fn new(
        data: PackData,
        index: PackIndex,
        config: PackConfig,
        path: Option<&Path>,
    ) -> PackResult<Self> {
        let header = PackHeader::parse(&data)?;
        check_min_len(&data)?;
        if header.object_count as usize != index.object_count() {
            return Err(PackError::format(
                8,
                format!(
                    "pack holds {} objects but its index lists {}",
                    header.object_count,
                    index.object_count()
                ),
            ));
        }
        if data[data.len() - CHECKSUM_LEN..] != index.pack_checksum()[..] {
            return Err(PackError::ChecksumMismatch {
                what: "pack trailer against index",
            });
        }

        let name = path
            .and_then(|p| p.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("pack-{}", hex::encode(index.pack_checksum())));

        Ok(Self {
            name,
            path: path.map(Path::to_path_buf),
            data,
            header,
            index,
            config,
            verification: Verification::Skipped,
        })
    }

    /// Recompute the index and pack checksums against `index_bytes` and the
    /// pack contents.
    pub fn verify_with(&mut self, index_bytes: &[u8]) -> PackResult<()> {
        if !self.index.verify_index(index_bytes) {
            return Err(PackError::ChecksumMismatch { what: "index" });
        }
        if !self.index.verify_pack(&self.data) {
            return Err(PackError::ChecksumMismatch { what: "pack" });
        }
        self.verification = Verification::Verified;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn header(&self) -> PackHeader {
        self.header
    }

    pub fn index(&self) -> &PackIndex {
        &self.index
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    pub fn verification(&self) -> Verification {
        self.verification
    }

    pub fn checksum(&self) -> &Checksum {
        self.index.pack_checksum()
    }

    pub fn object_count(&self) -> usize {
        self.index.object_count()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.index.contains(id)
    }

    pub fn object_ids(&self) -> &[ObjectId] {
        self.index.object_ids()
    }

    /// Raw pack bytes including the header and trailer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Entry region: everything between the trailer and the end of file.
    fn body(&self) -> &[u8] {
        &self.data[..self.data.len() - CHECKSUM_LEN]
    }

    /// Parse the entry header at `offset`.
    pub fn entry_at(&self, offset: u64) -> PackResult<PackEntry> {
        if offset < PackHeader::LEN as u64 {
            return Err(PackError::format(offset, "entry offset inside the pack header"));
        }
        PackEntry::parse(self.body(), offset)
    }

    /// Read `id` from this pack alone. Ref-deltas whose base is in another
    /// pack report [`PackError::DanglingReference`].
    pub fn read_object(&self, id: &ObjectId) -> PackResult<Option<GitObject>> {
        self.read_object_with(id, &NoExternalBases)
    }

    /// Read `id`, locating out-of-pack ref-delta bases through `bases`.
    ///
    /// Returns `Ok(None)` if this pack's index does not list `id`.
    pub fn read_object_with(
        &self,
        id: &ObjectId,
        bases: &dyn BaseProvider,
    ) -> PackResult<Option<GitObject>> {
        let Some((offset, crc)) = self.index.lookup_entry(id) else {
            return Ok(None);
        };
        if self.config.verify_crc {
            self.check_crc(offset, crc)?;
        }
        let obj = self.read_at(offset, bases)?;
        if obj.id() != *id {
            return Err(PackError::HashMismatch {
                expected: *id,
                computed: obj.id(),
            });
        }
        Ok(Some(obj))
    }

    /// Read and resolve the entry at `offset`.
    ///
    /// The object's kind is the kind of the non-delta base at the end of its
    /// chain.
    pub fn read_at(&self, offset: u64, bases: &dyn BaseProvider) -> PackResult<GitObject> {
        let (kind, content) = self.resolve(offset, bases)?;
        Ok(GitObject::new(kind, content))
    }

    /// Compare the CRC32 of the packed bytes at `offset` with `expected`.
    pub fn check_crc(&self, offset: u64, expected: u32) -> PackResult<()> {
        let entry = self.entry_at(offset)?;
        let (_, compressed_len) = entry.inflate(self.body())?;
        let end = entry.data_offset as usize + compressed_len;
        let actual = crc32fast::hash(&self.body()[offset as usize..end]);
        if actual != expected {
            return Err(PackError::CrcMismatch {
                offset,
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Resolve the entry at `start` to a kind and full content.
    ///
    /// Walks base links with an explicit stack of pending deltas, then
    /// applies them from the root base outwards. Every step is counted
    /// against `max_delta_depth`, and every `(pack, offset)` visited is
    /// recorded; exceeding the one or revisiting the other aborts with
    /// [`PackError::RecursionLimit`].
    fn resolve(&self, start: u64, bases: &dyn BaseProvider) -> PackResult<(ObjectKind, Vec<u8>)> {
        let max_depth = self.config.max_delta_depth;
        let mut pending: Vec<(u64, Vec<u8>)> = Vec::new();
        let mut visited: HashSet<(Checksum, u64)> = HashSet::new();
        let mut pack: &PackReader = self;
        let mut offset = start;

        let (kind, mut content) = loop {
            if !visited.insert((*pack.checksum(), offset)) {
                return Err(PackError::RecursionLimit {
                    offset: start,
                    reason: format!("delta chain revisits offset {offset} in {}", pack.name),
                });
            }

            let entry = pack.entry_at(offset)?;
            let Some(base) = entry.base else {
                let kind = entry.kind.object_kind(offset)?;
                let (content, _) = entry.inflate(pack.body())?;
                break (kind, content);
            };

            if pending.len() >= max_depth {
                return Err(PackError::RecursionLimit {
                    offset: start,
                    reason: format!("delta chain longer than {max_depth} links"),
                });
            }
            let (delta, _) = entry.inflate(pack.body())?;
            pending.push((offset, delta));

            match base {
                DeltaBase::Offset(base_offset) => offset = base_offset,
                DeltaBase::Ref(base_id) => {
                    if let Some(base_offset) = pack.index.lookup(&base_id) {
                        offset = base_offset;
                    } else {
                        let (other, base_offset) = bases
                            .locate_base(&base_id)
                            .ok_or(PackError::DanglingReference(base_id))?;
                        trace!(
                            from = %pack.name,
                            to = %other.name,
                            base = %base_id,
                            "ref-delta base in another pack"
                        );
                        pack = other;
                        offset = base_offset;
                    }
                }
            }
        };

        if !pending.is_empty() {
            trace!(
                pack = %self.name,
                offset = start,
                depth = pending.len(),
                "applying delta chain"
            );
        }
        for (delta_offset, delta) in pending.iter().rev() {
            content = apply_delta(&content, delta)
                .map_err(|e| PackError::format(*delta_offset, e.to_string()))?;
        }
        Ok((kind, content))
    }
}

/// A pack must hold at least its header and trailer.
fn check_min_len(data: &[u8]) -> PackResult<()> {
    let min_len = PackHeader::LEN + CHECKSUM_LEN;
    if data.len() < min_len {
        return Err(Truncated {
            offset: PackHeader::LEN,
            needed: CHECKSUM_LEN,
            available: data.len().saturating_sub(PackHeader::LEN),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{encode_delta, DeltaOp};
    use crate::fixture::PackBuilder;
    use odb_store::compute_id;

    fn prefix_delta(base: &[u8], suffix: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut result = base.to_vec();
        result.extend_from_slice(suffix);
        let delta = encode_delta(
            base.len() as u64,
            result.len() as u64,
            &[
                DeltaOp::Copy { offset: 0, size: base.len() as u64 },
                DeltaOp::Insert(suffix.to_vec()),
            ],
        );
        (delta, result)
    }

    fn open(builder: PackBuilder, config: PackConfig) -> PackReader {
        let (pack, index) = builder.finish();
        PackReader::from_bytes(pack, index, config).unwrap()
    }

    #[test]
    fn header_parse() {
        let header = PackHeader::parse(b"PACK\x00\x00\x00\x02\x00\x00\x00\x07").unwrap();
        assert_eq!(header, PackHeader { version: 2, object_count: 7 });
        assert_eq!(PackHeader::parse(&header.to_bytes()).unwrap(), header);
        assert_eq!(PackHeader::parse(b"PACK\x00\x00\x00\x03\x00\x00\x00\x00").unwrap().version, 3);
    }

    #[test]
    fn header_errors() {
        assert!(matches!(
            PackHeader::parse(b"KCAP\x00\x00\x00\x02\x00\x00\x00\x00"),
            Err(PackError::InvalidMagic { what: "pack", .. })
        ));
        assert!(matches!(
            PackHeader::parse(b"PACK\x00\x00\x00\x04\x00\x00\x00\x00"),
            Err(PackError::Unsupported(_))
        ));
        assert!(matches!(PackHeader::parse(b"PACK\x00\x00"), Err(PackError::Truncated(_))));
    }

    #[test]
    fn reads_base_objects() {
        let mut builder = PackBuilder::new();
        builder.add_object(ObjectKind::Blob, b"hello world");
        builder.add_object(ObjectKind::Tree, b"");
        let reader = open(builder, PackConfig::default());

        let blob_id = compute_id(ObjectKind::Blob, b"hello world");
        let obj = reader.read_object(&blob_id).unwrap().unwrap();
        assert_eq!(obj.kind(), ObjectKind::Blob);
        assert_eq!(obj.content(), b"hello world");

        let tree_id = compute_id(ObjectKind::Tree, b"");
        assert_eq!(tree_id.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
        assert_eq!(reader.read_object(&tree_id).unwrap().unwrap().size(), 0);

        assert!(reader.read_object(&ObjectId::from_hash([1; 20])).unwrap().is_none());
        assert_eq!(reader.object_count(), 2);
        assert!(reader.name().starts_with("pack-"));
    }

    #[test]
    fn ofs_delta_chain_takes_base_kind() {
        let base = b"fn main() {}\n".to_vec();
        let (d1, v1) = prefix_delta(&base, b"// one\n");
        let (d2, v2) = prefix_delta(&v1, b"// two\n");

        let mut builder = PackBuilder::new();
        let base_at = builder.add_object(ObjectKind::Blob, &base);
        let v1_at = builder.add_ofs_delta(base_at, &d1, compute_id(ObjectKind::Blob, &v1));
        builder.add_ofs_delta(v1_at, &d2, compute_id(ObjectKind::Blob, &v2));
        let reader = open(builder, PackConfig::default());

        let obj = reader.read_object(&compute_id(ObjectKind::Blob, &v2)).unwrap().unwrap();
        assert_eq!(obj.kind(), ObjectKind::Blob);
        assert_eq!(obj.content(), &v2[..]);
    }

    #[test]
    fn ref_delta_within_pack() {
        let base = b"tree-ish content".to_vec();
        let base_id = compute_id(ObjectKind::Commit, &base);
        let (delta, result) = prefix_delta(&base, b" and more");
        let result_id = compute_id(ObjectKind::Commit, &result);

        let mut builder = PackBuilder::new();
        // Delta first: ref-delta bases may appear later in the pack.
        builder.add_ref_delta(base_id, &delta, result_id);
        builder.add_object(ObjectKind::Commit, &base);
        let reader = open(builder, PackConfig::default());

        let obj = reader.read_object(&result_id).unwrap().unwrap();
        assert_eq!(obj.kind(), ObjectKind::Commit);
        assert_eq!(obj.content(), &result[..]);
    }

    fn chain_of(len: usize) -> (PackBuilder, ObjectId) {
        let mut builder = PackBuilder::new();
        let mut content = b"base".to_vec();
        let mut at = builder.add_object(ObjectKind::Blob, &content);
        let mut id = compute_id(ObjectKind::Blob, &content);
        for i in 0..len {
            let (delta, next) = prefix_delta(&content, format!("+{i}").as_bytes());
            id = compute_id(ObjectKind::Blob, &next);
            at = builder.add_ofs_delta(at, &delta, id);
            content = next;
        }
        (builder, id)
    }

    #[test]
    fn chain_at_depth_limit_resolves() {
        let (builder, tip) = chain_of(4);
        let config = PackConfig {
            max_delta_depth: 4,
            ..Default::default()
        };
        let obj = open(builder, config).read_object(&tip).unwrap().unwrap();
        assert_eq!(obj.content(), b"base+0+1+2+3");
    }

    #[test]
    fn chain_past_depth_limit_fails() {
        let (builder, tip) = chain_of(4);
        let config = PackConfig {
            max_delta_depth: 3,
            ..Default::default()
        };
        let err = open(builder, config).read_object(&tip).unwrap_err();
        assert!(matches!(err, PackError::RecursionLimit { .. }), "{err}");
    }

    #[test]
    fn default_depth_limit_is_fifty() {
        let (builder, tip) = chain_of(51);
        let err = open(builder, PackConfig::default()).read_object(&tip).unwrap_err();
        assert!(matches!(err, PackError::RecursionLimit { .. }));

        let (builder, tip) = chain_of(50);
        assert!(open(builder, PackConfig::default()).read_object(&tip).is_ok());
    }

    #[test]
    fn self_referencing_ofs_delta_is_a_cycle() {
        let mut builder = PackBuilder::new();
        let id = ObjectId::from_hash([0x33; 20]);
        builder.add_self_ofs_delta(&encode_delta(0, 0, &[]), id);
        let err = open(builder, PackConfig::default()).read_object(&id).unwrap_err();
        assert!(
            matches!(&err, PackError::RecursionLimit { reason, .. } if reason.contains("revisits")),
            "{err}"
        );
    }

    #[test]
    fn ref_delta_cycle_detected() {
        let a = ObjectId::from_hash([0x0a; 20]);
        let b = ObjectId::from_hash([0x0b; 20]);
        let delta = encode_delta(0, 0, &[]);
        let mut builder = PackBuilder::new();
        builder.add_ref_delta(b, &delta, a);
        builder.add_ref_delta(a, &delta, b);
        let err = open(builder, PackConfig::default()).read_object(&a).unwrap_err();
        assert!(matches!(err, PackError::RecursionLimit { .. }));
    }

    #[test]
    fn missing_ref_base_is_dangling() {
        let missing = ObjectId::from_hash([0xee; 20]);
        let id = ObjectId::from_hash([0x01; 20]);
        let mut builder = PackBuilder::new();
        builder.add_ref_delta(missing, &encode_delta(1, 1, &[DeltaOp::Insert(b"x".to_vec())]), id);
        let err = open(builder, PackConfig::default()).read_object(&id).unwrap_err();
        assert!(matches!(err, PackError::DanglingReference(base) if base == missing));
    }

    #[test]
    fn bad_delta_is_format_error() {
        let mut builder = PackBuilder::new();
        let base_at = builder.add_object(ObjectKind::Blob, b"abc");
        let id = ObjectId::from_hash([0x02; 20]);
        // Declares a 5-byte base.
        builder.add_ofs_delta(base_at, &encode_delta(5, 1, &[DeltaOp::Insert(b"x".to_vec())]), id);
        let err = open(builder, PackConfig::default()).read_object(&id).unwrap_err();
        assert!(matches!(err, PackError::Format { .. }));
    }

    #[test]
    fn tag_entries_unsupported() {
        let mut builder = PackBuilder::new();
        let id = ObjectId::from_hash([0x44; 20]);
        builder.add_tag(b"object 0000\n", id);
        let err = open(builder, PackConfig::default()).read_object(&id).unwrap_err();
        assert!(matches!(err, PackError::Unsupported(_)));
    }

    #[test]
    fn wrong_index_id_is_hash_mismatch() {
        let mut builder = PackBuilder::new();
        let claimed = ObjectId::from_hash([0x55; 20]);
        builder.add_object_as(ObjectKind::Blob, b"content", claimed);
        let err = open(builder, PackConfig::default()).read_object(&claimed).unwrap_err();
        assert!(matches!(err, PackError::HashMismatch { expected, .. } if expected == claimed));
    }

    #[test]
    fn crc_checked_when_enabled() {
        let mut builder = PackBuilder::new();
        builder.add_object(ObjectKind::Blob, b"crc protected");
        let id = compute_id(ObjectKind::Blob, b"crc protected");
        let (pack, index) = builder.finish();

        let (offset, crc) = index.lookup_entry(&id).unwrap();
        let strict = PackConfig {
            verify_crc: true,
            ..Default::default()
        };
        let reader = PackReader::from_bytes(pack, index, strict).unwrap();
        assert!(reader.read_object(&id).is_ok());
        assert!(matches!(
            reader.check_crc(offset, crc ^ 1),
            Err(PackError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn count_and_trailer_must_match_index() {
        let mut builder = PackBuilder::new();
        builder.add_object(ObjectKind::Blob, b"one");
        let (pack, _) = builder.finish();

        let empty = PackIndex::build(vec![], [0; 20]).unwrap();
        let err = PackReader::from_bytes(pack.clone(), empty, PackConfig::default()).unwrap_err();
        assert!(matches!(err, PackError::Format { offset: 8, .. }));

        let id = compute_id(ObjectKind::Blob, b"one");
        let other = PackIndex::build(vec![(id, 0, 12)], [0xab; 20]).unwrap();
        let err = PackReader::from_bytes(pack, other, PackConfig::default()).unwrap_err();
        assert!(matches!(err, PackError::ChecksumMismatch { .. }));
    }

    #[test]
    fn verify_with_checks_both_trailers() {
        let mut builder = PackBuilder::new();
        builder.add_object(ObjectKind::Blob, b"verified");
        let (pack, index) = builder.finish();
        let index_bytes = index.to_bytes();

        let mut reader =
            PackReader::from_bytes(pack.clone(), index.clone(), PackConfig::default()).unwrap();
        assert_eq!(reader.verification(), Verification::Skipped);
        reader.verify_with(&index_bytes).unwrap();
        assert_eq!(reader.verification(), Verification::Verified);

        let mut corrupt = pack;
        corrupt[13] ^= 0xff;
        let mut reader = PackReader::from_bytes(corrupt, index, PackConfig::default()).unwrap();
        assert!(matches!(
            reader.verify_with(&index_bytes),
            Err(PackError::ChecksumMismatch { what: "pack" })
        ));
    }

    #[test]
    fn open_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = PackBuilder::new();
        builder.add_object(ObjectKind::Blob, b"on disk");
        let (pack_path, _) = builder.write_to(dir.path(), "pack-test").unwrap();

        let reader = PackReader::open(&pack_path, PackConfig::strict()).unwrap();
        assert_eq!(reader.name(), "pack-test");
        assert_eq!(reader.verification(), Verification::Verified);
        assert_eq!(reader.path(), Some(pack_path.as_path()));
        let obj = reader
            .read_object(&compute_id(ObjectKind::Blob, b"on disk"))
            .unwrap()
            .unwrap();
        assert_eq!(obj.content(), b"on disk");
    }

    #[test]
    fn reader_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PackReader>();
    }
}
