use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use odb_types::ObjectId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::loose::{compute_id, decode_loose, encode_loose_with};
use crate::object::{GitObject, ObjectKind};

/// Loose objects on disk: one zlib file per object under
/// `<objects>/<first 2 hex>/<remaining 38 hex>`.
///
/// Reads are plain file reads. Writes go to a temporary file in the fan-out
/// directory and are renamed into place without clobbering, so concurrent
/// writers of the same object race harmlessly.
#[derive(Clone, Debug)]
pub struct LooseObjectDir {
    objects_dir: PathBuf,
    compression: Compression,
}

impl LooseObjectDir {
    /// Loose objects rooted at `objects_dir` (usually `<repo>/objects`).
    pub fn new(objects_dir: impl Into<PathBuf>) -> Self {
        Self {
            objects_dir: objects_dir.into(),
            compression: Compression::default(),
        }
    }

    /// Set the zlib level (0-9) used for new objects.
    pub fn with_compression(mut self, level: u32) -> Self {
        self.compression = Compression::new(level.min(9));
        self
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// Path of the loose file for `id`, whether or not it exists.
    pub fn path_for(&self, id: &ObjectId) -> PathBuf {
        let (dir, file) = id.loose_path_parts();
        self.objects_dir.join(dir).join(file)
    }

    /// Existence check by stat only; nothing is decoded.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.path_for(id).is_file()
    }

    /// Read and decode the object stored under `id`.
    ///
    /// Returns `Ok(None)` if there is no loose file. A file whose content
    /// hashes to a different id is reported as [`StoreError::HashMismatch`].
    pub fn read(&self, id: &ObjectId) -> StoreResult<Option<GitObject>> {
        let raw = match std::fs::read(self.path_for(id)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let obj = decode_loose(&raw)?;
        if obj.id() != *id {
            return Err(StoreError::HashMismatch {
                expected: *id,
                computed: obj.id(),
            });
        }
        Ok(Some(obj))
    }

    /// Decode a loose object file at an arbitrary path.
    pub fn read_path(path: &Path) -> StoreResult<GitObject> {
        decode_loose(&std::fs::read(path)?)
    }

    /// Store `content` as an object of `kind` and return its id.
    ///
    /// Writing an object that already exists is a no-op.
    pub fn write(&self, kind: ObjectKind, content: &[u8]) -> StoreResult<ObjectId> {
        let id = compute_id(kind, content);
        let path = self.path_for(&id);
        if path.is_file() {
            return Ok(id);
        }

        let dir = path
            .parent()
            .ok_or_else(|| StoreError::format("loose object path has no parent"))?;
        std::fs::create_dir_all(dir)?;

        let encoded = encode_loose_with(kind, content, self.compression)?;
        let mut tmp = tempfile::Builder::new().prefix("tmp_obj_").tempfile_in(dir)?;
        tmp.write_all(&encoded)?;
        tmp.as_file().sync_all()?;

        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                debug!(id = %id, kind = %kind, bytes = encoded.len(), "wrote loose object");
                Ok(id)
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(id),
            Err(e) => Err(e.error.into()),
        }
    }

    /// Store an already-constructed object.
    pub fn write_object(&self, obj: &GitObject) -> StoreResult<ObjectId> {
        self.write(obj.kind(), obj.content())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loose::encode_loose;

    #[test]
    fn write_and_read_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectDir::new(dir.path().join("objects"));

        let id = store.write(ObjectKind::Blob, b"TODO Content.\n").unwrap();
        assert_eq!(id.to_hex(), "dc1b915cba9cd6efd61c353fefb96823aaf2dd8f");
        assert!(store.contains(&id));
        assert!(dir
            .path()
            .join("objects/dc/1b915cba9cd6efd61c353fefb96823aaf2dd8f")
            .is_file());

        let obj = store.read(&id).unwrap().expect("should exist");
        assert_eq!(obj.content(), b"TODO Content.\n");
        assert_eq!(obj.kind(), ObjectKind::Blob);
    }

    #[test]
    fn write_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectDir::new(dir.path());
        let first = store.write(ObjectKind::Blob, b"same").unwrap();
        let path = store.path_for(&first);
        let before = std::fs::read(&path).unwrap();

        let second = store.write(ObjectKind::Blob, b"same").unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read(&path).unwrap(), before);

        let fanout = path.parent().unwrap();
        assert_eq!(std::fs::read_dir(fanout).unwrap().count(), 1);
    }

    #[test]
    fn missing_object_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectDir::new(dir.path());
        let id = ObjectId::from_hash([9; 20]);
        assert!(store.read(&id).unwrap().is_none());
        assert!(!store.contains(&id));
    }

    #[test]
    fn misplaced_object_is_hash_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectDir::new(dir.path());
        let wrong = ObjectId::from_hash([0xaa; 20]);
        let path = store.path_for(&wrong);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, encode_loose(ObjectKind::Blob, b"other").unwrap()).unwrap();

        let err = store.read(&wrong).unwrap_err();
        assert!(matches!(err, StoreError::HashMismatch { expected, .. } if expected == wrong));
    }

    #[test]
    fn corrupt_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectDir::new(dir.path());
        let id = ObjectId::from_hash([0x11; 20]);
        let path = store.path_for(&id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"garbage").unwrap();
        assert!(matches!(store.read(&id), Err(StoreError::Format(_))));
    }

    #[test]
    fn read_path_decodes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectDir::new(dir.path()).with_compression(9);
        let id = store.write(ObjectKind::Tree, b"").unwrap();
        let obj = LooseObjectDir::read_path(&store.path_for(&id)).unwrap();
        assert_eq!(obj.id(), id);
        assert_eq!(obj.kind(), ObjectKind::Tree);
    }
}
