use std::path::{Path, PathBuf};

use odb_pack::PackManager;
use odb_store::{Blob, Commit, GitObject, LooseObjectDir, ObjectKind, Tree};
use odb_types::ObjectId;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{OdbError, OdbResult};

/// Object database over a loose directory and any number of packs.
///
/// Lookups try the loose directory first, then each attached pack in
/// attachment order. Packs are attached and detached explicitly; the pack
/// directory is only scanned when [`ObjectStore::attach_pack_dir`] is
/// called.
///
/// Reads take `&self` and touch no shared mutable state, so one store can
/// serve many threads. New objects are always written loose.
#[derive(Debug)]
pub struct ObjectStore {
    root: PathBuf,
    loose: LooseObjectDir,
    packs: PackManager,
    config: StoreConfig,
}

impl ObjectStore {
    /// Store rooted at `root`, holding objects under `<root>/objects`. No
    /// packs are attached.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, StoreConfig::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, config: StoreConfig) -> Self {
        let root = root.into();
        let loose =
            LooseObjectDir::new(root.join("objects")).with_compression(config.compression_level);
        let packs = PackManager::new(config.pack.clone());
        Self {
            root,
            loose,
            packs,
            config,
        }
    }

    /// Store rooted at `root` with every pack in `<root>/objects/pack`
    /// attached.
    pub fn open(root: impl Into<PathBuf>, config: StoreConfig) -> OdbResult<Self> {
        config.validate()?;
        let mut store = Self::with_config(root, config);
        store.attach_pack_dir()?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn objects_dir(&self) -> &Path {
        self.loose.objects_dir()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Fetch and decode `id`.
    ///
    /// A source that fails to produce the object does not stop the search.
    /// If no source has it, the error from the last failing source is
    /// returned, or [`OdbError::NotFound`] if none failed.
    pub fn get(&self, id: &ObjectId) -> OdbResult<GitObject> {
        let mut last_err = None;

        match self.loose.read(id) {
            Ok(Some(obj)) => return Ok(obj),
            Ok(None) => {}
            Err(e) => {
                warn!(id = %id, error = %e, "loose object unreadable");
                last_err = Some(OdbError::from(e));
            }
        }

        match self.packs.read_object(id) {
            Ok(Some(obj)) => return Ok(obj),
            Ok(None) => {}
            Err(e) => last_err = Some(OdbError::from(e)),
        }

        Err(last_err.unwrap_or(OdbError::NotFound(*id)))
    }

    /// Existence check by loose-file stat or index lookup; nothing is
    /// decoded.
    pub fn has(&self, id: &ObjectId) -> bool {
        self.loose.contains(id) || self.packs.contains(id)
    }

    /// Store `content` as a loose object of `kind` and return its id.
    ///
    /// The loose file is written if absent, even when a pack already lists
    /// the id, so a later `get` is served from the loose copy. Writing an
    /// object that already exists loose is a no-op.
    pub fn put(&self, kind: ObjectKind, content: &[u8]) -> OdbResult<ObjectId> {
        let id = self.loose.write(kind, content)?;
        if self.packs.contains(&id) {
            debug!(id = %id, "packed object also written loose");
        }
        Ok(id)
    }

    pub fn put_object(&self, obj: &GitObject) -> OdbResult<ObjectId> {
        self.put(obj.kind(), obj.content())
    }

    pub fn get_blob(&self, id: &ObjectId) -> OdbResult<Blob> {
        Ok(Blob::from_object(&self.get(id)?)?)
    }

    pub fn get_tree(&self, id: &ObjectId) -> OdbResult<Tree> {
        Ok(Tree::from_object(&self.get(id)?)?)
    }

    pub fn get_commit(&self, id: &ObjectId) -> OdbResult<Commit> {
        Ok(Commit::from_object(&self.get(id)?)?)
    }

    // ---- Packs ----

    /// Attach one pack; its index is read from the `.idx` sibling.
    pub fn attach_pack(&mut self, pack_path: &Path) -> OdbResult<()> {
        self.packs.attach_path(pack_path)?;
        info!(path = %pack_path.display(), packs = self.packs.pack_count(), "attached pack");
        Ok(())
    }

    /// Attach every pack in `<root>/objects/pack`, skipping unreadable ones.
    /// Returns the number attached by this call.
    pub fn attach_pack_dir(&mut self) -> OdbResult<usize> {
        let pack_dir = self.loose.objects_dir().join("pack");
        let attached = self.packs.attach_dir(&pack_dir)?;
        if attached > 0 {
            info!(dir = %pack_dir.display(), attached, "attached pack directory");
        }
        Ok(attached)
    }

    /// Detach the pack named `name` (its file stem). Returns whether a pack
    /// was detached.
    pub fn detach_pack(&mut self, name: &str) -> bool {
        self.packs.detach(name).is_some()
    }

    pub fn pack_count(&self) -> usize {
        self.packs.pack_count()
    }

    pub fn packs(&self) -> &PackManager {
        &self.packs
    }
}
