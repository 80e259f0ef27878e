use std::path::Path;

use odb_store::GitObject;
use odb_types::ObjectId;
use tracing::{debug, warn};

use crate::config::PackConfig;
use crate::error::{PackError, PackResult};
use crate::reader::PackReader;
use crate::traits::BaseProvider;

/// An ordered set of attached packs.
///
/// Lookups consult packs in attachment order. Ref-delta bases missing from
/// the pack being read are located in any other attached pack.
#[derive(Debug, Default)]
pub struct PackManager {
    packs: Vec<PackReader>,
    config: PackConfig,
}

impl PackManager {
    pub fn new(config: PackConfig) -> Self {
        Self {
            packs: Vec::new(),
            config,
        }
    }

    /// Attach every `*.pack` under `<objects_dir>/pack`, in file-name order.
    ///
    /// Packs that fail to open are skipped with a warning. A missing pack
    /// directory yields an empty manager.
    pub fn load(objects_dir: &Path, config: PackConfig) -> PackResult<Self> {
        let mut manager = Self::new(config);
        manager.attach_dir(&objects_dir.join("pack"))?;
        Ok(manager)
    }

    /// Attach every `*.pack` in `pack_dir`, in file-name order. Returns how
    /// many were attached.
    pub fn attach_dir(&mut self, pack_dir: &Path) -> PackResult<usize> {
        if !pack_dir.is_dir() {
            return Ok(0);
        }
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(pack_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "pack") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut attached = 0;
        for path in paths {
            match PackReader::open(&path, self.config.clone()) {
                Ok(reader) => {
                    self.attach(reader);
                    attached += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable pack");
                }
            }
        }
        Ok(attached)
    }

    /// Open and attach one pack. Unlike [`PackManager::attach_dir`], errors
    /// are returned.
    pub fn attach_path(&mut self, pack_path: &Path) -> PackResult<()> {
        let reader = PackReader::open(pack_path, self.config.clone())?;
        self.attach(reader);
        Ok(())
    }

    /// Append a reader. A pack whose checksum is already attached is
    /// ignored.
    pub fn attach(&mut self, reader: PackReader) {
        if self.packs.iter().any(|p| p.checksum() == reader.checksum()) {
            debug!(pack = %reader.name(), "pack already attached");
            return;
        }
        debug!(pack = %reader.name(), objects = reader.object_count(), "attached pack");
        self.packs.push(reader);
    }

    /// Detach the pack named `name`, returning it.
    pub fn detach(&mut self, name: &str) -> Option<PackReader> {
        let pos = self.packs.iter().position(|p| p.name() == name)?;
        debug!(pack = name, "detached pack");
        Some(self.packs.remove(pos))
    }

    /// Read `id` from the first pack that lists it.
    ///
    /// If a listing pack fails to produce the object, later packs are still
    /// tried; when none succeeds, the last failure is returned.
    pub fn read_object(&self, id: &ObjectId) -> PackResult<Option<GitObject>> {
        let mut last_err = None;
        for pack in self.packs.iter().filter(|p| p.contains(id)) {
            match pack.read_object_with(id, self) {
                Ok(Some(obj)) => return Ok(Some(obj)),
                Ok(None) => {}
                Err(e) => {
                    warn!(pack = %pack.name(), id = %id, error = %e, "pack read failed");
                    last_err = Some(e);
                }
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// Like [`PackManager::read_object`] but absence is an error.
    pub fn get(&self, id: &ObjectId) -> PackResult<GitObject> {
        self.read_object(id)?.ok_or(PackError::ObjectNotFound(*id))
    }

    /// Index lookup only; nothing is inflated.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.packs.iter().any(|p| p.contains(id))
    }

    pub fn packs(&self) -> &[PackReader] {
        &self.packs
    }

    pub fn pack_count(&self) -> usize {
        self.packs.len()
    }

    /// Total entries across packs; objects in several packs count once per
    /// pack.
    pub fn total_objects(&self) -> usize {
        self.packs.iter().map(|p| p.object_count()).sum()
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }
}

impl BaseProvider for PackManager {
    fn locate_base(&self, id: &ObjectId) -> Option<(&PackReader, u64)> {
        self.packs
            .iter()
            .find_map(|pack| pack.index().lookup(id).map(|offset| (pack, offset)))
    }
}
