//! Tree objects: ordered `(mode, name, id)` entries.
//!
//! Encoding per entry is `<octal mode> <name>\0<20-byte id>`. The codec keeps
//! entries in the order given; [`Tree::new`] is the place that sorts.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashSet;

use odb_types::{ByteCursor, ObjectId, OID_LEN};

use crate::error::{StoreError, StoreResult};
use crate::object::{GitObject, ObjectKind};

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryMode {
    /// Normal file (0o100644).
    Regular,
    /// Executable file (0o100755).
    Executable,
    /// Symbolic link (0o120000).
    Symlink,
    /// Subtree / directory (0o040000).
    Directory,
    /// Commit in another repository (0o160000).
    Gitlink,
}

impl EntryMode {
    /// Octal mode value.
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
            Self::Gitlink => 0o160000,
        }
    }

    /// Parse from an octal mode value.
    pub fn from_mode_bits(bits: u32) -> Option<Self> {
        match bits {
            0o100644 => Some(Self::Regular),
            0o100755 => Some(Self::Executable),
            0o120000 => Some(Self::Symlink),
            0o040000 => Some(Self::Directory),
            0o160000 => Some(Self::Gitlink),
            _ => None,
        }
    }

    /// Whether the entry points at another tree.
    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Directory)
    }

    /// The kind of object the entry's target is expected to be. Gitlinks
    /// point outside this repository and have none.
    pub fn target_kind(&self) -> Option<ObjectKind> {
        match self {
            Self::Regular | Self::Executable | Self::Symlink => Some(ObjectKind::Blob),
            Self::Directory => Some(ObjectKind::Tree),
            Self::Gitlink => None,
        }
    }

    /// Minimal octal ASCII, as written into tree objects (`40000`, not `040000`).
    fn encoded(&self) -> String {
        format!("{:o}", self.mode_bits())
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TreeEntry {
    /// File mode (regular, executable, symlink, directory, gitlink).
    pub mode: EntryMode,
    /// Entry name as raw bytes. Never empty; never contains `/` or NUL.
    pub name: Vec<u8>,
    /// Id of the referenced object.
    pub target: ObjectId,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(mode: EntryMode, name: impl Into<Vec<u8>>, target: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            target,
        }
    }

    /// Lossy UTF-8 view of the name.
    pub fn name_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Reject names that cannot be encoded.
    pub fn validate(&self) -> StoreResult<()> {
        validate_name(&self.name)
    }

    /// Canonical tree order: byte-wise by name, with directory names
    /// compared as if they ended in `/`.
    pub fn cmp_canonical(&self, other: &Self) -> Ordering {
        let suffix = |e: &Self| e.mode.is_tree().then_some(b'/');
        self.name
            .iter()
            .copied()
            .chain(suffix(self))
            .cmp(other.name.iter().copied().chain(suffix(other)))
    }
}

fn validate_name(name: &[u8]) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::format("tree entry has an empty name"));
    }
    if name.contains(&b'/') {
        return Err(StoreError::format(format!(
            "tree entry name `{}` contains '/'",
            String::from_utf8_lossy(name)
        )));
    }
    if name.contains(&0) {
        return Err(StoreError::format("tree entry name contains NUL"));
    }
    Ok(())
}

fn parse_mode(digits: &[u8]) -> StoreResult<EntryMode> {
    let text = std::str::from_utf8(digits).ok().filter(|s| {
        !s.is_empty() && s.bytes().all(|b| (b'0'..=b'7').contains(&b))
    });
    let bits = text
        .and_then(|s| u32::from_str_radix(s, 8).ok())
        .ok_or_else(|| {
            StoreError::format(format!(
                "tree entry mode `{}` is not octal",
                String::from_utf8_lossy(digits)
            ))
        })?;
    EntryMode::from_mode_bits(bits)
        .ok_or_else(|| StoreError::format(format!("unsupported tree entry mode {bits:o}")))
}

/// Parse tree content into entries, in stored order.
pub fn decode_tree(content: &[u8]) -> StoreResult<Vec<TreeEntry>> {
    let mut cursor = ByteCursor::new(content);
    let mut entries = Vec::new();

    while !cursor.is_empty() {
        let mode = parse_mode(cursor.take_until(b' ')?)?;
        let name = cursor.take_until(0)?;
        validate_name(name)?;
        let target = cursor.read_object_id()?;
        entries.push(TreeEntry::new(mode, name, target));
    }

    Ok(entries)
}

/// Encode entries in the given order. Callers wanting ids that match other
/// tooling must present entries in canonical order.
pub fn encode_tree(entries: &[TreeEntry]) -> Vec<u8> {
    let size = entries
        .iter()
        .map(|e| 8 + e.name.len() + OID_LEN)
        .sum::<usize>();
    let mut out = Vec::with_capacity(size);
    for entry in entries {
        out.extend_from_slice(entry.mode.encoded().as_bytes());
        out.push(b' ');
        out.extend_from_slice(&entry.name);
        out.push(0);
        out.extend_from_slice(entry.target.as_bytes());
    }
    out
}

/// Directory listing object.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Tree {
    /// Entries in stored order.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a tree from entries, validating names and sorting canonically.
    ///
    /// Duplicate names are rejected.
    pub fn new(mut entries: Vec<TreeEntry>) -> StoreResult<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            entry.validate()?;
            if !seen.insert(entry.name.as_slice()) {
                return Err(StoreError::format(format!(
                    "duplicate tree entry `{}`",
                    entry.name_str()
                )));
            }
        }
        entries.sort_by(TreeEntry::cmp_canonical);
        Ok(Self { entries })
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse tree content, keeping the stored order.
    pub fn decode(content: &[u8]) -> StoreResult<Self> {
        Ok(Self {
            entries: decode_tree(content)?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        encode_tree(&self.entries)
    }

    pub fn to_object(&self) -> GitObject {
        GitObject::new(ObjectKind::Tree, self.encode())
    }

    /// Decode from a `GitObject`.
    pub fn from_object(obj: &GitObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Tree)?;
        Self::decode(obj.content())
    }

    /// Whether entries are in canonical order with no duplicate names.
    pub fn is_canonical(&self) -> bool {
        self.entries
            .windows(2)
            .all(|w| w[0].cmp_canonical(&w[1]) == Ordering::Less)
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &[u8]) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
