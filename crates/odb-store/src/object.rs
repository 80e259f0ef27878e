use bytes::Bytes;
use odb_crypto::ContentHasher;
use odb_types::ObjectId;

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Raw content (file contents, arbitrary data).
    Blob,
    /// Directory listing: ordered entries mapping names to object ids.
    Tree,
    /// Snapshot pointer: root tree, parents, authorship, message.
    Commit,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 3] = [Self::Blob, Self::Tree, Self::Commit];

    /// Canonical lowercase name, as written in object headers.
    pub fn name(&self) -> &'static str {
        self.hasher().kind()
    }

    /// Parse a canonical kind name.
    pub fn from_name(name: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().as_bytes() == name)
    }

    /// The content-address hasher for this kind.
    pub fn hasher(&self) -> ContentHasher {
        match self {
            Self::Blob => ContentHasher::BLOB,
            Self::Tree => ContentHasher::TREE,
            Self::Commit => ContentHasher::COMMIT,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An immutable object: kind tag, content, and the id derived from both.
///
/// The id is computed once in [`GitObject::new`]; there is no way to build a
/// `GitObject` whose id disagrees with its content. Cloning shares the
/// content buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GitObject {
    kind: ObjectKind,
    content: Bytes,
    id: ObjectId,
}

impl GitObject {
    /// Create an object from kind and content, computing its id.
    pub fn new(kind: ObjectKind, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        let id = kind.hasher().hash(&content);
        Self { kind, content, id }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The content bytes (without header).
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Shared handle to the content buffer.
    pub fn bytes(&self) -> &Bytes {
        &self.content
    }

    /// Content length in bytes.
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Canonical header for this object.
    pub fn header(&self) -> Vec<u8> {
        self.kind.hasher().header(self.content.len())
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }

    pub(crate) fn expect_kind(&self, expected: ObjectKind) -> StoreResult<()> {
        if self.kind != expected {
            return Err(StoreError::KindMismatch {
                expected,
                actual: self.kind,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Bytes,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    pub fn to_object(&self) -> GitObject {
        GitObject::new(ObjectKind::Blob, self.data.clone())
    }

    /// Decode from a `GitObject`.
    pub fn from_object(obj: &GitObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Blob)?;
        Ok(Self {
            data: obj.bytes().clone(),
        })
    }
}
