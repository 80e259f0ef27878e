use sha1::{Digest, Sha1};

use odb_types::ObjectId;

/// Content-address hasher for one object kind.
///
/// Each hasher carries the kind's canonical lowercase name. The object id is
/// the SHA-1 of `"{kind} {len}\0"` followed by the content, so a blob and a
/// tree with identical bytes never share an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    kind: &'static str,
}

impl ContentHasher {
    /// Hasher for blob objects.
    pub const BLOB: Self = Self { kind: "blob" };
    /// Hasher for tree objects.
    pub const TREE: Self = Self { kind: "tree" };
    /// Hasher for commit objects.
    pub const COMMIT: Self = Self { kind: "commit" };

    /// Create a hasher for a custom kind name.
    pub const fn new(kind: &'static str) -> Self {
        Self { kind }
    }

    /// The kind name written into the header.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Canonical header: kind name, a space, the decimal length, a NUL.
    pub fn header(&self, content_len: usize) -> Vec<u8> {
        format!("{} {}\0", self.kind, content_len).into_bytes()
    }

    /// Compute the object id of `content`.
    pub fn hash(&self, content: &[u8]) -> ObjectId {
        let mut hasher = Sha1::new();
        hasher.update(self.header(content.len()));
        hasher.update(content);
        ObjectId::from_hash(hasher.finalize().into())
    }

    /// Verify that content produces the expected object id.
    pub fn verify(&self, content: &[u8], expected: &ObjectId) -> bool {
        self.hash(content) == *expected
    }

    /// Raw SHA-1 without an object header (for file checksums).
    pub fn raw_hash(data: &[u8]) -> [u8; 20] {
        Sha1::digest(data).into()
    }
}
