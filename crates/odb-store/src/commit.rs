//! Commit objects.
//!
//! ```text
//! tree <hex>
//! parent <hex>        (zero or more, stored order)
//! author <line>
//! committer <line>
//!
//! <message>
//! ```
//!
//! Parent order is significant (the first parent is the mainline) and is
//! never changed by this module.

use std::borrow::Cow;

use odb_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{GitObject, ObjectKind};

/// Header fields of a commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitHeader {
    /// Root tree of the snapshot.
    pub tree: ObjectId,
    /// Parent commits, first parent first.
    pub parents: Vec<ObjectId>,
    /// Opaque author line: name, email, timestamp, offset. No newlines.
    pub author: Vec<u8>,
    /// Opaque committer line, same shape as `author`.
    pub committer: Vec<u8>,
}

/// A commit: header plus message bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub header: CommitHeader,
    pub message: Vec<u8>,
}

impl Commit {
    pub fn new(header: CommitHeader, message: impl Into<Vec<u8>>) -> Self {
        Self {
            header,
            message: message.into(),
        }
    }

    pub fn tree(&self) -> ObjectId {
        self.header.tree
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.header.parents
    }

    /// The mainline parent, if any.
    pub fn first_parent(&self) -> Option<ObjectId> {
        self.header.parents.first().copied()
    }

    /// A commit with no parents.
    pub fn is_root(&self) -> bool {
        self.header.parents.is_empty()
    }

    pub fn message_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.message)
    }

    pub fn encode(&self) -> Vec<u8> {
        encode_commit(&self.header, &self.message)
    }

    pub fn to_object(&self) -> GitObject {
        GitObject::new(ObjectKind::Commit, self.encode())
    }

    /// Decode from a `GitObject`.
    pub fn from_object(obj: &GitObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Commit)?;
        decode_commit(obj.content())
    }
}

/// Encode header and message. Parents are written in stored order.
pub fn encode_commit(header: &CommitHeader, message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        48 * (1 + header.parents.len())
            + header.author.len()
            + header.committer.len()
            + message.len()
            + 24,
    );
    push_line(&mut out, b"tree", header.tree.to_hex().as_bytes());
    for parent in &header.parents {
        push_line(&mut out, b"parent", parent.to_hex().as_bytes());
    }
    push_line(&mut out, b"author", &header.author);
    push_line(&mut out, b"committer", &header.committer);
    out.push(b'\n');
    out.extend_from_slice(message);
    out
}

fn push_line(out: &mut Vec<u8>, key: &[u8], value: &[u8]) {
    out.extend_from_slice(key);
    out.push(b' ');
    out.extend_from_slice(value);
    out.push(b'\n');
}

/// Parse commit content.
pub fn decode_commit(content: &[u8]) -> StoreResult<Commit> {
    let boundary = content
        .windows(2)
        .position(|w| w == b"\n\n")
        .ok_or_else(|| StoreError::format("commit has no blank line before the message"))?;
    let (head, message) = (&content[..boundary], &content[boundary + 2..]);

    let mut lines = head.split(|&b| b == b'\n').peekable();

    let tree = parse_id(expect_field(lines.next(), "tree")?)?;
    let mut parents = Vec::new();
    while let Some(value) = lines.peek().and_then(|line| field_value(*line, "parent")) {
        parents.push(parse_id(value)?);
        lines.next();
    }
    let author = expect_field(lines.next(), "author")?.to_vec();
    let committer = expect_field(lines.next(), "committer")?.to_vec();

    if let Some(extra) = lines.next() {
        return Err(StoreError::format(format!(
            "unexpected commit header line `{}`",
            String::from_utf8_lossy(extra)
        )));
    }

    Ok(Commit {
        header: CommitHeader {
            tree,
            parents,
            author,
            committer,
        },
        message: message.to_vec(),
    })
}

fn field_value<'a>(line: &'a [u8], key: &str) -> Option<&'a [u8]> {
    line.strip_prefix(key.as_bytes())?.strip_prefix(b" ")
}

fn expect_field<'a>(line: Option<&'a [u8]>, key: &str) -> StoreResult<&'a [u8]> {
    let line = line.ok_or_else(|| StoreError::format(format!("commit is missing `{key}`")))?;
    field_value(line, key).ok_or_else(|| {
        StoreError::format(format!(
            "expected `{key}` header, found `{}`",
            String::from_utf8_lossy(line)
        ))
    })
}

/// Ids are lowercase hex only, so a decoded commit re-encodes to the same
/// bytes.
fn parse_id(value: &[u8]) -> StoreResult<ObjectId> {
    let lowercase = value
        .iter()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(b));
    std::str::from_utf8(value)
        .ok()
        .filter(|_| lowercase)
        .and_then(|s| ObjectId::from_hex(s).ok())
        .ok_or_else(|| {
            StoreError::format(format!(
                "invalid object id `{}` in commit header",
                String::from_utf8_lossy(value)
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SIGNATURE: &[u8] = b"David Cournapeau <cournape@gmail.com> 1254378435 +0900";

    fn tree_id() -> ObjectId {
        ObjectId::from_hex("815fa52ea791bf9a0d152ca3386d61d3ad023a5a").unwrap()
    }

    fn initial_commit() -> Commit {
        Commit::new(
            CommitHeader {
                tree: tree_id(),
                parents: vec![],
                author: SIGNATURE.to_vec(),
                committer: SIGNATURE.to_vec(),
            },
            "Initial commit.\n",
        )
    }

    #[test]
    fn initial_commit_id() {
        let obj = initial_commit().to_object();
        assert_eq!(obj.id().to_hex(), "1b8ae996b7685aa07180a050332df81e0a6be40e");
    }

    #[test]
    fn encoding_layout() {
        let bytes = initial_commit().encode();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "tree 815fa52ea791bf9a0d152ca3386d61d3ad023a5a\n\
             author David Cournapeau <cournape@gmail.com> 1254378435 +0900\n\
             committer David Cournapeau <cournape@gmail.com> 1254378435 +0900\n\
             \n\
             Initial commit.\n"
        );
    }

    #[test]
    fn roundtrip_keeps_parent_order() {
        let mut commit = initial_commit();
        let p1 = ObjectId::from_hash([0xff; 20]);
        let p2 = ObjectId::from_hash([0x01; 20]);
        commit.header.parents = vec![p1, p2];

        let decoded = decode_commit(&commit.encode()).unwrap();
        assert_eq!(decoded.parents(), &[p1, p2]);
        assert_eq!(decoded.first_parent(), Some(p1));
        assert_eq!(decoded, commit);
        assert!(!decoded.is_root());
    }

    #[test]
    fn message_may_contain_blank_lines() {
        let mut commit = initial_commit();
        commit.message = b"subject\n\nbody\n\n".to_vec();
        assert_eq!(decode_commit(&commit.encode()).unwrap(), commit);
    }

    #[test]
    fn empty_message() {
        let mut commit = initial_commit();
        commit.message.clear();
        let decoded = decode_commit(&commit.encode()).unwrap();
        assert!(decoded.message.is_empty());
        assert!(decoded.is_root());
    }

    #[test]
    fn missing_fields_rejected() {
        let no_tree = b"author a\ncommitter c\n\nmsg";
        let no_author = b"tree 815fa52ea791bf9a0d152ca3386d61d3ad023a5a\ncommitter c\n\nmsg";
        let no_committer = b"tree 815fa52ea791bf9a0d152ca3386d61d3ad023a5a\nauthor a\n\nmsg";
        for content in [&no_tree[..], &no_author[..], &no_committer[..]] {
            assert!(matches!(decode_commit(content), Err(StoreError::Format(_))));
        }
    }

    #[test]
    fn unknown_header_rejected() {
        let content = b"tree 815fa52ea791bf9a0d152ca3386d61d3ad023a5a\n\
                        author a\ncommitter c\nencoding latin1\n\nmsg";
        assert!(matches!(decode_commit(content), Err(StoreError::Format(_))));
    }

    #[test]
    fn out_of_order_parent_rejected() {
        let content = b"tree 815fa52ea791bf9a0d152ca3386d61d3ad023a5a\n\
                        author a\n\
                        parent 815fa52ea791bf9a0d152ca3386d61d3ad023a5a\n\
                        committer c\n\nmsg";
        assert!(matches!(decode_commit(content), Err(StoreError::Format(_))));
    }

    #[test]
    fn bad_ids_and_missing_boundary_rejected() {
        assert!(matches!(
            decode_commit(b"tree 1234\nauthor a\ncommitter c\n\n"),
            Err(StoreError::Format(_))
        ));
        let no_boundary = b"tree 815fa52ea791bf9a0d152ca3386d61d3ad023a5a\nauthor a\ncommitter c\n";
        assert!(matches!(decode_commit(no_boundary), Err(StoreError::Format(_))));
    }

    #[test]
    fn uppercase_ids_rejected() {
        let upper_tree = b"tree 815FA52EA791BF9A0D152CA3386D61D3AD023A5A\n\
            author a\ncommitter c\n\nm";
        assert!(matches!(decode_commit(upper_tree), Err(StoreError::Format(_))));

        let upper_parent = b"tree 815fa52ea791bf9a0d152ca3386d61d3ad023a5a\n\
            parent 1B8AE996B7685AA07180A050332DF81E0A6BE40E\n\
            author a\ncommitter c\n\nm";
        assert!(matches!(decode_commit(upper_parent), Err(StoreError::Format(_))));

        let lower = b"tree 815fa52ea791bf9a0d152ca3386d61d3ad023a5a\n\
            parent 1b8ae996b7685aa07180a050332df81e0a6be40e\n\
            author a\ncommitter c\n\nm";
        assert_eq!(decode_commit(lower).unwrap().encode(), lower.to_vec());
    }

    #[test]
    fn kind_checked() {
        let obj = GitObject::new(ObjectKind::Blob, initial_commit().encode());
        assert!(matches!(
            Commit::from_object(&obj),
            Err(StoreError::KindMismatch { .. })
        ));
    }

    fn arb_line() -> impl Strategy<Value = Vec<u8>> {
        proptest::collection::vec(any::<u8>().prop_filter("no newline", |b| *b != b'\n'), 0..40)
    }

    proptest! {
        #[test]
        fn roundtrip_any(
            tree in proptest::array::uniform20(any::<u8>()),
            parents in proptest::collection::vec(proptest::array::uniform20(any::<u8>()), 0..5),
            author in arb_line(),
            committer in arb_line(),
            message in proptest::collection::vec(any::<u8>(), 0..100),
        ) {
            let commit = Commit::new(
                CommitHeader {
                    tree: ObjectId::from_hash(tree),
                    parents: parents.into_iter().map(ObjectId::from_hash).collect(),
                    author,
                    committer,
                },
                message,
            );
            prop_assert_eq!(decode_commit(&commit.encode()).unwrap(), commit);
        }
    }
}
