use odb_types::ObjectId;

use crate::reader::PackReader;

/// Source of ref-delta bases that live outside the pack being read.
///
/// Implementations must satisfy these invariants:
/// - A provider only locates bases; it never resolves them. The reader that
///   started the resolution follows the returned location in its own loop,
///   so one depth limit and one visited set cover the whole chain even
///   when it hops between packs.
/// - `None` means no pack known to the provider lists the id. The caller
///   then reports a dangling reference.
pub trait BaseProvider {
    /// The pack and offset holding the entry for `id`.
    fn locate_base(&self, id: &ObjectId) -> Option<(&PackReader, u64)>;
}

/// Provider for packs read on their own: no outside bases exist.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoExternalBases;

impl BaseProvider for NoExternalBases {
    fn locate_base(&self, _id: &ObjectId) -> Option<(&PackReader, u64)> {
        None
    }
}
