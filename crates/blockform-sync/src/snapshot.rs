//! Paired value tree and reference store

use blockform_model::{PropValue, ReferencePathStore};

/// One version of a block's state
///
/// The two halves always change together; structural edits return a whole
/// new snapshot or an error, never a half-applied pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Value tree
    pub value: PropValue,
    /// Reference side-store
    pub references: ReferencePathStore,
}

impl Snapshot {
    /// Pair a value tree with its store
    #[inline]
    #[must_use]
    pub fn new(value: PropValue, references: ReferencePathStore) -> Self {
        Self { value, references }
    }

    /// Whether both halves are the very same versions as `other`'s
    #[must_use]
    pub fn same_version(&self, other: &Self) -> bool {
        self.value.ptr_eq(&other.value) && self.references == other.references
    }
}
