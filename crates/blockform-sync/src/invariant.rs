//! Reference path-set invariant
//!
//! The live reference-slot paths of a schema/value pair must equal the key
//! set of its store. [`check_reference_invariant`] verifies that;
//! [`reconcile`] restores it for persisted data entering a session.

use std::collections::BTreeSet;

use blockform_model::{
    EntitySetRegistry, PropPath, PropSchema, PropValue, ReferenceEntry, ReferencePathStore,
};

use crate::error::SyncError;
use crate::synthesize::empty_entry;
use crate::traverse::{reference_paths, reference_slots};

/// Verify that `store` holds exactly the live slot paths of `value`
///
/// # Errors
/// - `MissingReferenceEntry` for the first live slot without an entry
/// - `OrphanReferenceEntry` for the first entry without a live slot
/// - `SchemaValueMismatch` if `value` does not have the shape of `schema`
pub fn check_reference_invariant(
    schema: &PropSchema,
    value: &PropValue,
    store: &ReferencePathStore,
) -> Result<(), SyncError> {
    let live: BTreeSet<PropPath> = reference_paths(schema, &PropPath::root(), value)?
        .into_iter()
        .collect();
    if let Some(missing) = live.iter().find(|path| !store.contains(path)) {
        return Err(SyncError::MissingReferenceEntry(missing.clone()));
    }
    if let Some(orphan) = store.keys().find(|path| !live.contains(*path)) {
        return Err(SyncError::OrphanReferenceEntry(orphan.clone()));
    }
    Ok(())
}

/// Store repaired against a value tree
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// Store satisfying the invariant
    pub references: ReferencePathStore,
    /// Slots that received a fresh empty entry
    pub added: Vec<PropPath>,
    /// Entries dropped because no live slot backs them
    pub dropped: Vec<PropPath>,
}

/// Bring a persisted store in line with `value`
///
/// Live slots without an entry, or whose entry disagrees with the slot's
/// entity set or cardinality, get a fresh empty entry. Entries without a live
/// slot are dropped.
///
/// # Errors
/// - `SchemaValueMismatch` if `value` does not have the shape of `schema`
/// - `UnknownEntitySet` if a slot that needs an entry names an unknown set
pub fn reconcile(
    schema: &PropSchema,
    value: &PropValue,
    store: &ReferencePathStore,
    registry: &dyn EntitySetRegistry,
) -> Result<Reconciled, SyncError> {
    let slots = reference_slots(schema, &PropPath::root(), value)?;
    let live: BTreeSet<&PropPath> = slots.iter().map(|(path, _)| path).collect();

    let mut references = store.clone();
    let mut added = Vec::new();
    for (path, slot) in &slots {
        let fits = store.get(path).is_some_and(|entry: &ReferenceEntry| {
            entry.entity_set == slot.entity_set
                && entry.selection.cardinality() == slot.cardinality
        });
        if !fits {
            references = references.set(path.clone(), empty_entry(slot, path, registry)?);
            added.push(path.clone());
        }
    }

    let dropped: Vec<PropPath> = store
        .keys()
        .filter(|path| !live.contains(path))
        .cloned()
        .collect();
    for path in &dropped {
        tracing::warn!(path = %path, "dropping reference entry with no live slot");
        references = references.remove(path);
    }

    Ok(Reconciled {
        references,
        added,
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockform_model::{prop_path, Cardinality, Selection};
    use blockform_test_utils::{article_schema, entity_sets, many, one};
    use pretty_assertions::assert_eq;

    fn article() -> PropValue {
        PropValue::object([("title", PropValue::leaf(""))])
    }

    #[test]
    fn invariant_detects_missing_and_orphan() {
        let schema = article_schema();
        assert_eq!(
            check_reference_invariant(&schema, &article(), &ReferencePathStore::new()),
            Err(SyncError::MissingReferenceEntry(prop_path!["link"]))
        );

        let store = ReferencePathStore::new()
            .set(prop_path!["link"], ReferenceEntry::empty("posts", Cardinality::One))
            .set(prop_path!["stale"], ReferenceEntry::empty("posts", Cardinality::One));
        assert_eq!(
            check_reference_invariant(&schema, &article(), &store),
            Err(SyncError::OrphanReferenceEntry(prop_path!["stale"]))
        );

        let store = store.remove(&prop_path!["stale"]);
        assert_eq!(check_reference_invariant(&schema, &article(), &store), Ok(()));
    }

    #[test]
    fn reconcile_fills_gaps_and_drops_orphans() {
        let store = ReferencePathStore::new()
            .set(prop_path!["stale"], ReferenceEntry::new("posts", one("p9")));
        let out = reconcile(&article_schema(), &article(), &store, &entity_sets()).unwrap();

        assert_eq!(out.added, vec![prop_path!["link"]]);
        assert_eq!(out.dropped, vec![prop_path!["stale"]]);
        assert_eq!(
            out.references.get(&prop_path!["link"]),
            Some(&ReferenceEntry::new("posts", Selection::One(None)))
        );
        assert_eq!(out.references.len(), 1);
    }

    #[test]
    fn reconcile_keeps_matching_entries() {
        let store = ReferencePathStore::new()
            .set(prop_path!["link"], ReferenceEntry::new("posts", one("p1")));
        let out = reconcile(&article_schema(), &article(), &store, &entity_sets()).unwrap();
        assert!(out.added.is_empty());
        assert!(out.dropped.is_empty());
        assert_eq!(out.references, store);
    }

    #[test]
    fn reconcile_resets_mismatched_cardinality() {
        let store = ReferencePathStore::new()
            .set(prop_path!["link"], ReferenceEntry::new("posts", many(&["p1", "p2"])));
        let out = reconcile(&article_schema(), &article(), &store, &entity_sets()).unwrap();
        assert_eq!(out.added, vec![prop_path!["link"]]);
        assert_eq!(
            out.references.get(&prop_path!["link"]),
            Some(&ReferenceEntry::empty("posts", Cardinality::One))
        );
    }
}
