//! Reference-safe list edits
//!
//! Store keys embed list indices, so inserting, removing or moving an item
//! renumbers the entries of every item after it. Each edit here updates the
//! value tree and the store together.

use blockform_model::{
    EntitySetRegistry, ListSchema, PathSegment, PropPath, PropValue, ReferencePathStore,
};
use im::Vector;

use crate::error::SyncError;
use crate::snapshot::Snapshot;
use crate::synthesize::synthesize;
use crate::tree;

/// Insert a fresh element at `index`, shifting later items up
///
/// `index == len` appends.
///
/// # Errors
/// - `NotAList` / `PathNotFound` if `list_path` does not address a list
/// - `IndexOutOfBounds` if `index > len`
/// - any synthesis error of the element; nothing is applied
pub fn insert_item(
    schema: &ListSchema,
    state: &Snapshot,
    list_path: &PropPath,
    index: usize,
    registry: &dyn EntitySetRegistry,
) -> Result<Snapshot, SyncError> {
    let items = list_at(&state.value, list_path)?;
    if index > items.len() {
        return Err(out_of_bounds(list_path, index, items.len()));
    }

    let fresh = synthesize(&schema.element, registry)?;
    let mut updated = items.clone();
    updated.insert(index, fresh.value);

    let shifted = remap_indices(&state.references, list_path, |i| {
        Some(if i >= index { i + 1 } else { i })
    });
    let references = shifted.insert_all(&list_path.child(index), fresh.entries.iter().cloned());
    let value = tree::replace(&state.value, list_path, PropValue::list(updated))?;

    tracing::debug!(list = %list_path, index, added = fresh.entries.len(), "inserted list item");
    Ok(Snapshot::new(value, references))
}

/// Remove the item at `index`, shifting later items down
///
/// # Errors
/// - `NotAList` / `PathNotFound` if `list_path` does not address a list
/// - `IndexOutOfBounds` if `index >= len`
pub fn remove_item(
    state: &Snapshot,
    list_path: &PropPath,
    index: usize,
) -> Result<Snapshot, SyncError> {
    let items = list_at(&state.value, list_path)?;
    if index >= items.len() {
        return Err(out_of_bounds(list_path, index, items.len()));
    }

    let mut updated = items.clone();
    updated.remove(index);

    let references = remap_indices(&state.references, list_path, |i| match i.cmp(&index) {
        std::cmp::Ordering::Less => Some(i),
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Greater => Some(i - 1),
    });
    let value = tree::replace(&state.value, list_path, PropValue::list(updated))?;

    tracing::debug!(list = %list_path, index, "removed list item");
    Ok(Snapshot::new(value, references))
}

/// Move the item at `from` so it ends up at `to`
///
/// # Errors
/// - `NotAList` / `PathNotFound` if `list_path` does not address a list
/// - `IndexOutOfBounds` if either index is `>= len`
pub fn move_item(
    state: &Snapshot,
    list_path: &PropPath,
    from: usize,
    to: usize,
) -> Result<Snapshot, SyncError> {
    let items = list_at(&state.value, list_path)?;
    for index in [from, to] {
        if index >= items.len() {
            return Err(out_of_bounds(list_path, index, items.len()));
        }
    }
    if from == to {
        return Ok(state.clone());
    }

    let mut updated = items.clone();
    let moved = updated.remove(from);
    updated.insert(to, moved);

    let references = remap_indices(&state.references, list_path, |i| {
        Some(if i == from {
            to
        } else if from < to && (from..=to).contains(&i) {
            i - 1
        } else if to < from && (to..from).contains(&i) {
            i + 1
        } else {
            i
        })
    });
    let value = tree::replace(&state.value, list_path, PropValue::list(updated))?;

    tracing::debug!(list = %list_path, from, to, "moved list item");
    Ok(Snapshot::new(value, references))
}

fn list_at<'v>(tree: &'v PropValue, list_path: &PropPath) -> Result<&'v Vector<PropValue>, SyncError> {
    tree::get(tree, list_path)
        .ok_or_else(|| SyncError::PathNotFound(list_path.clone()))?
        .as_list()
        .ok_or_else(|| SyncError::NotAList(list_path.clone()))
}

fn out_of_bounds(path: &PropPath, index: usize, len: usize) -> SyncError {
    SyncError::IndexOutOfBounds {
        path: path.clone(),
        index,
        len,
    }
}

/// Renumber the item index of every entry beneath `list_path`
///
/// Entries whose index maps to `None` are dropped.
fn remap_indices(
    store: &ReferencePathStore,
    list_path: &PropPath,
    remap: impl Fn(usize) -> Option<usize>,
) -> ReferencePathStore {
    let depth = list_path.len();
    let mut moved = Vec::new();
    for (path, entry) in store.entries_under(list_path) {
        let Some(old) = path.segments().get(depth).and_then(PathSegment::as_index) else {
            moved.push((path, entry));
            continue;
        };
        if let Some(new_path) = remap(old).and_then(|new| path.with_segment(depth, new)) {
            moved.push((new_path, entry));
        }
    }
    store
        .remove_under(list_path)
        .insert_all(&PropPath::root(), moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockform_model::{prop_path, Cardinality, PropSchema, ReferenceEntry};
    use blockform_test_utils::{card_schema, entity_sets, many};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn cards() -> ListSchema {
        let PropSchema::List(list) = PropSchema::list(card_schema()) else {
            unreachable!()
        };
        list
    }

    fn empty_state() -> Snapshot {
        Snapshot::new(
            PropValue::object([("cards", PropValue::list(Vec::new()))]),
            ReferencePathStore::new(),
        )
    }

    /// Three cards, each tagged with its own position
    fn three_cards() -> Snapshot {
        let list = cards();
        let path = prop_path!["cards"];
        let mut state = empty_state();
        for index in 0..3 {
            state = insert_item(&list, &state, &path, index, &entity_sets()).unwrap();
            let value = tree::replace(
                &state.value,
                &prop_path!["cards", index, "a"],
                PropValue::leaf(index),
            )
            .unwrap();
            let id = index.to_string();
            let references = state.references.set(
                prop_path!["cards", index, "b"],
                ReferenceEntry::new("tags", many(&[id.as_str()])),
            );
            state = Snapshot::new(value, references);
        }
        state
    }

    fn tag_of(state: &Snapshot, index: usize) -> Vec<String> {
        state
            .references
            .get(&prop_path!["cards", index, "b"])
            .map(|e| e.selection.ids().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    #[test]
    fn insert_into_empty_list() {
        let state = insert_item(&cards(), &empty_state(), &prop_path!["cards"], 0, &entity_sets())
            .unwrap();
        assert_eq!(state.value.to_json(), json!({ "cards": [{ "a": 0 }] }));
        let keys: Vec<_> = state.references.keys().cloned().collect();
        assert_eq!(keys, vec![prop_path!["cards", 0, "b"]]);
        assert_eq!(
            state.references.get(&prop_path!["cards", 0, "b"]),
            Some(&ReferenceEntry::empty("tags", Cardinality::Many))
        );
    }

    #[test]
    fn insert_shifts_later_entries() {
        let state = insert_item(&cards(), &three_cards(), &prop_path!["cards"], 1, &entity_sets())
            .unwrap();
        assert_eq!(
            state.value.to_json(),
            json!({ "cards": [{ "a": 0 }, { "a": 0 }, { "a": 1 }, { "a": 2 }] })
        );
        assert_eq!(tag_of(&state, 0), vec!["0"]);
        assert!(tag_of(&state, 1).is_empty());
        assert_eq!(tag_of(&state, 2), vec!["1"]);
        assert_eq!(tag_of(&state, 3), vec!["2"]);
        assert_eq!(state.references.len(), 4);
    }

    #[test]
    fn remove_drops_and_shifts_entries() {
        let state = remove_item(&three_cards(), &prop_path!["cards"], 0).unwrap();
        assert_eq!(state.value.to_json(), json!({ "cards": [{ "a": 1 }, { "a": 2 }] }));
        assert_eq!(tag_of(&state, 0), vec!["1"]);
        assert_eq!(tag_of(&state, 1), vec!["2"]);
        assert_eq!(state.references.len(), 2);
    }

    #[test]
    fn move_remaps_entries() {
        let forward = move_item(&three_cards(), &prop_path!["cards"], 0, 2).unwrap();
        assert_eq!(
            forward.value.to_json(),
            json!({ "cards": [{ "a": 1 }, { "a": 2 }, { "a": 0 }] })
        );
        assert_eq!(
            (0..3).map(|i| tag_of(&forward, i)).collect::<Vec<_>>(),
            vec![vec!["1"], vec!["2"], vec!["0"]]
        );

        let backward = move_item(&three_cards(), &prop_path!["cards"], 2, 0).unwrap();
        assert_eq!(
            backward.value.to_json(),
            json!({ "cards": [{ "a": 2 }, { "a": 0 }, { "a": 1 }] })
        );
        assert_eq!(
            (0..3).map(|i| tag_of(&backward, i)).collect::<Vec<_>>(),
            vec![vec!["2"], vec!["0"], vec!["1"]]
        );
    }

    #[test]
    fn bounds_and_shape_errors() {
        let state = three_cards();
        let path = prop_path!["cards"];
        assert_eq!(
            insert_item(&cards(), &state, &path, 4, &entity_sets()),
            Err(SyncError::IndexOutOfBounds {
                path: path.clone(),
                index: 4,
                len: 3
            })
        );
        assert!(matches!(
            remove_item(&state, &path, 3),
            Err(SyncError::IndexOutOfBounds { index: 3, .. })
        ));
        assert!(matches!(
            move_item(&state, &path, 0, 3),
            Err(SyncError::IndexOutOfBounds { index: 3, .. })
        ));
        assert_eq!(
            remove_item(&state, &prop_path!["cards", 0, "a"], 0),
            Err(SyncError::NotAList(prop_path!["cards", 0, "a"]))
        );
        assert_eq!(
            remove_item(&state, &prop_path!["nope"], 0),
            Err(SyncError::PathNotFound(prop_path!["nope"]))
        );
    }

    #[test]
    fn entries_outside_the_list_are_untouched() {
        let state = three_cards();
        let state = Snapshot::new(
            state.value.clone(),
            state
                .references
                .set(prop_path!["cardsx"], ReferenceEntry::empty("tags", Cardinality::Many)),
        );
        let removed = remove_item(&state, &prop_path!["cards"], 1).unwrap();
        assert!(removed.references.contains(&prop_path!["cardsx"]));
    }
}
