//! Conditional branch migration
//!
//! Switching a conditional to another branch replaces the branch value with
//! a fresh instance and swaps every reference entry beneath it for the new
//! branch's empty entries. The old branch's data is dropped, not cached:
//! switching back later starts from defaults again.

use blockform_model::{discriminant_key, ConditionalSchema, EntitySetRegistry, PropPath, PropValue};
use serde_json::Value as JsonValue;

use crate::error::SyncError;
use crate::snapshot::Snapshot;
use crate::synthesize::synthesize;
use crate::tree::{self, DISCRIMINANT_KEY, VALUE_KEY};

/// Set the discriminant of the conditional at `path`
///
/// If the new discriminant selects the branch already active only the
/// discriminant leaf changes. Otherwise the branch is migrated.
///
/// # Errors
/// - `SchemaValueMismatch` if `discriminant` selects no declared branch
/// - `NotAConditional` if the value at `path` is not a conditional
/// - `PathNotFound` if `path` is not in the tree
/// - any synthesis error of the new branch; nothing is applied
pub fn switch_branch(
    schema: &ConditionalSchema,
    state: &Snapshot,
    path: &PropPath,
    discriminant: JsonValue,
    registry: &dyn EntitySetRegistry,
) -> Result<Snapshot, SyncError> {
    let new_key = discriminant_key(&discriminant);
    let new_branch = schema.branch(&new_key).ok_or_else(|| {
        SyncError::mismatch(path, format!("unknown discriminant '{new_key}'"))
    })?;

    let current = tree::get(&state.value, path)
        .ok_or_else(|| SyncError::PathNotFound(path.clone()))?;
    let old_key = current
        .discriminant_key()
        .ok_or_else(|| SyncError::NotAConditional(path.clone()))?;

    if old_key == new_key {
        let value = tree::replace(
            &state.value,
            &path.child(DISCRIMINANT_KEY),
            PropValue::leaf(discriminant),
        )?;
        return Ok(Snapshot::new(value, state.references.clone()));
    }

    let value_path = path.child(VALUE_KEY);
    let fresh = synthesize(new_branch, registry)?;

    let value = tree::replace(
        &state.value,
        path,
        PropValue::conditional(discriminant, fresh.value.clone()),
    )?;
    let dropped = state.references.entries_under(&value_path).len();
    let references = state
        .references
        .remove_under(&value_path)
        .insert_all(&value_path, fresh.entries.iter().cloned());

    tracing::debug!(
        path = %path,
        from = %old_key,
        to = %new_key,
        dropped,
        added = fresh.entries.len(),
        "switched conditional branch"
    );

    Ok(Snapshot::new(value, references))
}
