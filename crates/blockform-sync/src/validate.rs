//! Whole-block validation

use blockform_model::{PropPath, PropSchema, PropValue, ReferencePathStore};

use crate::error::SyncError;
use crate::traverse::traverse;

/// Validity of one editable leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldState {
    /// Absolute path of the leaf
    pub path: PropPath,
    /// Whether the leaf passes its check
    pub valid: bool,
}

/// Validity of every editable leaf, in declaration order
///
/// # Errors
/// Propagates traversal errors
pub fn field_states(
    schema: &PropSchema,
    value: &PropValue,
    store: &ReferencePathStore,
) -> Result<Vec<FieldState>, SyncError> {
    Ok(traverse(schema, &PropPath::root(), value, store)?
        .into_iter()
        .map(|point| FieldState {
            valid: point.is_valid(),
            path: point.path,
        })
        .collect())
}

/// Paths of leaves that fail their check, in declaration order
///
/// # Errors
/// Propagates traversal errors
pub fn failing_paths(
    schema: &PropSchema,
    value: &PropValue,
    store: &ReferencePathStore,
) -> Result<Vec<PropPath>, SyncError> {
    Ok(field_states(schema, value, store)?
        .into_iter()
        .filter(|state| !state.valid)
        .map(|state| state.path)
        .collect())
}
