//! First-focusable-leaf resolution
//!
//! Picks where the cursor lands when a block is opened: the first form
//! field, discriminant or reference slot in declaration order. Inline
//! children are skipped because the surrounding document owns their focus.

use blockform_model::{PropPath, PropSchema, PropValue};

use crate::error::SyncError;
use crate::tree::DISCRIMINANT_KEY;

/// Path of the first focusable leaf under `path`, or `None` if there is none
///
/// # Errors
/// Returns `SchemaValueMismatch` if a node on the way does not have the
/// shape of its schema or a discriminant selects no branch
pub fn resolve(
    schema: &PropSchema,
    path: &PropPath,
    value: &PropValue,
) -> Result<Option<PropPath>, SyncError> {
    resolve_at(schema, path, Some(value))
}

fn resolve_at(
    schema: &PropSchema,
    path: &PropPath,
    value: Option<&PropValue>,
) -> Result<Option<PropPath>, SyncError> {
    match schema {
        PropSchema::Form(_) | PropSchema::ReferenceSlot(_) => Ok(Some(path.clone())),
        PropSchema::OpaqueChild => Ok(None),
        PropSchema::Object(fields) => {
            let value = value.ok_or_else(|| SyncError::mismatch(path, "missing value"))?;
            let values = value
                .as_object()
                .ok_or_else(|| SyncError::mismatch(path, "expected an object value"))?;
            for (key, field) in fields {
                let child_path = path.child(key.as_str());
                let child_value = values.get(key);
                if field.stores_value() && child_value.is_none() {
                    return Err(SyncError::mismatch(&child_path, "missing field"));
                }
                if let Some(found) = resolve_at(field, &child_path, child_value)? {
                    return Ok(Some(found));
                }
            }
            Ok(None)
        }
        PropSchema::Conditional(conditional) => {
            let value = value.ok_or_else(|| SyncError::mismatch(path, "missing value"))?;
            let key = value
                .discriminant_key()
                .ok_or_else(|| SyncError::mismatch(path, "expected a conditional value"))?;
            if conditional.branch(&key).is_none() {
                return Err(SyncError::mismatch(
                    path,
                    format!("unknown discriminant '{key}'"),
                ));
            }
            // discriminant is a form leaf
            Ok(Some(path.child(DISCRIMINANT_KEY)))
        }
        PropSchema::List(list) => {
            let value = value.ok_or_else(|| SyncError::mismatch(path, "missing value"))?;
            let items = value
                .as_list()
                .ok_or_else(|| SyncError::mismatch(path, "expected a list value"))?;
            for (index, item) in items.iter().enumerate() {
                if let Some(found) = resolve_at(&list.element, &path.child(index), Some(item))? {
                    return Ok(Some(found));
                }
            }
            Ok(None)
        }
    }
}
