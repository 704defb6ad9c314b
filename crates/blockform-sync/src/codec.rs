//! Schema-directed JSON decoding of persisted values
//!
//! Hosts persist value trees as plain JSON (see [`PropValue::to_json`]).
//! Decoding needs the schema to tell a conditional's `{discriminant, value}`
//! object apart from an ordinary object and to know which keys are slots.
//! Keys the schema does not declare are ignored; declared keys that store a
//! value are required.

use blockform_model::{discriminant_key, PropPath, PropSchema, PropValue};
use serde_json::Value as JsonValue;

use crate::error::SyncError;
use crate::tree::{DISCRIMINANT_KEY, VALUE_KEY};

/// Decode a persisted JSON value against `schema`
///
/// # Errors
/// Returns `SchemaValueMismatch` if `json` does not have the shape of
/// `schema`
pub fn decode(schema: &PropSchema, json: &JsonValue) -> Result<PropValue, SyncError> {
    decode_at(schema, &PropPath::root(), json)
}

fn decode_at(schema: &PropSchema, path: &PropPath, json: &JsonValue) -> Result<PropValue, SyncError> {
    match schema {
        PropSchema::Form(_) => Ok(PropValue::leaf(json.clone())),
        PropSchema::ReferenceSlot(_) | PropSchema::OpaqueChild => Ok(PropValue::nothing()),
        PropSchema::Object(fields) => {
            let object = json
                .as_object()
                .ok_or_else(|| SyncError::mismatch(path, "expected an object value"))?;
            let mut values = Vec::with_capacity(fields.len());
            for (key, field) in fields {
                if !field.stores_value() {
                    continue;
                }
                let child_path = path.child(key.as_str());
                let child = object
                    .get(key)
                    .ok_or_else(|| SyncError::mismatch(&child_path, "missing field"))?;
                values.push((key.clone(), decode_at(field, &child_path, child)?));
            }
            Ok(PropValue::object(values))
        }
        PropSchema::Conditional(conditional) => {
            let object = json
                .as_object()
                .ok_or_else(|| SyncError::mismatch(path, "expected a conditional value"))?;
            let discriminant = object
                .get(DISCRIMINANT_KEY)
                .filter(|d| !d.is_object() && !d.is_array() && !d.is_null())
                .ok_or_else(|| SyncError::mismatch(path, "discriminant is not a leaf"))?;
            let key = discriminant_key(discriminant);
            let branch = conditional
                .branch(&key)
                .ok_or_else(|| SyncError::mismatch(path, format!("unknown discriminant '{key}'")))?;

            let value_path = path.child(VALUE_KEY);
            let value = if branch.stores_value() {
                let inner = object
                    .get(VALUE_KEY)
                    .ok_or_else(|| SyncError::mismatch(&value_path, "missing field"))?;
                decode_at(branch, &value_path, inner)?
            } else {
                PropValue::nothing()
            };
            Ok(PropValue::conditional(discriminant.clone(), value))
        }
        PropSchema::List(list) => {
            let items = json
                .as_array()
                .ok_or_else(|| SyncError::mismatch(path, "expected a list value"))?;
            let decoded = items
                .iter()
                .enumerate()
                .map(|(index, item)| decode_at(&list.element, &path.child(index), item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PropValue::list(decoded))
        }
    }
}
