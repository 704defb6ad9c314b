//! Schema/value co-traversal
//!
//! Walks a schema and its value tree together in declaration order and
//! reports every editable leaf: form fields, conditional discriminants and
//! reference slots. Inline children are never descended.

use blockform_model::{
    FormSchema, PropPath, PropSchema, PropValue, ReferenceEntry, ReferencePathStore,
    ReferenceSlotSchema,
};

use crate::error::SyncError;
use crate::tree::{DISCRIMINANT_KEY, VALUE_KEY};

/// What kind of leaf an edit point is
#[derive(Debug, Clone, Copy)]
pub enum EditKind<'s> {
    /// Plain form field
    Form(&'s FormSchema),
    /// Discriminant of a conditional; edits migrate the branch
    Discriminant(&'s FormSchema),
    /// Reference slot backed by the store
    ReferenceSlot(&'s ReferenceSlotSchema),
}

/// Current content of an edit point
#[derive(Debug, Clone, PartialEq)]
pub enum EditTarget {
    /// Value-tree leaf
    Value(PropValue),
    /// Store entry
    Reference(ReferenceEntry),
}

/// One editable leaf of a block
#[derive(Debug, Clone)]
pub struct EditPoint<'s> {
    /// Absolute path of the leaf
    pub path: PropPath,
    /// Leaf kind with its schema
    pub kind: EditKind<'s>,
    /// Current content
    pub target: EditTarget,
}

impl EditPoint<'_> {
    /// Whether the leaf currently passes its check
    ///
    /// Form leaves run their validator; reference slots fail only when
    /// required and empty.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match (&self.kind, &self.target) {
            (EditKind::Form(form) | EditKind::Discriminant(form), EditTarget::Value(value)) => {
                value.as_leaf().is_some_and(|leaf| form.validate.check(leaf))
            }
            (EditKind::ReferenceSlot(slot), EditTarget::Reference(entry)) => {
                !slot.required || !entry.selection.is_empty()
            }
            _ => false,
        }
    }
}

/// Leaf reached during a walk
pub(crate) enum Leaf<'s, 'v> {
    Form {
        path: PropPath,
        schema: &'s FormSchema,
        value: &'v PropValue,
        discriminant: bool,
    },
    Reference {
        path: PropPath,
        schema: &'s ReferenceSlotSchema,
    },
}

/// Walk `schema` and `value` together, calling `visit` for every leaf
pub(crate) fn walk<'s, 'v>(
    schema: &'s PropSchema,
    path: &PropPath,
    value: Option<&'v PropValue>,
    visit: &mut dyn FnMut(Leaf<'s, 'v>) -> Result<(), SyncError>,
) -> Result<(), SyncError> {
    match schema {
        PropSchema::Form(form) => {
            let value = require(value, path)?;
            if value.as_leaf().is_none() {
                return Err(SyncError::mismatch(path, "expected a form value"));
            }
            visit(Leaf::Form {
                path: path.clone(),
                schema: form,
                value,
                discriminant: false,
            })
        }
        PropSchema::Object(fields) => {
            let value = require(value, path)?;
            let values = value
                .as_object()
                .ok_or_else(|| SyncError::mismatch(path, "expected an object value"))?;
            for (key, field) in fields {
                let child_path = path.child(key.as_str());
                let child_value = values.get(key);
                if field.stores_value() && child_value.is_none() {
                    return Err(SyncError::mismatch(&child_path, "missing field"));
                }
                walk(field, &child_path, child_value, visit)?;
            }
            Ok(())
        }
        PropSchema::Conditional(conditional) => {
            let value = require(value, path)?;
            let (discriminant, inner) = value
                .as_conditional()
                .ok_or_else(|| SyncError::mismatch(path, "expected a conditional value"))?;
            if discriminant.as_leaf().is_none() {
                return Err(SyncError::mismatch(path, "discriminant is not a leaf"));
            }
            let key = value.discriminant_key().unwrap_or_default();
            let branch = conditional
                .branch(&key)
                .ok_or_else(|| SyncError::mismatch(path, format!("unknown discriminant '{key}'")))?;

            visit(Leaf::Form {
                path: path.child(DISCRIMINANT_KEY),
                schema: &conditional.discriminant,
                value: discriminant,
                discriminant: true,
            })?;
            walk(branch, &path.child(VALUE_KEY), Some(inner), visit)
        }
        PropSchema::ReferenceSlot(slot) => visit(Leaf::Reference {
            path: path.clone(),
            schema: slot,
        }),
        PropSchema::List(list) => {
            let value = require(value, path)?;
            let items = value
                .as_list()
                .ok_or_else(|| SyncError::mismatch(path, "expected a list value"))?;
            for (index, item) in items.iter().enumerate() {
                walk(&list.element, &path.child(index), Some(item), visit)?;
            }
            Ok(())
        }
        PropSchema::OpaqueChild => Ok(()),
    }
}

fn require<'v>(value: Option<&'v PropValue>, path: &PropPath) -> Result<&'v PropValue, SyncError> {
    value.ok_or_else(|| SyncError::mismatch(path, "missing value"))
}

/// Every editable leaf under `path`, in declaration order
///
/// # Errors
/// - `SchemaValueMismatch` if `value` does not have the shape of `schema`
/// - `MissingReferenceEntry` if a live slot has no store entry
pub fn traverse<'s>(
    schema: &'s PropSchema,
    path: &PropPath,
    value: &PropValue,
    store: &ReferencePathStore,
) -> Result<Vec<EditPoint<'s>>, SyncError> {
    let mut points = Vec::new();
    walk(schema, path, Some(value), &mut |leaf| {
        let point = match leaf {
            Leaf::Form {
                path,
                schema,
                value,
                discriminant,
            } => EditPoint {
                path,
                kind: if discriminant {
                    EditKind::Discriminant(schema)
                } else {
                    EditKind::Form(schema)
                },
                target: EditTarget::Value(value.clone()),
            },
            Leaf::Reference { path, schema } => {
                let entry = store
                    .get(&path)
                    .cloned()
                    .ok_or_else(|| SyncError::MissingReferenceEntry(path.clone()))?;
                EditPoint {
                    path,
                    kind: EditKind::ReferenceSlot(schema),
                    target: EditTarget::Reference(entry),
                }
            }
        };
        points.push(point);
        Ok(())
    })?;
    Ok(points)
}

/// Live reference slots under `path` with their schemas, in declaration order
///
/// Unlike [`traverse`] this does not consult the store.
///
/// # Errors
/// Returns `SchemaValueMismatch` if `value` does not have the shape of `schema`
pub fn reference_slots<'s>(
    schema: &'s PropSchema,
    path: &PropPath,
    value: &PropValue,
) -> Result<Vec<(PropPath, &'s ReferenceSlotSchema)>, SyncError> {
    let mut slots = Vec::new();
    walk(schema, path, Some(value), &mut |leaf| {
        if let Leaf::Reference { path, schema } = leaf {
            slots.push((path, schema));
        }
        Ok(())
    })?;
    Ok(slots)
}

/// Live reference slot paths under `path`
///
/// # Errors
/// Returns `SchemaValueMismatch` if `value` does not have the shape of `schema`
pub fn reference_paths(
    schema: &PropSchema,
    path: &PropPath,
    value: &PropValue,
) -> Result<Vec<PropPath>, SyncError> {
    Ok(reference_slots(schema, path, value)?
        .into_iter()
        .map(|(path, _)| path)
        .collect())
}
