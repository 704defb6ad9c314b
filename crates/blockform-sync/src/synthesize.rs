//! Fresh-instance synthesis
//!
//! The single source of what a new instance of any schema subtree looks
//! like: its default value plus an empty reference entry for every slot it
//! contains. Used at bootstrap, by list insertion and by branch migration.

use blockform_model::{
    discriminant_key, EntitySetRegistry, PropPath, PropSchema, PropValue, ReferenceEntry,
    ReferenceSlotSchema,
};
use serde_json::Value as JsonValue;

use crate::error::SyncError;
use crate::tree::VALUE_KEY;

/// Default value and reference entries for a schema subtree
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesized {
    /// Default value; the placeholder for slots and inline children
    pub value: PropValue,
    /// Entries keyed by path relative to the subtree root
    pub entries: Vec<(PropPath, ReferenceEntry)>,
}

impl Synthesized {
    /// Entries with paths made absolute under `root`
    #[must_use]
    pub fn rooted_at(&self, root: &PropPath) -> Vec<(PropPath, ReferenceEntry)> {
        self.entries
            .iter()
            .map(|(path, entry)| (root.join(path), entry.clone()))
            .collect()
    }
}

/// Synthesize a fresh instance of `schema`
///
/// # Errors
/// - `UnknownEntitySet` if a slot names a set missing from `registry`
/// - `SchemaValueMismatch` if a conditional declares no branches
pub fn synthesize(
    schema: &PropSchema,
    registry: &dyn EntitySetRegistry,
) -> Result<Synthesized, SyncError> {
    let mut entries = Vec::new();
    let value = synthesize_at(schema, &PropPath::root(), registry, &mut entries)?;
    Ok(Synthesized { value, entries })
}

fn synthesize_at(
    schema: &PropSchema,
    path: &PropPath,
    registry: &dyn EntitySetRegistry,
    entries: &mut Vec<(PropPath, ReferenceEntry)>,
) -> Result<PropValue, SyncError> {
    match schema {
        PropSchema::Form(form) => Ok(PropValue::leaf(form.default_value.clone())),
        PropSchema::Object(fields) => {
            let mut values = Vec::with_capacity(fields.len());
            for (key, field) in fields {
                let value = synthesize_at(field, &path.child(key.as_str()), registry, entries)?;
                if field.stores_value() {
                    values.push((key.clone(), value));
                }
            }
            Ok(PropValue::object(values))
        }
        PropSchema::Conditional(conditional) => {
            let (key, branch) = conditional
                .first_branch()
                .ok_or_else(|| SyncError::mismatch(path, "conditional declares no branches"))?;
            let value = synthesize_at(branch, &path.child(VALUE_KEY), registry, entries)?;
            // keep the discriminant's own type when its default selects the first branch
            let default = &conditional.discriminant.default_value;
            let discriminant = if discriminant_key(default) == key {
                default.clone()
            } else {
                JsonValue::from(key)
            };
            Ok(PropValue::conditional(discriminant, value))
        }
        PropSchema::ReferenceSlot(slot) => {
            entries.push((path.clone(), empty_entry(slot, path, registry)?));
            Ok(PropValue::nothing())
        }
        PropSchema::List(list) => {
            let items = (0..list.min_length)
                .map(|index| synthesize_at(&list.element, &path.child(index), registry, entries))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PropValue::list(items))
        }
        PropSchema::OpaqueChild => Ok(PropValue::nothing()),
    }
}

/// Empty entry for a slot, checking its entity set is known
///
/// # Errors
/// Returns `UnknownEntitySet` if `registry` lacks the slot's set
pub fn empty_entry(
    slot: &ReferenceSlotSchema,
    path: &PropPath,
    registry: &dyn EntitySetRegistry,
) -> Result<ReferenceEntry, SyncError> {
    if !registry.contains(&slot.entity_set) {
        return Err(SyncError::UnknownEntitySet {
            path: path.clone(),
            entity_set: slot.entity_set.clone(),
        });
    }
    Ok(ReferenceEntry::empty(slot.entity_set.clone(), slot.cardinality))
}
