//! Prop schemas
//!
//! A component block declares its props as a tree of [`PropSchema`] nodes.
//! Field order in objects is declaration order and drives traversal and
//! focus resolution.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Predicate deciding whether a form leaf holds an acceptable value
#[derive(Clone)]
pub struct Validator(Arc<dyn Fn(&JsonValue) -> bool + Send + Sync>);

impl Validator {
    /// Wrap a predicate
    pub fn new(predicate: impl Fn(&JsonValue) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Accepts every value
    #[must_use]
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    /// Accepts strings with at least one non-whitespace character
    #[must_use]
    pub fn non_empty_string() -> Self {
        Self::new(|value| value.as_str().is_some_and(|s| !s.trim().is_empty()))
    }

    /// Run the predicate
    #[inline]
    #[must_use]
    pub fn check(&self, value: &JsonValue) -> bool {
        (self.0)(value)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::always()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// Scalar leaf edited by a host-provided input
#[derive(Debug, Clone)]
pub struct FormSchema {
    /// Value a fresh instance starts with
    pub default_value: JsonValue,
    /// Acceptance check run on commit
    pub validate: Validator,
    /// Display label
    pub label: Option<String>,
}

impl FormSchema {
    /// Form leaf with the given default, accepting any value
    pub fn new(default_value: impl Into<JsonValue>) -> Self {
        Self {
            default_value: default_value.into(),
            validate: Validator::always(),
            label: None,
        }
    }

    /// With validator
    #[must_use]
    pub fn with_validator(mut self, validate: Validator) -> Self {
        self.validate = validate;
        self
    }

    /// With label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Discriminated union of branches
///
/// The discriminant is always a form leaf; its value, read as an object key,
/// selects the active branch.
#[derive(Debug, Clone)]
pub struct ConditionalSchema {
    /// Field selecting the active branch
    pub discriminant: FormSchema,
    /// Branch schemas keyed by discriminant value, in declaration order
    pub values: IndexMap<String, PropSchema>,
}

impl ConditionalSchema {
    /// First declared branch, used for fresh instances
    #[must_use]
    pub fn first_branch(&self) -> Option<(&str, &PropSchema)> {
        self.values
            .first()
            .map(|(key, schema)| (key.as_str(), schema))
    }

    /// Branch for a discriminant key
    #[inline]
    #[must_use]
    pub fn branch(&self, key: &str) -> Option<&PropSchema> {
        self.values.get(key)
    }
}

/// How many entities a reference slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// Zero or one entity
    One,
    /// Ordered set of entities
    Many,
}

/// Selection of external entities, stored outside the value tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSlotSchema {
    /// Name of the entity set the selection draws from
    pub entity_set: String,
    /// One or many
    pub cardinality: Cardinality,
    /// Display label
    pub label: Option<String>,
    /// Whether commit requires a non-empty selection
    pub required: bool,
    /// Extra field selection forwarded to the entity resolver, uninterpreted
    pub selection: Option<String>,
}

impl ReferenceSlotSchema {
    /// Slot holding at most one entity
    pub fn one(entity_set: impl Into<String>) -> Self {
        Self::with_cardinality(entity_set, Cardinality::One)
    }

    /// Slot holding an ordered set of entities
    pub fn many(entity_set: impl Into<String>) -> Self {
        Self::with_cardinality(entity_set, Cardinality::Many)
    }

    fn with_cardinality(entity_set: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            entity_set: entity_set.into(),
            cardinality,
            label: None,
            required: false,
            selection: None,
        }
    }

    /// Mark as required on commit
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// With label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// With extra field selection
    #[must_use]
    pub fn with_selection(mut self, selection: impl Into<String>) -> Self {
        self.selection = Some(selection.into());
        self
    }
}

/// Repeated element schema
#[derive(Debug, Clone)]
pub struct ListSchema {
    /// Schema of every item
    pub element: Box<PropSchema>,
    /// Items a fresh instance starts with
    pub min_length: usize,
}

/// One node of a block's prop schema
#[derive(Debug, Clone)]
pub enum PropSchema {
    /// Scalar leaf
    Form(FormSchema),
    /// Ordered fields
    Object(IndexMap<String, PropSchema>),
    /// Discriminated branches
    Conditional(ConditionalSchema),
    /// External entity selection, no value-tree storage
    ReferenceSlot(ReferenceSlotSchema),
    /// Repeated element
    List(ListSchema),
    /// Inline child owned by the surrounding document
    OpaqueChild,
}

/// Kind tag of a [`PropSchema`], for logging and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Form,
    Object,
    Conditional,
    ReferenceSlot,
    List,
    OpaqueChild,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Form => "form",
            Self::Object => "object",
            Self::Conditional => "conditional",
            Self::ReferenceSlot => "referenceSlot",
            Self::List => "list",
            Self::OpaqueChild => "opaqueChild",
        };
        f.write_str(name)
    }
}

impl PropSchema {
    /// Form leaf with the given default
    pub fn form(default_value: impl Into<JsonValue>) -> Self {
        Self::Form(FormSchema::new(default_value))
    }

    /// Object from `(key, schema)` pairs in declaration order
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, PropSchema)>,
        K: Into<String>,
    {
        Self::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Conditional from a discriminant and `(key, branch)` pairs
    pub fn conditional<I, K>(discriminant: FormSchema, values: I) -> Self
    where
        I: IntoIterator<Item = (K, PropSchema)>,
        K: Into<String>,
    {
        Self::Conditional(ConditionalSchema {
            discriminant,
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    /// Single-entity reference slot
    pub fn reference_one(entity_set: impl Into<String>) -> Self {
        Self::ReferenceSlot(ReferenceSlotSchema::one(entity_set))
    }

    /// Multi-entity reference slot
    pub fn reference_many(entity_set: impl Into<String>) -> Self {
        Self::ReferenceSlot(ReferenceSlotSchema::many(entity_set))
    }

    /// List starting empty
    #[must_use]
    pub fn list(element: PropSchema) -> Self {
        Self::list_with_min(element, 0)
    }

    /// List starting with `min_length` fresh items
    #[must_use]
    pub fn list_with_min(element: PropSchema, min_length: usize) -> Self {
        Self::List(ListSchema {
            element: Box::new(element),
            min_length,
        })
    }

    /// Inline child placeholder
    #[must_use]
    pub fn opaque_child() -> Self {
        Self::OpaqueChild
    }

    /// Kind tag
    #[must_use]
    pub fn kind(&self) -> SchemaKind {
        match self {
            Self::Form(_) => SchemaKind::Form,
            Self::Object(_) => SchemaKind::Object,
            Self::Conditional(_) => SchemaKind::Conditional,
            Self::ReferenceSlot(_) => SchemaKind::ReferenceSlot,
            Self::List(_) => SchemaKind::List,
            Self::OpaqueChild => SchemaKind::OpaqueChild,
        }
    }

    /// Whether instances of this schema occupy a slot in the value tree
    #[must_use]
    pub fn stores_value(&self) -> bool {
        !matches!(self, Self::ReferenceSlot(_) | Self::OpaqueChild)
    }
}

impl From<FormSchema> for PropSchema {
    fn from(schema: FormSchema) -> Self {
        Self::Form(schema)
    }
}

impl From<ReferenceSlotSchema> for PropSchema {
    fn from(schema: ReferenceSlotSchema) -> Self {
        Self::ReferenceSlot(schema)
    }
}

/// Branch key selected by a discriminant value
///
/// Mirrors how a JSON object key is formed from a scalar: strings are used
/// as-is, other scalars by their JSON text.
#[must_use]
pub fn discriminant_key(discriminant: &JsonValue) -> String {
    match discriminant {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_keeps_declaration_order() {
        let schema = PropSchema::object([
            ("zeta", PropSchema::form(0)),
            ("alpha", PropSchema::form(1)),
            ("mid", PropSchema::opaque_child()),
        ]);
        let PropSchema::Object(fields) = schema else {
            panic!("expected object");
        };
        let keys: Vec<_> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn conditional_first_branch() {
        let schema = ConditionalSchema {
            discriminant: FormSchema::new("b"),
            values: [
                ("b".to_string(), PropSchema::form(1)),
                ("a".to_string(), PropSchema::form(2)),
            ]
            .into_iter()
            .collect(),
        };
        assert_eq!(schema.first_branch().map(|(k, _)| k), Some("b"));
        assert!(schema.branch("a").is_some());
        assert!(schema.branch("c").is_none());
    }

    #[test]
    fn validators() {
        assert!(Validator::always().check(&json!(null)));
        let non_empty = Validator::non_empty_string();
        assert!(non_empty.check(&json!("x")));
        assert!(!non_empty.check(&json!("  ")));
        assert!(!non_empty.check(&json!(3)));
    }

    #[test]
    fn discriminant_keys() {
        assert_eq!(discriminant_key(&json!("image")), "image");
        assert_eq!(discriminant_key(&json!(true)), "true");
        assert_eq!(discriminant_key(&json!(2)), "2");
    }

    #[test]
    fn stores_value() {
        assert!(PropSchema::form(0).stores_value());
        assert!(PropSchema::list(PropSchema::form(0)).stores_value());
        assert!(!PropSchema::reference_one("posts").stores_value());
        assert!(!PropSchema::opaque_child().stores_value());
    }

    #[test]
    fn reference_slot_builder() {
        let slot = ReferenceSlotSchema::many("tags")
            .required()
            .with_label("Tags")
            .with_selection("id name");
        assert_eq!(slot.cardinality, Cardinality::Many);
        assert!(slot.required);
        assert_eq!(slot.label.as_deref(), Some("Tags"));
        assert_eq!(slot.selection.as_deref(), Some("id name"));
    }
}
