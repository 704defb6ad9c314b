//! Prop value trees
//!
//! [`PropValue`] is an immutable, reference-counted node. Edits build new
//! ancestors and reuse every untouched subtree, so old versions stay valid
//! and cheap to keep for undo.

use std::sync::Arc;

use im::{OrdMap, Vector};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::schema::discriminant_key;

/// Shape of one value-tree node
#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode {
    /// Placeholder for schema nodes without value storage
    Nothing,
    /// Form leaf
    Leaf(JsonValue),
    /// Object fields
    Object(OrdMap<String, PropValue>),
    /// Active conditional branch
    Conditional {
        /// Leaf selecting the branch
        discriminant: PropValue,
        /// Value of the selected branch
        value: PropValue,
    },
    /// List items
    List(Vector<PropValue>),
}

/// Shared handle to a value-tree node
#[derive(Debug, Clone, PartialEq)]
pub struct PropValue(Arc<ValueNode>);

impl PropValue {
    /// Wrap a node
    #[inline]
    #[must_use]
    pub fn from_node(node: ValueNode) -> Self {
        Self(Arc::new(node))
    }

    /// Placeholder for reference slots and inline children
    #[inline]
    #[must_use]
    pub fn nothing() -> Self {
        Self::from_node(ValueNode::Nothing)
    }

    /// Form leaf
    #[inline]
    pub fn leaf(value: impl Into<JsonValue>) -> Self {
        Self::from_node(ValueNode::Leaf(value.into()))
    }

    /// Object from `(key, value)` pairs
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, PropValue)>,
        K: Into<String>,
    {
        Self::from_node(ValueNode::Object(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Conditional with a discriminant leaf and branch value
    pub fn conditional(discriminant: impl Into<JsonValue>, value: PropValue) -> Self {
        Self::from_node(ValueNode::Conditional {
            discriminant: Self::leaf(discriminant),
            value,
        })
    }

    /// List from items
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = PropValue>,
    {
        Self::from_node(ValueNode::List(items.into_iter().collect()))
    }

    /// Underlying node
    #[inline]
    #[must_use]
    pub fn node(&self) -> &ValueNode {
        &self.0
    }

    /// Whether both handles point at the same node
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether this is the placeholder node
    #[inline]
    #[must_use]
    pub fn is_nothing(&self) -> bool {
        matches!(self.node(), ValueNode::Nothing)
    }

    /// Leaf value
    #[must_use]
    pub fn as_leaf(&self) -> Option<&JsonValue> {
        match self.node() {
            ValueNode::Leaf(value) => Some(value),
            _ => None,
        }
    }

    /// Object fields
    #[must_use]
    pub fn as_object(&self) -> Option<&OrdMap<String, PropValue>> {
        match self.node() {
            ValueNode::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// List items
    #[must_use]
    pub fn as_list(&self) -> Option<&Vector<PropValue>> {
        match self.node() {
            ValueNode::List(items) => Some(items),
            _ => None,
        }
    }

    /// Conditional parts as `(discriminant, value)`
    #[must_use]
    pub fn as_conditional(&self) -> Option<(&PropValue, &PropValue)> {
        match self.node() {
            ValueNode::Conditional {
                discriminant,
                value,
            } => Some((discriminant, value)),
            _ => None,
        }
    }

    /// Branch key of a conditional value
    #[must_use]
    pub fn discriminant_key(&self) -> Option<String> {
        self.as_conditional()
            .and_then(|(discriminant, _)| discriminant.as_leaf())
            .map(discriminant_key)
    }

    /// Object field by key
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&PropValue> {
        self.as_object().and_then(|fields| fields.get(key))
    }

    /// List item by index
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&PropValue> {
        self.as_list().and_then(|items| items.get(index))
    }

    /// Plain JSON form of the tree
    ///
    /// Placeholder nodes render as `null` at the root and are omitted from
    /// objects and conditionals.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self.node() {
            ValueNode::Nothing => JsonValue::Null,
            ValueNode::Leaf(value) => value.clone(),
            ValueNode::Object(fields) => {
                let map: JsonMap<String, JsonValue> = fields
                    .iter()
                    .filter(|(_, v)| !v.is_nothing())
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                JsonValue::Object(map)
            }
            ValueNode::Conditional {
                discriminant,
                value,
            } => {
                let mut map = JsonMap::new();
                map.insert("discriminant".to_string(), discriminant.to_json());
                if !value.is_nothing() {
                    map.insert("value".to_string(), value.to_json());
                }
                JsonValue::Object(map)
            }
            ValueNode::List(items) => {
                JsonValue::Array(items.iter().map(PropValue::to_json).collect())
            }
        }
    }
}

impl From<ValueNode> for PropValue {
    fn from(node: ValueNode) -> Self {
        Self::from_node(node)
    }
}
