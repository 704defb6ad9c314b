//! Path-addressed reads and copy-on-write replacement
//!
//! Conditional values are addressed through two fixed keys,
//! `"discriminant"` and `"value"`, the same keys traversal uses when it
//! extends paths.

use blockform_model::{
    FormSchema, PathSegment, PropPath, PropSchema, PropValue, ValueNode,
};

use crate::error::SyncError;

/// Key addressing a conditional's discriminant leaf
pub const DISCRIMINANT_KEY: &str = "discriminant";

/// Key addressing a conditional's branch value
pub const VALUE_KEY: &str = "value";

/// Subtree at `path`, if present
#[must_use]
pub fn get<'v>(tree: &'v PropValue, path: &PropPath) -> Option<&'v PropValue> {
    path.iter()
        .try_fold(tree, |node, segment| child(node, segment))
}

fn child<'v>(node: &'v PropValue, segment: &PathSegment) -> Option<&'v PropValue> {
    match (node.node(), segment) {
        (ValueNode::Object(fields), PathSegment::Key(key)) => fields.get(key),
        (ValueNode::Conditional { discriminant, .. }, PathSegment::Key(key))
            if key == DISCRIMINANT_KEY =>
        {
            Some(discriminant)
        }
        (ValueNode::Conditional { value, .. }, PathSegment::Key(key)) if key == VALUE_KEY => {
            Some(value)
        }
        (ValueNode::List(items), PathSegment::Index(index)) => items.get(*index),
        _ => None,
    }
}

/// New tree with the subtree at `path` replaced by `new_value`
///
/// Every ancestor along `path` is rebuilt; every other subtree is shared
/// with `tree`. `tree` itself is left untouched.
///
/// # Errors
/// Returns `PathNotFound` if any segment of `path` does not exist
pub fn replace(
    tree: &PropValue,
    path: &PropPath,
    new_value: PropValue,
) -> Result<PropValue, SyncError> {
    replace_at(tree, path.segments(), path, new_value)
}

fn replace_at(
    node: &PropValue,
    segments: &[PathSegment],
    full_path: &PropPath,
    new_value: PropValue,
) -> Result<PropValue, SyncError> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(new_value);
    };
    let not_found = || SyncError::PathNotFound(full_path.clone());

    let rebuilt = match (node.node(), segment) {
        (ValueNode::Object(fields), PathSegment::Key(key)) => {
            let current = fields.get(key).ok_or_else(not_found)?;
            let updated = replace_at(current, rest, full_path, new_value)?;
            ValueNode::Object(fields.update(key.clone(), updated))
        }
        (
            ValueNode::Conditional {
                discriminant,
                value,
            },
            PathSegment::Key(key),
        ) => {
            if key == DISCRIMINANT_KEY {
                ValueNode::Conditional {
                    discriminant: replace_at(discriminant, rest, full_path, new_value)?,
                    value: value.clone(),
                }
            } else if key == VALUE_KEY {
                ValueNode::Conditional {
                    discriminant: discriminant.clone(),
                    value: replace_at(value, rest, full_path, new_value)?,
                }
            } else {
                return Err(not_found());
            }
        }
        (ValueNode::List(items), PathSegment::Index(index)) => {
            let current = items.get(*index).ok_or_else(not_found)?;
            let updated = replace_at(current, rest, full_path, new_value)?;
            ValueNode::List(items.update(*index, updated))
        }
        _ => return Err(not_found()),
    };
    Ok(PropValue::from_node(rebuilt))
}

/// Schema node governing a path
#[derive(Debug, Clone, Copy)]
pub enum SchemaNode<'s> {
    /// Any prop node
    Prop(&'s PropSchema),
    /// Discriminant leaf of a conditional
    Discriminant(&'s FormSchema),
}

/// Resolve which schema node governs `path`
///
/// Conditional branches are followed through the current discriminant in
/// `tree`, so the answer depends on the value as well as the schema.
///
/// # Errors
/// - `PathNotFound` if the path leaves the schema or the value tree
/// - `SchemaValueMismatch` if a discriminant along the way selects no branch
pub fn schema_at<'s>(
    schema: &'s PropSchema,
    tree: &PropValue,
    path: &PropPath,
) -> Result<SchemaNode<'s>, SyncError> {
    let not_found = || SyncError::PathNotFound(path.clone());
    let mut current_schema = schema;
    let mut current_value = Some(tree);

    for (depth, segment) in path.iter().enumerate() {
        let at = PropPath::new(path.segments()[..depth].to_vec());
        match (current_schema, segment) {
            (PropSchema::Object(fields), PathSegment::Key(key)) => {
                current_schema = fields.get(key).ok_or_else(not_found)?;
                current_value = current_value.and_then(|v| v.field(key));
            }
            (PropSchema::Conditional(conditional), PathSegment::Key(key)) => {
                let value = current_value.ok_or_else(not_found)?;
                if key == DISCRIMINANT_KEY {
                    if depth + 1 != path.len() {
                        return Err(not_found());
                    }
                    return Ok(SchemaNode::Discriminant(&conditional.discriminant));
                }
                if key != VALUE_KEY {
                    return Err(not_found());
                }
                let branch_key = value
                    .discriminant_key()
                    .ok_or_else(|| SyncError::mismatch(&at, "expected a conditional value"))?;
                current_schema = conditional.branch(&branch_key).ok_or_else(|| {
                    SyncError::mismatch(&at, format!("unknown discriminant '{branch_key}'"))
                })?;
                current_value = value.as_conditional().map(|(_, inner)| inner);
            }
            (PropSchema::List(list), PathSegment::Index(index)) => {
                current_value = current_value.and_then(|v| v.item(*index));
                if current_value.is_none() {
                    return Err(not_found());
                }
                current_schema = list.element.as_ref();
            }
            _ => return Err(not_found()),
        }
    }
    Ok(SchemaNode::Prop(current_schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockform_model::prop_path;
    use blockform_test_utils::media_block_schema;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> PropValue {
        PropValue::object([
            ("title", PropValue::leaf("a")),
            (
                "items",
                PropValue::list([
                    PropValue::object([("a", PropValue::leaf(0))]),
                    PropValue::object([("a", PropValue::leaf(1))]),
                ]),
            ),
            (
                "kind",
                PropValue::conditional("image", PropValue::object([("src", PropValue::leaf(""))])),
            ),
        ])
    }

    #[test]
    fn get_follows_keys_indices_and_conditional_parts() {
        let tree = sample();
        assert_eq!(
            get(&tree, &prop_path!["items", 1, "a"]).and_then(PropValue::as_leaf),
            Some(&json!(1))
        );
        assert_eq!(
            get(&tree, &prop_path!["kind", "discriminant"]).and_then(PropValue::as_leaf),
            Some(&json!("image"))
        );
        assert_eq!(
            get(&tree, &prop_path!["kind", "value", "src"]).and_then(PropValue::as_leaf),
            Some(&json!(""))
        );
        assert!(get(&tree, &prop_path!["items", 2]).is_none());
        assert!(get(&tree, &prop_path!["items", "0"]).is_none());
        assert!(get(&tree, &prop_path![]).is_some_and(|root| root.ptr_eq(&tree)));
    }

    #[test]
    fn replace_shares_siblings() {
        let tree = sample();
        let updated = replace(&tree, &prop_path!["items", 1, "a"], PropValue::leaf(9)).unwrap();

        assert_eq!(
            get(&updated, &prop_path!["items", 1, "a"]).and_then(PropValue::as_leaf),
            Some(&json!(9))
        );
        // untouched siblings are the same nodes
        let old_first = get(&tree, &prop_path!["items", 0]).unwrap();
        let new_first = get(&updated, &prop_path!["items", 0]).unwrap();
        assert!(old_first.ptr_eq(new_first));
        assert!(get(&tree, &prop_path!["kind"])
            .unwrap()
            .ptr_eq(get(&updated, &prop_path!["kind"]).unwrap()));
        // ancestors are new
        assert!(!tree.ptr_eq(&updated));
        assert!(!get(&tree, &prop_path!["items"])
            .unwrap()
            .ptr_eq(get(&updated, &prop_path!["items"]).unwrap()));
        // input untouched
        assert_eq!(
            get(&tree, &prop_path!["items", 1, "a"]).and_then(PropValue::as_leaf),
            Some(&json!(1))
        );
    }

    #[test]
    fn replace_is_idempotent() {
        let tree = sample();
        let path = prop_path!["kind", "value", "src"];
        let once = replace(&tree, &path, PropValue::leaf("x.png")).unwrap();
        let twice = replace(&once, &path, PropValue::leaf("x.png")).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn replace_root_returns_new_value() {
        let tree = sample();
        let replaced = replace(&tree, &PropPath::root(), PropValue::leaf(1)).unwrap();
        assert_eq!(replaced, PropValue::leaf(1));
    }

    #[test]
    fn replace_missing_path_fails() {
        let tree = sample();
        for path in [
            prop_path!["nope"],
            prop_path!["items", 5],
            prop_path!["items", "a"],
            prop_path!["kind", "other"],
            prop_path!["title", "deeper"],
        ] {
            assert_eq!(
                replace(&tree, &path, PropValue::leaf(0)),
                Err(SyncError::PathNotFound(path.clone()))
            );
        }
    }

    #[test]
    fn schema_at_follows_active_branch() {
        let schema = media_block_schema();
        let tree = PropValue::object([
            ("heading", PropValue::leaf("")),
            (
                "media",
                PropValue::conditional(
                    "gallery",
                    PropValue::object([(
                        "slides",
                        PropValue::list([PropValue::object([("caption", PropValue::leaf(""))])]),
                    )]),
                ),
            ),
        ]);

        let node = schema_at(&schema, &tree, &prop_path!["media", "value", "slides", 0, "author"])
            .unwrap();
        assert!(matches!(node, SchemaNode::Prop(PropSchema::ReferenceSlot(_))));

        let node = schema_at(&schema, &tree, &prop_path!["media", "discriminant"]).unwrap();
        assert!(matches!(node, SchemaNode::Discriminant(_)));

        let node = schema_at(&schema, &tree, &prop_path!["media"]).unwrap();
        assert!(matches!(node, SchemaNode::Prop(PropSchema::Conditional(_))));

        assert!(matches!(
            schema_at(&schema, &tree, &prop_path!["media", "value", "src"]),
            Err(SyncError::PathNotFound(_))
        ));
        assert!(matches!(
            schema_at(&schema, &tree, &prop_path!["media", "value", "slides", 3]),
            Err(SyncError::PathNotFound(_))
        ));
    }

    #[test]
    fn schema_at_reports_unknown_discriminant() {
        let schema = media_block_schema();
        let tree = PropValue::object([
            ("heading", PropValue::leaf("")),
            ("media", PropValue::conditional("video", PropValue::nothing())),
        ]);
        let err = schema_at(&schema, &tree, &prop_path!["media", "value"]).unwrap_err();
        assert_eq!(
            err,
            SyncError::mismatch(&prop_path!["media"], "unknown discriminant 'video'")
        );
    }
}
