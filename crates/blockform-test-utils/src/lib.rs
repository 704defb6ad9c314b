//! Testing utilities for Blockform workspace
//!
//! Shared schema fixtures and entity registries.

#![allow(missing_docs)]

use std::collections::BTreeMap;

use blockform_model::{
    EntityRef, EntityResolver, EntitySet, FormSchema, PropSchema, ReferenceSlotSchema, Selection,
    StaticEntitySets, Validator,
};

pub fn entity_sets() -> StaticEntitySets {
    StaticEntitySets::new()
        .with_set("posts", "Post")
        .with_set("users", "User")
        .with_set("tags", "Tag")
}

/// `{title: Form(""), link: ReferenceSlot(posts, one, required)}`
pub fn article_schema() -> PropSchema {
    PropSchema::object([
        ("title", PropSchema::form("")),
        (
            "link",
            ReferenceSlotSchema::one("posts").required().with_label("Link").into(),
        ),
    ])
}

/// `List{Object{a: Form(0), b: ReferenceSlot(tags, many)}}`
pub fn card_list_schema() -> PropSchema {
    PropSchema::list(card_schema())
}

pub fn card_schema() -> PropSchema {
    PropSchema::object([
        ("a", PropSchema::form(0)),
        ("b", PropSchema::reference_many("tags")),
    ])
}

/// `Object{x: Conditional(Form("y"), {y: ReferenceSlot(posts, one)})}`
pub fn focus_schema() -> PropSchema {
    PropSchema::object([(
        "x",
        PropSchema::conditional(
            FormSchema::new("y"),
            [("y", PropSchema::reference_one("posts"))],
        ),
    )])
}

/// A richer block exercising every schema kind
///
/// ```text
/// heading: Form("", non-empty)
/// media: Conditional(kind) {
///     image:   { src: Form(""), credit: ReferenceSlot(users, one) }
///     gallery: { slides: List{ caption: Form(""), author: ReferenceSlot(users, one) } }
///     embed:   { url: Form("") }
/// }
/// tags: ReferenceSlot(tags, many)
/// body: OpaqueChild
/// ```
pub fn media_block_schema() -> PropSchema {
    PropSchema::object([
        (
            "heading",
            FormSchema::new("")
                .with_validator(Validator::non_empty_string())
                .with_label("Heading")
                .into(),
        ),
        ("media", media_schema()),
        ("tags", PropSchema::reference_many("tags")),
        ("body", PropSchema::opaque_child()),
    ])
}

pub fn media_schema() -> PropSchema {
    PropSchema::conditional(
        FormSchema::new("image").with_label("Kind"),
        [
            (
                "image",
                PropSchema::object([
                    ("src", PropSchema::form("")),
                    ("credit", PropSchema::reference_one("users")),
                ]),
            ),
            (
                "gallery",
                PropSchema::object([(
                    "slides",
                    PropSchema::list(PropSchema::object([
                        ("caption", PropSchema::form("")),
                        ("author", PropSchema::reference_one("users")),
                    ])),
                )]),
            ),
            ("embed", PropSchema::object([("url", PropSchema::form(""))])),
        ],
    )
}

pub fn one(id: &str) -> Selection {
    Selection::One(Some(EntityRef::new(id)))
}

pub fn many(ids: &[&str]) -> Selection {
    Selection::Many(ids.iter().map(|id| EntityRef::new(*id)).collect())
}

/// In-memory resolver keyed by set name and id
#[derive(Debug, Default)]
pub struct StaticResolver {
    records: BTreeMap<(String, String), EntityRef>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, set: &str, id: &str, label: &str) -> Self {
        self.records.insert(
            (set.to_string(), id.to_string()),
            EntityRef::new(id).with_label(label),
        );
        self
    }
}

impl EntityResolver for StaticResolver {
    fn resolve(&self, set: &EntitySet, ids: &[&str]) -> Vec<EntityRef> {
        ids.iter()
            .filter_map(|id| self.records.get(&(set.name.clone(), (*id).to_string())))
            .cloned()
            .collect()
    }
}
