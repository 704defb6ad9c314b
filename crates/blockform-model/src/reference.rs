//! External entity references and the path-keyed side-store
//!
//! Reference slots keep their selections here instead of in the value tree.
//! Entries are keyed by the structural [`PropPath`] of the slot; the store is
//! copy-on-write over an ordered persistent map, so every paths-under-prefix
//! query is a range scan.

use std::collections::BTreeMap;
use std::fmt;

use im::OrdMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::ModelError;
use crate::path::PropPath;
use crate::schema::Cardinality;

/// One selected entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity identifier
    pub id: String,
    /// Human-readable label, if already resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Extra fields fetched with the entity
    #[serde(default, skip_serializing_if = "JsonValue::is_null")]
    pub data: JsonValue,
}

impl EntityRef {
    /// Reference by id only
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            data: JsonValue::Null,
        }
    }

    /// With label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// With extra data
    #[must_use]
    pub fn with_data(mut self, data: JsonValue) -> Self {
        self.data = data;
        self
    }

    /// Label to render, falling back to the id
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// Current selection of a reference slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    /// Single-entity slot; `None` when unselected
    One(Option<EntityRef>),
    /// Multi-entity slot, in selection order
    Many(Vec<EntityRef>),
}

impl Selection {
    /// Empty selection for a cardinality
    #[must_use]
    pub fn empty(cardinality: Cardinality) -> Self {
        match cardinality {
            Cardinality::One => Self::One(None),
            Cardinality::Many => Self::Many(Vec::new()),
        }
    }

    /// Whether nothing is selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(selected) => selected.is_none(),
            Self::Many(selected) => selected.is_empty(),
        }
    }

    /// Cardinality this selection satisfies
    #[must_use]
    pub fn cardinality(&self) -> Cardinality {
        match self {
            Self::One(_) => Cardinality::One,
            Self::Many(_) => Cardinality::Many,
        }
    }

    /// Selected entities in order
    #[must_use]
    pub fn entities(&self) -> Vec<&EntityRef> {
        match self {
            Self::One(selected) => selected.iter().collect(),
            Self::Many(selected) => selected.iter().collect(),
        }
    }

    /// Ids of selected entities in order
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.entities().into_iter().map(|e| e.id.as_str()).collect()
    }

    /// Same selection with entities replaced by their `resolved` records
    ///
    /// Order is kept; entities missing from `resolved` stay as they are.
    #[must_use]
    pub fn with_resolved(&self, resolved: &[EntityRef]) -> Self {
        let lookup = |entity: &EntityRef| {
            resolved
                .iter()
                .find(|r| r.id == entity.id)
                .unwrap_or(entity)
                .clone()
        };
        match self {
            Self::One(selected) => Self::One(selected.as_ref().map(lookup)),
            Self::Many(selected) => Self::Many(selected.iter().map(lookup).collect()),
        }
    }
}

/// Store entry for one reference slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceEntry {
    /// Entity set the selection draws from
    pub entity_set: String,
    /// Selected entities
    pub selection: Selection,
}

impl ReferenceEntry {
    /// Entry with the given selection
    pub fn new(entity_set: impl Into<String>, selection: Selection) -> Self {
        Self {
            entity_set: entity_set.into(),
            selection,
        }
    }

    /// Entry with nothing selected
    pub fn empty(entity_set: impl Into<String>, cardinality: Cardinality) -> Self {
        Self::new(entity_set, Selection::empty(cardinality))
    }
}

/// Path-keyed table of reference selections
///
/// # Invariants
/// - Keys are exactly the live reference-slot paths of the value tree it
///   accompanies (maintained by the sync layer, not by this type)
/// - Every operation returns a new store; `self` is never changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferencePathStore {
    entries: OrdMap<PropPath, ReferenceEntry>,
}

impl ReferencePathStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry at a path
    #[inline]
    #[must_use]
    pub fn get(&self, path: &PropPath) -> Option<&ReferenceEntry> {
        self.entries.get(path)
    }

    /// Whether a path has an entry
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &PropPath) -> bool {
        self.entries.contains_key(path)
    }

    /// Store with `entry` at `path`
    #[must_use]
    pub fn set(&self, path: PropPath, entry: ReferenceEntry) -> Self {
        Self {
            entries: self.entries.update(path, entry),
        }
    }

    /// Store without the entry at `path`
    #[must_use]
    pub fn remove(&self, path: &PropPath) -> Self {
        Self {
            entries: self.entries.without(path),
        }
    }

    /// Entries at or beneath `prefix`, in path order
    #[must_use]
    pub fn entries_under(&self, prefix: &PropPath) -> Vec<(PropPath, ReferenceEntry)> {
        self.entries
            .range(prefix.clone()..)
            .take_while(|(path, _)| prefix.is_prefix_of(path))
            .map(|(path, entry)| (path.clone(), entry.clone()))
            .collect()
    }

    /// Store without any entry at or beneath `prefix`
    #[must_use]
    pub fn remove_under(&self, prefix: &PropPath) -> Self {
        let mut entries = self.entries.clone();
        for (path, _) in self.entries_under(prefix) {
            entries.remove(&path);
        }
        Self { entries }
    }

    /// Store with every `(relative path, entry)` inserted beneath `prefix`
    #[must_use]
    pub fn insert_all<I>(&self, prefix: &PropPath, relative: I) -> Self
    where
        I: IntoIterator<Item = (PropPath, ReferenceEntry)>,
    {
        let mut entries = self.entries.clone();
        for (path, entry) in relative {
            entries.insert(prefix.join(&path), entry);
        }
        Self { entries }
    }

    /// Keys in path order
    pub fn keys(&self) -> impl Iterator<Item = &PropPath> {
        self.entries.keys()
    }

    /// Entries in path order
    pub fn iter(&self) -> impl Iterator<Item = (&PropPath, &ReferenceEntry)> {
        self.entries.iter()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// String-keyed form for hosts, keyed by [`PropPath::canonical`]
    #[must_use]
    pub fn to_canonical_map(&self) -> BTreeMap<String, ReferenceEntry> {
        self.entries
            .iter()
            .map(|(path, entry)| (path.canonical(), entry.clone()))
            .collect()
    }

    /// Parse the string-keyed form
    ///
    /// # Errors
    /// Returns error if any key is not a canonical path
    pub fn from_canonical_map(map: BTreeMap<String, ReferenceEntry>) -> Result<Self, ModelError> {
        map.into_iter()
            .map(|(key, entry)| PropPath::from_canonical(&key).map(|path| (path, entry)))
            .collect()
    }
}

impl FromIterator<(PropPath, ReferenceEntry)> for ReferencePathStore {
    fn from_iter<I: IntoIterator<Item = (PropPath, ReferenceEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Metadata about a named entity set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet {
    /// Name reference slots use
    pub name: String,
    /// Admin list backing the set
    pub list_key: String,
}

/// Entity set metadata, passed explicitly to synthesis and bootstrap
pub trait EntitySetRegistry: fmt::Debug + Send + Sync {
    /// Metadata for a set name
    fn lookup(&self, name: &str) -> Option<EntitySet>;

    /// Whether a set name is known
    fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

/// Fixed registry built from a list of sets
#[derive(Debug, Clone, Default)]
pub struct StaticEntitySets {
    sets: BTreeMap<String, EntitySet>,
}

impl StaticEntitySets {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a set backed by `list_key`
    #[must_use]
    pub fn with_set(mut self, name: impl Into<String>, list_key: impl Into<String>) -> Self {
        let name = name.into();
        self.sets.insert(
            name.clone(),
            EntitySet {
                name,
                list_key: list_key.into(),
            },
        );
        self
    }
}

impl EntitySetRegistry for StaticEntitySets {
    fn lookup(&self, name: &str) -> Option<EntitySet> {
        self.sets.get(name).cloned()
    }
}

/// Host collaborator that loads entity records for display
///
/// The sync engine never calls this; hosts use it to fill in labels of
/// existing selections.
pub trait EntityResolver {
    /// Records for `ids` in `set`; unknown ids are omitted
    fn resolve(&self, set: &EntitySet, ids: &[&str]) -> Vec<EntityRef>;
}

impl ReferencePathStore {
    /// Store with every non-empty selection refreshed from `resolver`
    ///
    /// Entries whose set `registry` does not know are left untouched.
    #[must_use]
    pub fn resolve_labels(
        &self,
        registry: &dyn EntitySetRegistry,
        resolver: &dyn EntityResolver,
    ) -> Self {
        self.iter()
            .map(|(path, entry)| {
                let refreshed = match registry.lookup(&entry.entity_set) {
                    Some(set) if !entry.selection.is_empty() => {
                        let resolved = resolver.resolve(&set, &entry.selection.ids());
                        ReferenceEntry::new(
                            entry.entity_set.clone(),
                            entry.selection.with_resolved(&resolved),
                        )
                    }
                    _ => entry.clone(),
                };
                (path.clone(), refreshed)
            })
            .collect()
    }
}
