//! Edit session orchestration
//!
//! An [`EditSession`] owns one block's value tree, reference store and
//! forced-validation flag for the lifetime of an edit. Every mutation goes
//! through the sync engine and replaces the pair as a whole; the previous
//! pair is kept for undo.

use std::sync::Arc;

use blockform_model::{
    EntityResolver, EntitySetRegistry, PropPath, PropSchema, PropValue, ReferenceEntry,
    ReferencePathStore, Selection,
};
use blockform_sync::{
    check_reference_invariant, decode, failing_paths, field_states, insert_item, move_item,
    reconcile, remove_item, replace, resolve_focus, schema_at, switch_branch, traverse, EditPoint,
    SchemaNode, Snapshot, SyncError,
};
use serde_json::Value as JsonValue;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::history::History;

/// Result of a commit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Every leaf passed; the host may persist the pair
    Ready,
    /// Some leaves failed; forced validation is now on
    Invalid {
        /// Failing leaf paths in declaration order
        failing: Vec<PropPath>,
    },
}

impl CommitOutcome {
    /// Whether the commit succeeded
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Display state of one editable leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldStatus {
    /// Absolute path of the leaf
    pub path: PropPath,
    /// Whether the leaf passes its check
    pub valid: bool,
    /// Whether the host should render the leaf as invalid
    pub invalid: bool,
}

/// Editing state of one component block
#[derive(Debug)]
pub struct EditSession {
    schema: PropSchema,
    registry: Arc<dyn EntitySetRegistry>,
    config: SessionConfig,
    state: Snapshot,
    force_validation: bool,
    history: History,
}

impl EditSession {
    /// Open a session over a persisted value and store
    ///
    /// Live slots missing from `references` get empty entries; entries with
    /// no live slot are dropped.
    ///
    /// # Errors
    /// - `SchemaValueMismatch` if `value` does not have the shape of `schema`
    /// - `UnknownEntitySet` if a slot needing an entry names an unknown set
    #[tracing::instrument(level = "info", skip_all)]
    pub fn open(
        schema: PropSchema,
        value: PropValue,
        references: &ReferencePathStore,
        registry: Arc<dyn EntitySetRegistry>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let reconciled = reconcile(&schema, &value, references, registry.as_ref())?;
        check_reference_invariant(&schema, &value, &reconciled.references)?;

        tracing::info!(
            slots = reconciled.references.len(),
            added = reconciled.added.len(),
            dropped = reconciled.dropped.len(),
            "opened edit session"
        );

        Ok(Self {
            history: History::with_max_levels(config.max_history),
            schema,
            registry,
            config,
            state: Snapshot::new(value, reconciled.references),
            force_validation: false,
        })
    }

    /// Open a session over persisted JSON
    ///
    /// # Errors
    /// As [`EditSession::open`], plus decoding errors
    pub fn open_json(
        schema: PropSchema,
        value: &JsonValue,
        references: &ReferencePathStore,
        registry: Arc<dyn EntitySetRegistry>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let value = decode(&schema, value)?;
        Self::open(schema, value, references, registry, config)
    }

    /// Block schema
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &PropSchema {
        &self.schema
    }

    /// Current value tree
    #[inline]
    #[must_use]
    pub fn value(&self) -> &PropValue {
        &self.state.value
    }

    /// Current reference store
    #[inline]
    #[must_use]
    pub fn references(&self) -> &ReferencePathStore {
        &self.state.references
    }

    /// Current version of the pair
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }

    /// Whether failing leaves are rendered as invalid
    #[inline]
    #[must_use]
    pub fn force_validation(&self) -> bool {
        self.force_validation
    }

    /// Replace a form field's value
    ///
    /// # Errors
    /// - `DiscriminantEdit` if `path` is a discriminant
    /// - `NotAFormField` if `path` is any other non-form node
    /// - `PathNotFound` if `path` is not in the block
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn set_value(&mut self, path: &PropPath, value: JsonValue) -> Result<(), SessionError> {
        match schema_at(&self.schema, &self.state.value, path)? {
            SchemaNode::Prop(PropSchema::Form(_)) => {}
            SchemaNode::Discriminant(_) => return Err(SessionError::DiscriminantEdit(path.clone())),
            SchemaNode::Prop(_) => return Err(SessionError::NotAFormField(path.clone())),
        }
        let value = replace(&self.state.value, path, PropValue::leaf(value))?;
        self.apply(Snapshot::new(value, self.state.references.clone()))
    }

    /// Change the discriminant of the conditional at `path`
    ///
    /// Selecting another branch replaces its value and reference entries
    /// with fresh ones; the previous branch's data is not kept.
    ///
    /// # Errors
    /// - `NotAConditional` if `path` is not a conditional
    /// - `SchemaValueMismatch` if `discriminant` selects no branch
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn set_discriminant(
        &mut self,
        path: &PropPath,
        discriminant: JsonValue,
    ) -> Result<(), SessionError> {
        let SchemaNode::Prop(PropSchema::Conditional(conditional)) =
            schema_at(&self.schema, &self.state.value, path)?
        else {
            return Err(SyncError::NotAConditional(path.clone()).into());
        };
        let next = switch_branch(
            conditional,
            &self.state,
            path,
            discriminant,
            self.registry.as_ref(),
        )?;
        self.apply(next)
    }

    /// Replace the selection of the reference slot at `path`
    ///
    /// # Errors
    /// - `NotAReferenceSlot` if `path` is not a reference slot
    /// - `CardinalityMismatch` if `selection` has the wrong shape
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn set_selection(
        &mut self,
        path: &PropPath,
        selection: Selection,
    ) -> Result<(), SessionError> {
        let SchemaNode::Prop(PropSchema::ReferenceSlot(slot)) =
            schema_at(&self.schema, &self.state.value, path)?
        else {
            return Err(SessionError::NotAReferenceSlot(path.clone()));
        };
        if selection.cardinality() != slot.cardinality {
            return Err(SessionError::CardinalityMismatch {
                path: path.clone(),
                expected: slot.cardinality,
            });
        }
        let references = self.state.references.set(
            path.clone(),
            ReferenceEntry::new(slot.entity_set.clone(), selection),
        );
        self.apply(Snapshot::new(self.state.value.clone(), references))
    }

    /// Insert a fresh item into the list at `list_path`
    ///
    /// # Errors
    /// - `NotAList` if `list_path` is not a list
    /// - `IndexOutOfBounds` if `index > len`
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn insert_item(&mut self, list_path: &PropPath, index: usize) -> Result<(), SessionError> {
        let SchemaNode::Prop(PropSchema::List(list)) =
            schema_at(&self.schema, &self.state.value, list_path)?
        else {
            return Err(SyncError::NotAList(list_path.clone()).into());
        };
        let next = insert_item(list, &self.state, list_path, index, self.registry.as_ref())?;
        self.apply(next)
    }

    /// Remove an item from the list at `list_path`
    ///
    /// # Errors
    /// - `NotAList` if `list_path` is not a list
    /// - `IndexOutOfBounds` if `index >= len`
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn remove_item(&mut self, list_path: &PropPath, index: usize) -> Result<(), SessionError> {
        let next = remove_item(&self.state, list_path, index)?;
        self.apply(next)
    }

    /// Move an item within the list at `list_path`
    ///
    /// # Errors
    /// - `NotAList` if `list_path` is not a list
    /// - `IndexOutOfBounds` if either index is `>= len`
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn move_item(
        &mut self,
        list_path: &PropPath,
        from: usize,
        to: usize,
    ) -> Result<(), SessionError> {
        let next = move_item(&self.state, list_path, from, to)?;
        self.apply(next)
    }

    /// Every editable leaf in declaration order
    ///
    /// # Errors
    /// Propagates traversal errors
    pub fn edit_points(&self) -> Result<Vec<EditPoint<'_>>, SessionError> {
        Ok(traverse(
            &self.schema,
            &PropPath::root(),
            &self.state.value,
            &self.state.references,
        )?)
    }

    /// Where focus lands when the block is opened
    ///
    /// # Errors
    /// Propagates shape errors
    pub fn focus_path(&self) -> Result<Option<PropPath>, SessionError> {
        Ok(resolve_focus(&self.schema, &PropPath::root(), &self.state.value)?)
    }

    /// Validity and display state of every leaf
    ///
    /// # Errors
    /// Propagates traversal errors
    pub fn field_states(&self) -> Result<Vec<FieldStatus>, SessionError> {
        Ok(
            field_states(&self.schema, &self.state.value, &self.state.references)?
                .into_iter()
                .map(|state| FieldStatus {
                    invalid: self.force_validation && !state.valid,
                    valid: state.valid,
                    path: state.path,
                })
                .collect(),
        )
    }

    /// Check every leaf before the host persists the block
    ///
    /// On failure forced validation is switched on; the trees are never
    /// changed.
    ///
    /// # Errors
    /// Propagates traversal errors
    #[tracing::instrument(level = "info", skip(self))]
    pub fn commit(&mut self) -> Result<CommitOutcome, SessionError> {
        let failing = failing_paths(&self.schema, &self.state.value, &self.state.references)?;
        if failing.is_empty() {
            tracing::info!("commit ready");
            return Ok(CommitOutcome::Ready);
        }
        self.force_validation = true;
        tracing::info!(failing = failing.len(), "commit rejected");
        Ok(CommitOutcome::Invalid { failing })
    }

    /// Restore the version before the last mutation
    ///
    /// Returns whether anything was undone.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.state.clone()) {
            Some(previous) => {
                self.state = previous;
                tracing::debug!(depth = self.history.undo_depth(), "undo");
                true
            }
            None => false,
        }
    }

    /// Re-apply the last undone mutation
    ///
    /// Returns whether anything was redone.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.state.clone()) {
            Some(next) => {
                self.state = next;
                tracing::debug!(depth = self.history.undo_depth(), "redo");
                true
            }
            None => false,
        }
    }

    /// Whether undo is possible
    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether redo is possible
    #[inline]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Fill in labels of current selections from `resolver`
    ///
    /// Display data only: ids and paths are unchanged and no undo level
    /// is recorded.
    pub fn resolve_labels(&mut self, resolver: &dyn EntityResolver) {
        let references = self
            .state
            .references
            .resolve_labels(self.registry.as_ref(), resolver);
        self.state = Snapshot::new(self.state.value.clone(), references);
    }

    /// End the session, handing back the pair
    #[must_use]
    pub fn close(self) -> (PropValue, ReferencePathStore) {
        (self.state.value, self.state.references)
    }

    fn apply(&mut self, next: Snapshot) -> Result<(), SessionError> {
        if next.same_version(&self.state) {
            tracing::trace!("edit left the pair unchanged");
            return Ok(());
        }
        if self.config.check_invariant_after_edit {
            check_reference_invariant(&self.schema, &next.value, &next.references)?;
        }
        let previous = std::mem::replace(&mut self.state, next);
        self.history.record(previous);
        if self.config.reset_force_validation_on_edit {
            self.force_validation = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockform_model::{prop_path, Cardinality, EntityRef};
    use blockform_test_utils::{entity_sets, many, media_block_schema, one, StaticResolver};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn media_session(config: SessionConfig) -> EditSession {
        EditSession::open_json(
            media_block_schema(),
            &json!({
                "heading": "Hi",
                "media": { "discriminant": "image", "value": { "src": "a.png" } }
            }),
            &ReferencePathStore::new(),
            Arc::new(entity_sets()),
            config,
        )
        .unwrap()
    }

    #[test]
    fn set_value_replaces_form_leaf() {
        let mut session = media_session(SessionConfig::default());
        session
            .set_value(&prop_path!["media", "value", "src"], json!("b.png"))
            .unwrap();
        assert_eq!(
            session.value().to_json()["media"]["value"]["src"],
            json!("b.png")
        );
    }

    #[test]
    fn set_value_rejects_non_form_targets() {
        let mut session = media_session(SessionConfig::default());
        assert_eq!(
            session.set_value(&prop_path!["media", "discriminant"], json!("embed")),
            Err(SessionError::DiscriminantEdit(prop_path!["media", "discriminant"]))
        );
        assert_eq!(
            session.set_value(&prop_path!["tags"], json!([])),
            Err(SessionError::NotAFormField(prop_path!["tags"]))
        );
        assert!(!session.can_undo());
    }

    #[test]
    fn set_discriminant_migrates() {
        let mut session = media_session(SessionConfig::default().with_invariant_checks(true));
        session
            .set_selection(&prop_path!["media", "value", "credit"], one("u1"))
            .unwrap();
        session
            .set_discriminant(&prop_path!["media"], json!("embed"))
            .unwrap();
        assert!(!session
            .references()
            .contains(&prop_path!["media", "value", "credit"]));
        assert_eq!(
            session.value().to_json()["media"],
            json!({ "discriminant": "embed", "value": { "url": "" } })
        );
        assert!(matches!(
            session.set_discriminant(&prop_path!["heading"], json!("x")),
            Err(SessionError::Sync(SyncError::NotAConditional(_)))
        ));
    }

    #[test]
    fn set_selection_checks_cardinality() {
        let mut session = media_session(SessionConfig::default());
        assert_eq!(
            session.set_selection(&prop_path!["tags"], one("t1")),
            Err(SessionError::CardinalityMismatch {
                path: prop_path!["tags"],
                expected: Cardinality::Many,
            })
        );
        assert_eq!(
            session.set_selection(&prop_path!["heading"], many(&["t1"])),
            Err(SessionError::NotAReferenceSlot(prop_path!["heading"]))
        );
        session
            .set_selection(&prop_path!["tags"], many(&["t1", "t2"]))
            .unwrap();
        assert_eq!(
            session
                .references()
                .get(&prop_path!["tags"])
                .map(|e| e.selection.ids()),
            Some(vec!["t1", "t2"])
        );
    }

    #[test]
    fn list_edits_through_session() {
        let mut session = media_session(SessionConfig::default().with_invariant_checks(true));
        session
            .set_discriminant(&prop_path!["media"], json!("gallery"))
            .unwrap();
        let slides = prop_path!["media", "value", "slides"];
        session.insert_item(&slides, 0).unwrap();
        session.insert_item(&slides, 1).unwrap();
        session
            .set_selection(&slides.child(1).child("author"), one("u2"))
            .unwrap();
        session.move_item(&slides, 1, 0).unwrap();
        session.remove_item(&slides, 1).unwrap();

        assert_eq!(
            session
                .references()
                .get(&prop_path!["media", "value", "slides", 0, "author"])
                .map(|e| e.selection.ids()),
            Some(vec!["u2"])
        );
        assert!(matches!(
            session.insert_item(&prop_path!["heading"], 0),
            Err(SessionError::Sync(SyncError::NotAList(_)))
        ));
    }

    #[test]
    fn undo_and_redo_restore_both_trees() {
        let mut session = media_session(SessionConfig::default());
        let opened = session.snapshot().clone();

        session
            .set_discriminant(&prop_path!["media"], json!("gallery"))
            .unwrap();
        let switched = session.snapshot().clone();

        assert!(session.undo());
        assert!(session.snapshot().same_version(&opened));
        assert!(!session.undo());

        assert!(session.redo());
        assert!(session.snapshot().same_version(&switched));
        assert!(!session.redo());
    }

    #[test]
    fn unchanged_pair_records_no_history() {
        let mut session = media_session(SessionConfig::default());
        session
            .set_discriminant(&prop_path!["media"], json!("gallery"))
            .unwrap();
        let slides = prop_path!["media", "value", "slides"];
        session.insert_item(&slides, 0).unwrap();
        session.insert_item(&slides, 1).unwrap();
        assert!(session.undo());
        let before = session.snapshot().clone();

        session.move_item(&slides, 0, 0).unwrap();

        assert!(session.snapshot().same_version(&before));
        assert!(session.can_redo());
        let mut undone = 0;
        while session.undo() {
            undone += 1;
        }
        assert_eq!(undone, 2);
    }

    #[test]
    fn resolve_labels_fills_existing_selections() {
        let mut session = media_session(SessionConfig::default());
        session
            .set_selection(&prop_path!["tags"], many(&["t2", "t1", "t9"]))
            .unwrap();
        let resolver = StaticResolver::new()
            .with_record("tags", "t1", "Rust")
            .with_record("tags", "t2", "Async")
            .with_record("users", "t1", "Wrong set");

        session.resolve_labels(&resolver);

        let labels: Vec<_> = session
            .references()
            .get(&prop_path!["tags"])
            .map(|e| e.selection.entities().into_iter().map(EntityRef::display_label).collect())
            .unwrap_or_default();
        assert_eq!(labels, vec!["Async", "Rust", "t9"]);
        assert_eq!(
            session.references().get(&prop_path!["media", "value", "credit"]),
            Some(&ReferenceEntry::empty("users", Cardinality::One))
        );
        assert!(session.undo());
        assert!(!session.can_undo());
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut session = media_session(SessionConfig::default());
        session.set_value(&prop_path!["heading"], json!("A")).unwrap();
        assert!(session.undo());
        assert!(session.can_redo());
        session.set_value(&prop_path!["heading"], json!("B")).unwrap();
        assert!(!session.can_redo());
    }

    #[test]
    fn field_states_follow_force_validation() {
        let mut session = media_session(SessionConfig::default().with_reset_force_validation(true));
        session.set_value(&prop_path!["heading"], json!("")).unwrap();

        let heading = |session: &EditSession| {
            session
                .field_states()
                .unwrap()
                .into_iter()
                .find(|s| s.path == prop_path!["heading"])
                .unwrap()
        };
        assert!(!heading(&session).valid);
        assert!(!heading(&session).invalid);

        let outcome = session.commit().unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Invalid {
                failing: vec![prop_path!["heading"]]
            }
        );
        assert!(heading(&session).invalid);

        session.set_value(&prop_path!["heading"], json!("Back")).unwrap();
        assert!(!session.force_validation());
        assert!(session.commit().unwrap().is_ready());
    }

    #[test]
    fn focus_and_edit_points() {
        let session = media_session(SessionConfig::default());
        assert_eq!(session.focus_path().unwrap(), Some(prop_path!["heading"]));
        let paths: Vec<_> = session
            .edit_points()
            .unwrap()
            .into_iter()
            .map(|p| p.path)
            .collect();
        assert_eq!(
            paths,
            vec![
                prop_path!["heading"],
                prop_path!["media", "discriminant"],
                prop_path!["media", "value", "src"],
                prop_path!["media", "value", "credit"],
                prop_path!["tags"],
            ]
        );
    }
}
