//! Blockform Sync
//!
//! Keeps a block's schema, value tree and reference store in step.
//!
//! # Modules
//!
//! - synthesis: fresh instances of any schema subtree
//! - traversal: per-leaf edit points, the shared schema/value walker
//! - tree: path reads, copy-on-write `replace`, schema lookup by path
//! - migrate: conditional branch switches
//! - list: reference-safe insert, remove and move
//! - focus: first focusable leaf
//! - invariant: path-set check and bootstrap reconciliation
//! - codec: schema-directed JSON decoding
//!
//! Every edit takes a [`Snapshot`] and returns a new one or an error; the
//! input is never changed, so a failed edit leaves nothing half-applied.
//!
//! # Example
//!
//! ```rust
//! use blockform_model::{prop_path, PropSchema, StaticEntitySets};
//! use blockform_sync::{insert_item, synthesize, Snapshot};
//!
//! let schema = PropSchema::object([(
//!     "cards",
//!     PropSchema::list(PropSchema::object([
//!         ("a", PropSchema::form(0)),
//!         ("b", PropSchema::reference_many("tags")),
//!     ])),
//! )]);
//! let PropSchema::Object(fields) = &schema else { unreachable!() };
//! let PropSchema::List(cards) = &fields["cards"] else { unreachable!() };
//!
//! let registry = StaticEntitySets::new().with_set("tags", "Tag");
//! let fresh = synthesize(&schema, &registry).unwrap();
//! let state = Snapshot::new(fresh.value, fresh.entries.into_iter().collect());
//!
//! let state = insert_item(cards, &state, &prop_path!["cards"], 0, &registry).unwrap();
//! assert!(state.references.contains(&prop_path!["cards", 0, "b"]));
//! ```

#![warn(unreachable_pub)]

mod codec;
mod error;
mod focus;
mod invariant;
mod list;
mod migrate;
mod snapshot;
mod synthesize;
mod traverse;
mod tree;
mod validate;

pub use codec::decode;
pub use error::SyncError;
pub use focus::resolve as resolve_focus;
pub use invariant::{check_reference_invariant, reconcile, Reconciled};
pub use list::{insert_item, move_item, remove_item};
pub use migrate::switch_branch;
pub use snapshot::Snapshot;
pub use synthesize::{empty_entry, synthesize, Synthesized};
pub use traverse::{reference_paths, reference_slots, traverse, EditKind, EditPoint, EditTarget};
pub use tree::{get, replace, schema_at, SchemaNode, DISCRIMINANT_KEY, VALUE_KEY};
pub use validate::{failing_paths, field_states, FieldState};
