//! Blockform Model
//!
//! Data types shared by every layer of the prop editing engine.
//!
//! # Core Concepts
//!
//! - [`PropSchema`]: declarative shape of a component block's props
//! - [`PropValue`]: immutable, structurally shared value tree
//! - [`PropPath`]: structural address of a node, also the reference-store key
//! - [`ReferencePathStore`]: side-table of entity selections keyed by path
//! - [`EntitySetRegistry`]: entity set metadata, injected by the host
//!
//! # Example
//!
//! ```rust
//! use blockform_model::{prop_path, Cardinality, PropSchema, ReferenceEntry, ReferencePathStore};
//!
//! let schema = PropSchema::object([
//!     ("title", PropSchema::form("")),
//!     ("link", PropSchema::reference_one("posts")),
//! ]);
//! assert_eq!(schema.kind().to_string(), "object");
//!
//! let store = ReferencePathStore::new()
//!     .set(prop_path!["link"], ReferenceEntry::empty("posts", Cardinality::One));
//! assert_eq!(store.len(), 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod path;
mod reference;
mod schema;
mod value;

pub use error::ModelError;
pub use path::{PathSegment, PropPath};
pub use reference::{
    EntityRef, EntityResolver, EntitySet, EntitySetRegistry, ReferenceEntry, ReferencePathStore,
    Selection, StaticEntitySets,
};
pub use schema::{
    discriminant_key, Cardinality, ConditionalSchema, FormSchema, ListSchema, PropSchema,
    ReferenceSlotSchema, SchemaKind, Validator,
};
pub use value::{PropValue, ValueNode};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
