//! Blockform Session
//!
//! Host-facing orchestration of one component block's edit: open from the
//! persisted pair, apply edits, validate on commit, undo and redo, and hand
//! the pair back on close.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use blockform_model::{prop_path, PropSchema, ReferencePathStore, ReferenceSlotSchema, StaticEntitySets};
//! use blockform_session::{CommitOutcome, EditSession, SessionConfig};
//! use serde_json::json;
//!
//! let schema = PropSchema::object([
//!     ("title", PropSchema::form("")),
//!     ("link", ReferenceSlotSchema::one("posts").required().into()),
//! ]);
//! let registry = Arc::new(StaticEntitySets::new().with_set("posts", "Post"));
//!
//! let mut session = EditSession::open_json(
//!     schema,
//!     &json!({ "title": "" }),
//!     &ReferencePathStore::new(),
//!     registry,
//!     SessionConfig::default(),
//! )
//! .unwrap();
//!
//! let outcome = session.commit().unwrap();
//! assert_eq!(outcome, CommitOutcome::Invalid { failing: vec![prop_path!["link"]] });
//! assert!(session.force_validation());
//! ```

#![warn(unreachable_pub)]

mod config;
mod error;
mod history;
mod logging;
mod session;

pub use config::SessionConfig;
pub use error::SessionError;
pub use history::History;
pub use logging::{init_tracing, LOG_ENV};
pub use session::{CommitOutcome, EditSession, FieldStatus};
