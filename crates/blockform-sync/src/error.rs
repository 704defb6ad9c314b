//! Error types for the sync engine
//!
//! Two classes:
//! - desynchronization between schema, value tree and reference store
//!   ([`SyncError::is_fatal`]), which means a caller bypassed the engine
//! - edits addressed at something that is not there (bad path, index)

use blockform_model::{ModelError, PropPath};

/// Sync engine error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    /// Value tree does not have the shape its schema declares
    #[error("schema/value mismatch at {path}: {reason}")]
    SchemaValueMismatch { path: PropPath, reason: String },

    /// Live reference slot has no store entry
    #[error("missing reference entry at {0}")]
    MissingReferenceEntry(PropPath),

    /// Store entry with no live reference slot behind it
    #[error("orphan reference entry at {0}")]
    OrphanReferenceEntry(PropPath),

    /// Path does not address a node in the value tree
    #[error("path not found: {0}")]
    PathNotFound(PropPath),

    /// Reference slot names an entity set the registry does not know
    #[error("unknown entity set '{entity_set}' at {path}")]
    UnknownEntitySet { path: PropPath, entity_set: String },

    /// List edit addressed at a non-list node
    #[error("not a list: {0}")]
    NotAList(PropPath),

    /// Branch switch addressed at a non-conditional node
    #[error("not a conditional: {0}")]
    NotAConditional(PropPath),

    /// List index outside the list
    #[error("index {index} out of bounds for list of {len} at {path}")]
    IndexOutOfBounds {
        path: PropPath,
        index: usize,
        len: usize,
    },

    /// Model error
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl SyncError {
    /// Shorthand for a mismatch
    pub fn mismatch(path: &PropPath, reason: impl Into<String>) -> Self {
        Self::SchemaValueMismatch {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    /// Whether the error means schema, value and store have drifted apart
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SchemaValueMismatch { .. }
                | Self::MissingReferenceEntry(_)
                | Self::OrphanReferenceEntry(_)
        )
    }
}
