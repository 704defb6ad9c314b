//! Error types for edit sessions

use blockform_model::{Cardinality, PropPath};
use blockform_sync::SyncError;

/// Session error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// Sync engine error
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Selection shape disagrees with the slot's cardinality
    #[error("slot at {path} expects a {expected:?} selection")]
    CardinalityMismatch {
        path: PropPath,
        expected: Cardinality,
    },

    /// Selection edit addressed at something other than a reference slot
    #[error("not a reference slot: {0}")]
    NotAReferenceSlot(PropPath),

    /// Value edit addressed at something other than a form field
    #[error("not a form field: {0}")]
    NotAFormField(PropPath),

    /// Plain value edit addressed at a discriminant
    #[error("discriminant at {0} must be changed with set_discriminant")]
    DiscriminantEdit(PropPath),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl SessionError {
    /// Whether the session's trees have drifted from the schema
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Sync(err) if err.is_fatal())
    }
}
