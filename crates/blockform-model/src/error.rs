//! Error types for the prop model

use crate::path::PropPath;

/// Errors related to paths and the reference store's external form
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Canonical key could not be parsed back into a path
    #[error("invalid canonical path '{key}': {reason}")]
    InvalidCanonicalPath { key: String, reason: String },

    /// Not a descendant path
    #[error("path '{path}' is not a descendant of '{ancestor}'")]
    NotDescendant { path: PropPath, ancestor: PropPath },
}
