//! Session configuration

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Edit session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Undo levels kept (0 = unlimited)
    pub max_history: usize,
    /// Re-check the reference invariant after every structural edit
    pub check_invariant_after_edit: bool,
    /// Clear forced validation display once the block is edited again
    pub reset_force_validation_on_edit: bool,
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With undo depth
    #[inline]
    #[must_use]
    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    /// With invariant checking after edits
    #[inline]
    #[must_use]
    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.check_invariant_after_edit = enabled;
        self
    }

    /// With forced validation reset on edit
    #[inline]
    #[must_use]
    pub fn with_reset_force_validation(mut self, enabled: bool) -> Self {
        self.reset_force_validation_on_edit = enabled;
        self
    }

    /// Parse from JSON; absent fields take their defaults
    ///
    /// # Errors
    /// Returns `Config` if the text is not a valid configuration
    pub fn from_json(text: &str) -> Result<Self, SessionError> {
        serde_json::from_str(text).map_err(|e| SessionError::Config(e.to_string()))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history: 100,
            check_invariant_after_edit: cfg!(debug_assertions),
            reset_force_validation_on_edit: false,
        }
    }
}
