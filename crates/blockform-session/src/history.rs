//! Undo/redo history
//!
//! Versions are whole [`Snapshot`]s. Because value trees and stores share
//! structure, keeping a version costs roughly the size of the edit that
//! produced it.
//!
//! - Each mutation pushes the version it replaced
//! - Undo swaps the current version with the most recent one kept
//! - Redo reverses an undo
//! - New mutations clear the redo stack

use std::collections::VecDeque;

use blockform_sync::Snapshot;

/// Bounded undo/redo stacks of snapshots
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Prior versions, most recent last
    undo: VecDeque<Snapshot>,
    /// Undone versions, most recent last
    redo: Vec<Snapshot>,
    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl History {
    /// History keeping up to `max_levels` versions (0 = unlimited)
    #[must_use]
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_levels,
        }
    }

    /// Record the version a mutation replaced
    pub fn record(&mut self, previous: Snapshot) {
        self.redo.clear();
        self.undo.push_back(previous);
        if self.max_levels > 0 && self.undo.len() > self.max_levels {
            self.undo.pop_front();
        }
    }

    /// Step back from `current`, returning the version to restore
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Step forward from `current`, returning the version to restore
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo.pop()?;
        self.undo.push_back(current);
        Some(next)
    }

    /// Whether undo is possible
    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether redo is possible
    #[inline]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undo levels held
    #[inline]
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockform_model::{PropValue, ReferencePathStore};

    fn version(n: i64) -> Snapshot {
        Snapshot::new(PropValue::leaf(n), ReferencePathStore::new())
    }

    #[test]
    fn undo_redo_cycle() {
        let mut history = History::with_max_levels(0);
        history.record(version(0));
        history.record(version(1));

        let restored = history.undo(version(2)).unwrap();
        assert_eq!(restored, version(1));
        assert!(history.can_redo());

        let again = history.redo(restored).unwrap();
        assert_eq!(again, version(2));
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn record_clears_redo() {
        let mut history = History::with_max_levels(0);
        history.record(version(0));
        let _ = history.undo(version(1));
        assert!(history.can_redo());
        history.record(version(0));
        assert!(!history.can_redo());
    }

    #[test]
    fn bounded_depth_drops_oldest() {
        let mut history = History::with_max_levels(2);
        for n in 0..5 {
            history.record(version(n));
        }
        assert_eq!(history.undo_depth(), 2);
        assert_eq!(history.undo(version(5)), Some(version(4)));
        assert_eq!(history.undo(version(4)), Some(version(3)));
        assert_eq!(history.undo(version(3)), None);
    }

    #[test]
    fn empty_history() {
        let mut history = History::default();
        assert!(!history.can_undo());
        assert_eq!(history.undo(version(0)), None);
        assert_eq!(history.redo(version(0)), None);
    }
}
