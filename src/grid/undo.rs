//! Undo/redo support for the grid.
//!
//! Each user intent is recorded as a [Command] that restores the grid to the
//! state before the intent. Applying a command yields its own inverse, so the
//! same machinery drives both undo and redo. Granularity is one command per
//! committed field edit (not per keystroke).

use super::row::{FieldEdit, GridRow, RowKey, Tracking};

/// A reversible grid operation.
#[derive(Clone, Debug)]
pub(crate) enum Command {
    /// Restore a field to an earlier value and the row to earlier tracking.
    Edit {
        key: RowKey,
        value: FieldEdit,
        tracking: Tracking,
    },
    /// Remove a row that was added.
    Unadd { key: RowKey },
    /// Re-insert a row that was removed.
    Insert { index: usize, row: GridRow },
    /// Restore only the change-tracking of a row (delete marks, error marks).
    SetTracking { key: RowKey, tracking: Tracking },
}

/// The undo and redo stacks.
#[derive(Debug, Default)]
pub(crate) struct History {
    undo: Vec<Command>,
    redo: Vec<Command>,
}

impl History {
    /// Record the inverse of a fresh user mutation.
    ///
    /// Fresh mutations invalidate whatever was redoable.
    pub fn record(&mut self, command: Command) {
        self.undo.push(command);
        self.redo.clear();
    }

    pub fn pop_undo(&mut self) -> Option<Command> {
        self.undo.pop()
    }

    pub fn pop_redo(&mut self) -> Option<Command> {
        self.redo.pop()
    }

    pub fn push_undo(&mut self, command: Command) {
        self.undo.push(command);
    }

    pub fn push_redo(&mut self, command: Command) {
        self.redo.push(command);
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
