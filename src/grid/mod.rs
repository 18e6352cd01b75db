//! The transaction grid: working copy, change tracking, and reconciliation.

mod controller;
mod row;
mod undo;

pub use controller::{EditOutcome, GridController, GridEvent, SaveSummary};
pub use row::{FieldEdit, GridRow, RowKey, RowState};
