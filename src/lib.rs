//! Gridbook is the editing core of a multi-currency personal finance
//! tracker.
//!
//! This library implements a transaction grid controller: an in-memory
//! working copy of transaction rows with optimistic inline editing, per-row
//! change tracking (`New`/`Modified`/`Deleted`/`Invalid`), undo/redo, and
//! explicit save/discard reconciliation against a SQLite store. Amounts are
//! converted into a main currency through a cached exchange-rate table.
//!
//! The presentation layer is out of scope: the controller exposes a
//! [grid::GridEvent] stream describing which rows need re-rendering, and the
//! rows' [grid::RowState] drives any visual tagging.

#![warn(missing_docs)]

pub mod clipboard;
pub mod config;
pub mod conversion;
pub mod db;
pub mod grid;
pub mod logging;
pub mod models;
pub mod stores;

mod database_id;
mod error;

pub use database_id::DatabaseId;
pub use db::initialize as initialize_db;
pub use error::{Error, RowValidation};
