//! Defines the interface between the grid and persistent storage, and the
//! SQLite implementation of that interface.

mod sqlite;
mod transaction;

pub use sqlite::SQLiteTransactionStore;
pub use transaction::TransactionStore;
