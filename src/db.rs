/*! This module defines traits for interacting with the application's database
and sets up the schema. */

use rusqlite::{Connection, Row, Transaction as SqlTransaction};

use crate::{
    Error,
    models::{Transaction, TransactionDraft},
};

/// A trait for adding an object's schema to a database.
pub trait CreateTable {
    /// Create a table for the model.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error>;
}

/// A trait for mapping a `rusqlite::Row` from a SQLite database to a concrete
/// rust type.
pub trait MapRow {
    /// The type that the implementation maps rows to.
    type ReturnType;

    /// Convert a row into a concrete type.
    ///
    /// # Errors
    /// Returns an error if a column cannot be read from `row`.
    fn map_row(row: &Row) -> Result<Self::ReturnType, rusqlite::Error>;
}

impl CreateTable for Transaction {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL,
                currency TEXT NOT NULL
            )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for Transaction {
    type ReturnType = Transaction;

    fn map_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
        Ok(Transaction {
            id: row.get(0)?,
            draft: TransactionDraft {
                date: row.get(1)?,
                description: row.get(2)?,
                category: row.get(3)?,
                amount: row.get(4)?,
                currency: row.get(5)?,
            },
        })
    }
}

/// Create the application's database schema.
///
/// # Errors
/// Returns an [Error::SqlError] if the schema could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    Transaction::create_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
