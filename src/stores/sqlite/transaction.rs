//! Implements a SQLite backed transaction store.
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    DatabaseId, Error,
    db::MapRow,
    models::{Transaction, TransactionDraft},
    stores::TransactionStore,
};

/// Stores transactions in a SQLite database.
///
/// The schema must have been set up with [crate::db::initialize] before the
/// store is used.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Create a new transaction in the database.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    fn create(&mut self, draft: &TransactionDraft) -> Result<Transaction, Error> {
        let connection = self.connection.lock().unwrap();

        let transaction = connection
            .prepare(
                "INSERT INTO \"transaction\" (date, description, category, amount, currency)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING id, date, description, category, amount, currency",
            )?
            .query_row(
                (
                    draft.date,
                    &draft.description,
                    &draft.category,
                    draft.amount,
                    draft.currency,
                ),
                Transaction::map_row,
            )?;

        Ok(transaction)
    }

    /// Overwrite the fields of the transaction with `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::UpdateMissingTransaction] if `id` does not refer to a valid transaction,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn update(&mut self, id: DatabaseId, draft: &TransactionDraft) -> Result<(), Error> {
        let connection = self.connection.lock().unwrap();

        let rows_affected = connection.execute(
            "UPDATE \"transaction\"
             SET date = ?1, description = ?2, category = ?3, amount = ?4, currency = ?5
             WHERE id = ?6",
            (
                draft.date,
                &draft.description,
                &draft.category,
                draft.amount,
                draft.currency,
                id,
            ),
        )?;

        if rows_affected == 0 {
            return Err(Error::UpdateMissingTransaction);
        }

        Ok(())
    }

    /// Remove the transaction with `id` from the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DeleteMissingTransaction] if `id` does not refer to a valid transaction,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn delete(&mut self, id: DatabaseId) -> Result<(), Error> {
        let connection = self.connection.lock().unwrap();

        let rows_affected =
            connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", (id,))?;

        if rows_affected == 0 {
            return Err(Error::DeleteMissingTransaction);
        }

        Ok(())
    }

    /// Retrieve a transaction in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid transaction,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, id: DatabaseId) -> Result<Transaction, Error> {
        let transaction = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, date, description, category, amount, currency
                 FROM \"transaction\" WHERE id = :id",
            )?
            .query_row(&[(":id", &id)], Transaction::map_row)?;

        Ok(transaction)
    }

    /// Retrieve all transactions in insertion order.
    ///
    /// An empty vector is returned if the database has no transactions.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an SQL error.
    fn get_all(&self) -> Result<Vec<Transaction>, Error> {
        let connection = self.connection.lock().unwrap();

        let transactions = connection
            .prepare(
                "SELECT id, date, description, category, amount, currency
                 FROM \"transaction\" ORDER BY id ASC",
            )?
            .query_map((), Transaction::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(transactions)
    }
}

#[cfg(test)]
mod sqlite_transaction_store_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        models::{CurrencyCode, TransactionDraft},
        stores::TransactionStore,
    };

    use super::SQLiteTransactionStore;

    fn get_store() -> SQLiteTransactionStore {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        SQLiteTransactionStore::new(Arc::new(Mutex::new(connection)))
    }

    fn coffee_draft() -> TransactionDraft {
        TransactionDraft {
            date: date!(2024 - 06 - 01),
            description: "Coffee shop".to_string(),
            category: "Eating out".to_string(),
            amount: 4.5,
            currency: CurrencyCode::new_unchecked("USD"),
        }
    }

    #[test]
    fn create_assigns_id_and_round_trips() {
        let mut store = get_store();
        let draft = coffee_draft();

        let transaction = store.create(&draft).expect("Could not create transaction");

        assert_eq!(transaction.draft, draft);
        let selected = store.get(transaction.id);
        assert_eq!(selected, Ok(transaction));
    }

    #[test]
    fn get_fails_on_invalid_id() {
        let store = get_store();

        let result = store.get(999);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn update_overwrites_fields() {
        let mut store = get_store();
        let transaction = store
            .create(&coffee_draft())
            .expect("Could not create transaction");

        let mut want = coffee_draft();
        want.amount = 200.0;
        want.currency = CurrencyCode::new_unchecked("EUR");
        store
            .update(transaction.id, &want)
            .expect("Could not update transaction");

        let got = store.get(transaction.id).unwrap();
        assert_eq!(got.draft, want);
    }

    #[test]
    fn update_fails_on_missing_transaction() {
        let mut store = get_store();

        let result = store.update(999, &coffee_draft());

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn delete_removes_transaction() {
        let mut store = get_store();
        let transaction = store
            .create(&coffee_draft())
            .expect("Could not create transaction");

        store
            .delete(transaction.id)
            .expect("Could not delete transaction");

        assert_eq!(store.get(transaction.id), Err(Error::NotFound));
    }

    #[test]
    fn delete_fails_on_missing_transaction() {
        let mut store = get_store();

        let result = store.delete(999);

        assert_eq!(result, Err(Error::DeleteMissingTransaction));
    }

    #[test]
    fn get_all_returns_insertion_order() {
        let mut store = get_store();
        let mut second_draft = coffee_draft();
        second_draft.description = "Groceries".to_string();

        let first = store.create(&coffee_draft()).unwrap();
        let second = store.create(&second_draft).unwrap();

        let all = store.get_all().expect("Could not query transactions");

        assert_eq!(all, vec![first, second]);
    }
}
