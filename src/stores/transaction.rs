//! Defines the transaction store trait.

use crate::{
    DatabaseId, Error,
    models::{Transaction, TransactionDraft},
};

/// Handles the persistence of transactions.
///
/// The grid controller reconciles its working copy against a store on save.
/// Implementations must report every failure to the caller, never swallow it.
pub trait TransactionStore {
    /// Create a new transaction in the store from `draft` and return it with
    /// its assigned ID.
    fn create(&mut self, draft: &TransactionDraft) -> Result<Transaction, Error>;

    /// Overwrite the fields of the transaction with `id` with `draft`.
    fn update(&mut self, id: DatabaseId, draft: &TransactionDraft) -> Result<(), Error>;

    /// Remove the transaction with `id` from the store.
    fn delete(&mut self, id: DatabaseId) -> Result<(), Error>;

    /// Retrieve the transaction with `id`.
    fn get(&self, id: DatabaseId) -> Result<Transaction, Error>;

    /// Retrieve all transactions in insertion order.
    fn get_all(&self) -> Result<Vec<Transaction>, Error>;
}
