//! Defines the app level error type.

use crate::{
    grid::RowKey,
    models::{CurrencyCode, FieldError},
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more rows failed validation, so the save was blocked before any
    /// store call was made.
    #[error("validation failed for {} row(s)", .0.len())]
    Validation(Vec<RowValidation>),

    /// A store operation failed partway through a save.
    ///
    /// Rows listed in `saved` were written successfully and are now clean;
    /// the row in `failed` and any rows after it keep their pre-save state.
    #[error("save aborted after {} row(s): {source}", saved.len())]
    SaveAborted {
        /// The rows that were written before the failure.
        saved: Vec<RowKey>,
        /// The row whose store call failed.
        failed: RowKey,
        /// The store error that aborted the save.
        source: Box<Error>,
    },

    /// The rate service has no cached or stale rate for the currency pair.
    ///
    /// The converted amount should be displayed as unknown until a refresh
    /// delivers a rate. The affected row remains otherwise valid.
    #[error("no exchange rate is available from {from} to {to}")]
    ConversionUnavailable {
        /// The currency the amount was entered in.
        from: CurrencyCode,
        /// The currency the amount should be converted to.
        to: CurrencyCode,
    },

    /// A string could not be parsed as a three letter currency code.
    #[error("{0:?} is not a valid currency code")]
    InvalidCurrencyCode(String),

    /// The row key does not refer to a row in the working copy.
    #[error("no row in the grid has the given key")]
    RowNotFound(RowKey),

    /// Tried to edit a row that has been marked for deletion.
    #[error("cannot edit a row that is marked for deletion")]
    RowDeleted(RowKey),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A block of rows could not be serialized to or parsed from clipboard
    /// text.
    #[error("could not copy or paste rows: {0}")]
    Clipboard(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            value => {
                tracing::error!("an unhandled SQL error occurred: {value}");
                Error::SqlError(value)
            }
        }
    }
}

/// The validation failures attached to a single row when a save was blocked.
#[derive(Clone, Debug, PartialEq)]
pub struct RowValidation {
    /// The key of the invalid row.
    pub key: RowKey,
    /// The field level errors recorded against the row.
    pub errors: Vec<FieldError>,
}
