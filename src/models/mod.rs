//! Data models for transactions and currencies.

mod currency;
mod transaction;

pub use currency::CurrencyCode;
pub use transaction::{
    DATE_FORMAT, Field, FieldError, Transaction, TransactionDraft, validate_amount, validate_date,
    validate_description,
};
