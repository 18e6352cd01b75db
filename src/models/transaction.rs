//! Defines the core transaction model and field level validation.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::{
    Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::{DatabaseId, models::CurrencyCode};

/// The date format used for display and clipboard text, e.g. `2026-08-29`.
pub const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Identifies one editable field of a transaction row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// When the transaction happened.
    Date,
    /// A text description of what the transaction was for.
    Description,
    /// A free-form category label, e.g. "Groceries".
    Category,
    /// The amount of money in the currency it was entered in.
    Amount,
    /// The currency the amount was entered in.
    Currency,
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::Date => "date",
            Field::Description => "description",
            Field::Category => "category",
            Field::Amount => "amount",
            Field::Currency => "currency",
        };

        write!(f, "{name}")
    }
}

/// A validation failure scoped to a single field of a single row.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum FieldError {
    /// An empty string was used as a transaction description.
    #[error("description must not be empty")]
    EmptyDescription,

    /// A negative amount was entered.
    #[error("amount must be >= 0")]
    NegativeAmount,

    /// The amount was NaN or infinite.
    #[error("amount must be a finite number")]
    NonFiniteAmount,

    /// A date in the future was used for a transaction.
    ///
    /// Transactions record events that have already happened, therefore
    /// future dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// A string that is not a three letter code was entered as a currency.
    #[error("{0:?} is not a valid currency code")]
    InvalidCurrency(String),

    /// Text from a cell editor or the clipboard could not be parsed as the
    /// target field's type.
    #[error("could not read {text:?} as a {field}")]
    Unparseable {
        /// The field the text was entered into.
        field: Field,
        /// The text that could not be parsed.
        text: String,
    },
}

impl FieldError {
    /// The field the error is attached to.
    pub fn field(&self) -> Field {
        match self {
            FieldError::EmptyDescription => Field::Description,
            FieldError::NegativeAmount | FieldError::NonFiniteAmount => Field::Amount,
            FieldError::FutureDate(_) => Field::Date,
            FieldError::InvalidCurrency(_) => Field::Currency,
            FieldError::Unparseable { field, .. } => *field,
        }
    }
}

/// The editable field values of a transaction.
///
/// A draft may exist only in the grid's working copy (an unsaved row) or be
/// the current values of a persisted [Transaction].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// A free-form category label.
    pub category: String,
    /// The amount of money, in `currency`, as entered by the user.
    pub amount: f64,
    /// The currency `amount` was entered in.
    pub currency: CurrencyCode,
}

impl TransactionDraft {
    /// Create an empty draft dated `date` in `currency`.
    pub fn new(date: Date, currency: CurrencyCode) -> Self {
        Self {
            date,
            description: String::new(),
            category: String::new(),
            amount: 0.0,
            currency,
        }
    }

    /// Validate every field of the draft, returning all failures.
    pub fn validate(&self) -> Vec<FieldError> {
        [
            validate_date(self.date),
            validate_description(&self.description),
            validate_amount(self.amount),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect()
    }
}

/// A transaction that exists in the persistence store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The transaction's field values.
    pub draft: TransactionDraft,
}

/// Check that a description is not empty or whitespace.
///
/// # Errors
/// Returns a [FieldError::EmptyDescription] if `description` is empty.
pub fn validate_description(description: &str) -> Result<(), FieldError> {
    if description.trim().is_empty() {
        Err(FieldError::EmptyDescription)
    } else {
        Ok(())
    }
}

/// Check that an amount is finite and not negative.
///
/// # Errors
/// Returns a [FieldError::NonFiniteAmount] or [FieldError::NegativeAmount]
/// if `amount` fails the corresponding constraint.
pub fn validate_amount(amount: f64) -> Result<(), FieldError> {
    if !amount.is_finite() {
        Err(FieldError::NonFiniteAmount)
    } else if amount < 0.0 {
        Err(FieldError::NegativeAmount)
    } else {
        Ok(())
    }
}

/// Check that a date is no later than today.
///
/// # Errors
/// Returns a [FieldError::FutureDate] if `date` is in the future.
pub fn validate_date(date: Date) -> Result<(), FieldError> {
    if date > OffsetDateTime::now_utc().date() {
        Err(FieldError::FutureDate(date))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod validation_tests {
    use time::{Duration, OffsetDateTime, macros::date};

    use super::{
        CurrencyCode, FieldError, TransactionDraft, validate_amount, validate_date,
        validate_description,
    };

    #[test]
    fn description_must_not_be_empty() {
        assert_eq!(validate_description("   "), Err(FieldError::EmptyDescription));
        assert_eq!(validate_description("Coffee"), Ok(()));
    }

    #[test]
    fn amount_must_be_non_negative() {
        assert_eq!(validate_amount(-5.0), Err(FieldError::NegativeAmount));
        assert_eq!(validate_amount(0.0), Ok(()));
        assert_eq!(validate_amount(12.34), Ok(()));
    }

    #[test]
    fn amount_must_be_finite() {
        assert_eq!(validate_amount(f64::NAN), Err(FieldError::NonFiniteAmount));
        assert_eq!(
            validate_amount(f64::INFINITY),
            Err(FieldError::NonFiniteAmount)
        );
    }

    #[test]
    fn date_must_not_be_in_the_future() {
        let tomorrow = OffsetDateTime::now_utc().date() + Duration::days(1);

        assert_eq!(validate_date(tomorrow), Err(FieldError::FutureDate(tomorrow)));
        assert_eq!(validate_date(date!(2020 - 01 - 15)), Ok(()));
    }

    #[test]
    fn empty_draft_reports_missing_description() {
        let draft = TransactionDraft::new(
            date!(2024 - 06 - 01),
            CurrencyCode::new_unchecked("USD"),
        );

        let errors = draft.validate();

        assert_eq!(errors, vec![FieldError::EmptyDescription]);
    }
}
