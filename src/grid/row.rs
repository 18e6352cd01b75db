//! Row state for the transaction grid.

use time::Date;

use crate::{
    DatabaseId,
    conversion::Conversion,
    models::{DATE_FORMAT, CurrencyCode, Field, FieldError, Transaction, TransactionDraft},
};

/// A stable handle to a row in the grid, independent of display position.
///
/// Keys are allocated by the controller and never reused, so the
/// presentation layer can hold on to them across inserts and removals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(pub(crate) u64);

/// The change-tracking state of a grid row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowState {
    /// The row matches the persistence store.
    Clean,
    /// The row was added in the grid and has never been persisted.
    New,
    /// A persisted row with unsaved field edits.
    Modified,
    /// A persisted row soft-marked for deletion on the next save.
    Deleted,
    /// The row has at least one field level validation error and blocks
    /// saving.
    Invalid,
}

/// The change-tracking fields of a row, captured together so they can be
/// restored by undo.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Tracking {
    pub state: RowState,
    pub resume_state: RowState,
    pub errors: Vec<FieldError>,
}

/// A single row of the grid's working copy.
#[derive(Clone, Debug, PartialEq)]
pub struct GridRow {
    pub(crate) key: RowKey,
    pub(crate) id: Option<DatabaseId>,
    pub(crate) draft: TransactionDraft,
    pub(crate) converted: Option<Conversion>,
    pub(crate) state: RowState,
    // The state the row returns to once its validation errors clear.
    pub(crate) resume_state: RowState,
    pub(crate) errors: Vec<FieldError>,
}

impl GridRow {
    /// A row that mirrors a persisted `transaction`.
    pub(crate) fn clean(key: RowKey, transaction: Transaction) -> Self {
        Self {
            key,
            id: Some(transaction.id),
            draft: transaction.draft,
            converted: None,
            state: RowState::Clean,
            resume_state: RowState::Clean,
            errors: Vec::new(),
        }
    }

    /// A freshly added, unsaved row.
    pub(crate) fn added(key: RowKey, draft: TransactionDraft) -> Self {
        Self {
            key,
            id: None,
            draft,
            converted: None,
            state: RowState::New,
            resume_state: RowState::New,
            errors: Vec::new(),
        }
    }

    /// The row's stable handle.
    pub fn key(&self) -> RowKey {
        self.key
    }

    /// The persisted ID, or `None` for rows that have never been saved.
    pub fn id(&self) -> Option<DatabaseId> {
        self.id
    }

    /// The row's current field values.
    pub fn draft(&self) -> &TransactionDraft {
        &self.draft
    }

    /// The amount in the main currency, or `None` when no rate is available.
    pub fn converted(&self) -> Option<Conversion> {
        self.converted
    }

    /// The row's change-tracking state.
    pub fn state(&self) -> RowState {
        self.state
    }

    /// The field level validation errors recorded against the row.
    ///
    /// Empty unless [GridRow::state] is [RowState::Invalid].
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Record a validation error, remembering the state the row was in so it
    /// can be restored once the error clears.
    pub(crate) fn record_error(&mut self, error: FieldError) {
        if self.state != RowState::Invalid {
            self.resume_state = self.state;
            self.state = RowState::Invalid;
        }

        self.errors.retain(|existing| existing.field() != error.field());
        self.errors.push(error);
    }

    /// Clear any error recorded against `field`, restoring the remembered
    /// state when no errors remain.
    pub(crate) fn clear_error(&mut self, field: Field) {
        self.errors.retain(|existing| existing.field() != field);

        if self.errors.is_empty() && self.state == RowState::Invalid {
            self.state = self.resume_state;
        }
    }

    /// The current value of `field` as an edit, used to build inverse
    /// operations for undo.
    pub(crate) fn field_value(&self, field: Field) -> FieldEdit {
        match field {
            Field::Date => FieldEdit::Date(self.draft.date),
            Field::Description => FieldEdit::Description(self.draft.description.clone()),
            Field::Category => FieldEdit::Category(self.draft.category.clone()),
            Field::Amount => FieldEdit::Amount(self.draft.amount),
            Field::Currency => FieldEdit::Currency(self.draft.currency),
        }
    }

    /// Set a field value without validation or state transitions.
    pub(crate) fn set_field(&mut self, edit: FieldEdit) {
        match edit {
            FieldEdit::Date(date) => self.draft.date = date,
            FieldEdit::Description(text) => self.draft.description = text,
            FieldEdit::Category(text) => self.draft.category = text,
            FieldEdit::Amount(amount) => self.draft.amount = amount,
            FieldEdit::Currency(code) => self.draft.currency = code,
        }
    }

    pub(crate) fn tracking(&self) -> Tracking {
        Tracking {
            state: self.state,
            resume_state: self.resume_state,
            errors: self.errors.clone(),
        }
    }

    pub(crate) fn set_tracking(&mut self, tracking: Tracking) {
        self.state = tracking.state;
        self.resume_state = tracking.resume_state;
        self.errors = tracking.errors;
    }
}

/// An edit to a single field of a row.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldEdit {
    /// Change when the transaction happened.
    Date(Date),
    /// Change the transaction description.
    Description(String),
    /// Change the category label.
    Category(String),
    /// Change the amount, in the row's entry currency.
    Amount(f64),
    /// Change the currency the amount is entered in.
    Currency(CurrencyCode),
}

impl FieldEdit {
    /// The field this edit targets.
    pub fn field(&self) -> Field {
        match self {
            FieldEdit::Date(_) => Field::Date,
            FieldEdit::Description(_) => Field::Description,
            FieldEdit::Category(_) => Field::Category,
            FieldEdit::Amount(_) => Field::Amount,
            FieldEdit::Currency(_) => Field::Currency,
        }
    }

    /// Parse cell editor or clipboard text into an edit for `field`.
    ///
    /// # Errors
    /// Returns a [FieldError] describing the failure if `text` cannot be
    /// parsed as the field's type.
    pub fn parse(field: Field, text: &str) -> Result<FieldEdit, FieldError> {
        let text = text.trim();

        match field {
            Field::Date => Date::parse(text, DATE_FORMAT)
                .map(FieldEdit::Date)
                .map_err(|_| FieldError::Unparseable {
                    field,
                    text: text.to_string(),
                }),
            Field::Description => Ok(FieldEdit::Description(text.to_string())),
            Field::Category => Ok(FieldEdit::Category(text.to_string())),
            Field::Amount => text
                .parse::<f64>()
                .map(FieldEdit::Amount)
                .map_err(|_| FieldError::Unparseable {
                    field,
                    text: text.to_string(),
                }),
            Field::Currency => CurrencyCode::new(text)
                .map(FieldEdit::Currency)
                .map_err(|_| FieldError::InvalidCurrency(text.to_string())),
        }
    }
}

#[cfg(test)]
mod field_edit_tests {
    use time::macros::date;

    use crate::models::{CurrencyCode, Field, FieldError};

    use super::FieldEdit;

    #[test]
    fn parses_dates() {
        let edit = FieldEdit::parse(Field::Date, "2024-06-01");

        assert_eq!(edit, Ok(FieldEdit::Date(date!(2024 - 06 - 01))));
    }

    #[test]
    fn rejects_unparseable_date() {
        let edit = FieldEdit::parse(Field::Date, "June 1st");

        assert_eq!(
            edit,
            Err(FieldError::Unparseable {
                field: Field::Date,
                text: "June 1st".to_string()
            })
        );
    }

    #[test]
    fn parses_amounts() {
        let edit = FieldEdit::parse(Field::Amount, " 12.50 ");

        assert_eq!(edit, Ok(FieldEdit::Amount(12.5)));
    }

    #[test]
    fn rejects_unparseable_amount() {
        let edit = FieldEdit::parse(Field::Amount, "12,50");

        assert_eq!(
            edit,
            Err(FieldError::Unparseable {
                field: Field::Amount,
                text: "12,50".to_string()
            })
        );
    }

    #[test]
    fn parses_currency_codes() {
        let edit = FieldEdit::parse(Field::Currency, "usd");

        assert_eq!(
            edit,
            Ok(FieldEdit::Currency(CurrencyCode::new_unchecked("USD")))
        );
    }

    #[test]
    fn rejects_invalid_currency() {
        let edit = FieldEdit::parse(Field::Currency, "dollars");

        assert_eq!(edit, Err(FieldError::InvalidCurrency("dollars".to_string())));
    }
}
