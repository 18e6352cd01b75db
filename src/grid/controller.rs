//! The transaction grid controller.
//!
//! One controller instance owns the working copy of one open document: it
//! mediates user edits, tracks per-row dirty/new/error state, and reconciles
//! with the persistence store on an explicit save. All mutation goes through
//! `&mut self`, so ownership confines the working copy to a single logical
//! thread.

use std::collections::{HashMap, VecDeque};

use time::{Date, OffsetDateTime};

use crate::{
    Error, RowValidation,
    conversion::{Conversion, CurrencyConverter, RateSource},
    models::{CurrencyCode, Field, FieldError, TransactionDraft, validate_amount, validate_date,
        validate_description},
    stores::TransactionStore,
};

use super::{
    row::{FieldEdit, GridRow, RowKey, RowState},
    undo::{Command, History},
};

/// A notification for the presentation layer, carrying enough data to
/// re-render one row's visual state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridEvent {
    /// A row was appended or re-inserted into the working copy.
    RowAdded {
        /// The key of the new row.
        key: RowKey,
    },
    /// A row's fields, converted amount, or change-tracking state changed.
    RowChanged {
        /// The key of the changed row.
        key: RowKey,
    },
    /// A row was removed from the working copy.
    RowRemoved {
        /// The key of the removed row.
        key: RowKey,
    },
    /// The whole working copy was replaced (load, discard, main currency
    /// change); every row should be re-rendered.
    Reloaded,
}

/// The result of applying one field edit.
#[derive(Clone, Debug, PartialEq)]
pub enum EditOutcome {
    /// The value passed validation and was written to the row.
    Applied,
    /// The value failed validation; the row is now [RowState::Invalid] and
    /// the previous value is untouched.
    Rejected(FieldError),
}

/// Counts of the store operations performed by a successful save.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SaveSummary {
    /// Rows created in the store.
    pub created: usize,
    /// Rows updated in the store.
    pub updated: usize,
    /// Rows deleted from the store.
    pub deleted: usize,
}

/// Owns the in-memory working copy of transaction rows for one open
/// document and reconciles it with a [TransactionStore] on save.
#[derive(Debug)]
pub struct GridController<S, R>
where
    S: TransactionStore,
    R: RateSource,
{
    store: S,
    converter: CurrencyConverter<R>,
    main_currency: CurrencyCode,
    working_set: Vec<GridRow>,
    snapshot: Vec<GridRow>,
    next_key: u64,
    events: VecDeque<GridEvent>,
    history: History,
}

impl<S, R> GridController<S, R>
where
    S: TransactionStore,
    R: RateSource,
{
    /// Create a controller with an empty working copy.
    ///
    /// Call [GridController::load] to populate it from the store.
    pub fn new(store: S, converter: CurrencyConverter<R>, main_currency: CurrencyCode) -> Self {
        Self {
            store,
            converter,
            main_currency,
            working_set: Vec::new(),
            snapshot: Vec::new(),
            next_key: 0,
            events: VecDeque::new(),
            history: History::default(),
        }
    }

    /// The rows of the working copy in display order.
    pub fn rows(&self) -> &[GridRow] {
        &self.working_set
    }

    /// Look up a row by its key.
    pub fn row(&self, key: RowKey) -> Option<&GridRow> {
        self.working_set.iter().find(|row| row.key == key)
    }

    /// The currency converted amounts are expressed in.
    pub fn main_currency(&self) -> CurrencyCode {
        self.main_currency
    }

    /// Whether the working copy differs from the last-saved snapshot.
    pub fn is_dirty(&self) -> bool {
        self.working_set.iter().any(|row| row.state != RowState::Clean)
    }

    /// Take the pending presentation notifications, oldest first.
    pub fn drain_events(&mut self) -> Vec<GridEvent> {
        self.events.drain(..).collect()
    }

    /// Replace the working copy with the store's contents.
    ///
    /// Unsaved new rows are kept at the end of the grid, as they exist only
    /// in the working copy. Undo history is cleared.
    ///
    /// # Errors
    /// Returns the store's error if the transactions could not be read.
    pub fn load(&mut self) -> Result<(), Error> {
        let transactions = self.store.get_all()?;

        let unsaved: Vec<GridRow> = self
            .working_set
            .drain(..)
            .filter(|row| row.id.is_none())
            .collect();

        let mut rows = Vec::with_capacity(transactions.len() + unsaved.len());

        for transaction in transactions {
            let key = self.allocate_key();
            let mut row = GridRow::clean(key, transaction);
            row.converted =
                Self::convert_draft(&mut self.converter, self.main_currency, &row.draft);
            rows.push(row);
        }

        self.snapshot = rows.clone();
        rows.extend(unsaved);
        self.working_set = rows;

        self.history.clear();
        self.events.push_back(GridEvent::Reloaded);
        tracing::info!(
            "loaded {} transaction(s), kept {} unsaved row(s)",
            self.snapshot.len(),
            self.working_set.len() - self.snapshot.len()
        );

        Ok(())
    }

    /// Append a new, unsaved row with default fields and return its key.
    ///
    /// The row is dated today and entered in the main currency. The store is
    /// not touched until [GridController::save].
    pub fn add_row(&mut self) -> RowKey {
        let key = self.allocate_key();
        let draft = TransactionDraft::new(today(), self.main_currency);
        let mut row = GridRow::added(key, draft);
        row.converted = Self::convert_draft(&mut self.converter, self.main_currency, &row.draft);

        self.working_set.push(row);
        self.history.record(Command::Unadd { key });
        self.events.push_back(GridEvent::RowAdded { key });

        key
    }

    /// Apply a single field edit to the row with `key`.
    ///
    /// A value that fails validation does not overwrite the previous value;
    /// instead the row becomes [RowState::Invalid] with the failure recorded
    /// against the field, and the outcome is [EditOutcome::Rejected]. A
    /// failure on one row never affects sibling rows.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::RowNotFound] if `key` does not refer to a row,
    /// - or [Error::RowDeleted] if the row is marked for deletion.
    pub fn edit_field(&mut self, key: RowKey, edit: FieldEdit) -> Result<EditOutcome, Error> {
        let index = self.index_of(key)?;

        if self.working_set[index].state == RowState::Deleted {
            return Err(Error::RowDeleted(key));
        }

        let validation = match &edit {
            FieldEdit::Date(date) => validate_date(*date),
            FieldEdit::Description(text) => validate_description(text),
            FieldEdit::Amount(amount) => validate_amount(*amount),
            FieldEdit::Category(_) | FieldEdit::Currency(_) => Ok(()),
        };

        if let Err(error) = validation {
            self.reject(index, error.clone());
            return Ok(EditOutcome::Rejected(error));
        }

        let field = edit.field();
        let row = &mut self.working_set[index];
        let tracking = row.tracking();
        let previous = row.field_value(field);

        row.clear_error(field);
        match row.state {
            RowState::Clean => row.state = RowState::Modified,
            RowState::Invalid if row.resume_state == RowState::Clean => {
                row.resume_state = RowState::Modified
            }
            _ => {}
        }

        row.set_field(edit);

        if matters_to_conversion(field) {
            row.converted =
                Self::convert_draft(&mut self.converter, self.main_currency, &row.draft);
        }

        self.history.record(Command::Edit {
            key,
            value: previous,
            tracking,
        });
        self.events.push_back(GridEvent::RowChanged { key });

        Ok(EditOutcome::Applied)
    }

    /// Parse `text` as a value for `field` and apply it to the row.
    ///
    /// Text that cannot be parsed is treated like any other validation
    /// failure: the row becomes [RowState::Invalid] with the previous value
    /// untouched.
    ///
    /// # Errors
    /// Same as [GridController::edit_field].
    pub fn edit_field_text(
        &mut self,
        key: RowKey,
        field: Field,
        text: &str,
    ) -> Result<EditOutcome, Error> {
        match FieldEdit::parse(field, text) {
            Ok(edit) => self.edit_field(key, edit),
            Err(error) => {
                let index = self.index_of(key)?;

                if self.working_set[index].state == RowState::Deleted {
                    return Err(Error::RowDeleted(key));
                }

                self.reject(index, error.clone());
                Ok(EditOutcome::Rejected(error))
            }
        }
    }

    /// Delete the row with `key`.
    ///
    /// Rows that have never been persisted are removed immediately; there is
    /// nothing to reconcile. Persisted rows are soft-marked
    /// [RowState::Deleted] and removed by the next save. Deleting an
    /// already-marked row is a no-op.
    ///
    /// # Errors
    /// Returns an [Error::RowNotFound] if `key` does not refer to a row.
    pub fn delete_row(&mut self, key: RowKey) -> Result<(), Error> {
        let index = self.index_of(key)?;

        if self.working_set[index].id.is_none() {
            let row = self.working_set.remove(index);
            self.history.record(Command::Insert { index, row });
            self.events.push_back(GridEvent::RowRemoved { key });
            return Ok(());
        }

        let row = &mut self.working_set[index];

        if row.state == RowState::Deleted {
            return Ok(());
        }

        let tracking = row.tracking();
        row.errors.clear();
        row.state = RowState::Deleted;

        self.history.record(Command::SetTracking { key, tracking });
        self.events.push_back(GridEvent::RowChanged { key });

        Ok(())
    }

    /// Remove every unsaved new row from the working copy.
    pub fn clear_new_rows(&mut self) {
        let mut index = 0;

        while index < self.working_set.len() {
            if self.working_set[index].id.is_none() {
                let row = self.working_set.remove(index);
                let key = row.key;
                self.history.record(Command::Insert { index, row });
                self.events.push_back(GridEvent::RowRemoved { key });
            } else {
                index += 1;
            }
        }
    }

    /// Write the working copy's changes to the store.
    ///
    /// Rows are processed in display order: new rows are created, modified
    /// rows updated, and deleted rows deleted then removed from the working
    /// copy. On success every remaining row is [RowState::Clean] and the
    /// snapshot is refreshed.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::Validation] with every failing row's errors if any row is
    ///   [RowState::Invalid] or an unsaved row's draft fails validation; in
    ///   that case no store call is made,
    /// - or [Error::SaveAborted] if a store call fails; rows written before
    ///   the failure stay clean, the rest keep their pre-save state.
    pub fn save(&mut self) -> Result<SaveSummary, Error> {
        let invalid: Vec<RowValidation> = self
            .working_set
            .iter()
            .filter_map(|row| {
                let mut errors = row.errors.clone();

                // Rows that were never edited after being added still need
                // their defaults checked, e.g. an empty description.
                if matches!(row.state, RowState::New | RowState::Modified) {
                    for error in row.draft.validate() {
                        if !errors.contains(&error) {
                            errors.push(error);
                        }
                    }
                }

                if errors.is_empty() {
                    None
                } else {
                    Some(RowValidation {
                        key: row.key,
                        errors,
                    })
                }
            })
            .collect();

        if !invalid.is_empty() {
            tracing::warn!("save blocked by {} invalid row(s)", invalid.len());
            return Err(Error::Validation(invalid));
        }

        let mut summary = SaveSummary::default();
        let mut saved = Vec::new();
        let mut failure = None;
        let mut index = 0;

        while index < self.working_set.len() {
            let row = &mut self.working_set[index];

            match row.state {
                RowState::Clean | RowState::Invalid => index += 1,
                RowState::New | RowState::Modified => {
                    let result = match row.id {
                        None => self.store.create(&row.draft).map(|transaction| {
                            row.id = Some(transaction.id);
                            summary.created += 1;
                        }),
                        Some(id) => self.store.update(id, &row.draft).inspect(|_| {
                            summary.updated += 1;
                        }),
                    };

                    match result {
                        Ok(()) => {
                            row.state = RowState::Clean;
                            row.resume_state = RowState::Clean;
                            saved.push(row.key);
                            self.events.push_back(GridEvent::RowChanged { key: row.key });
                            index += 1;
                        }
                        Err(error) => {
                            failure = Some((row.key, error));
                            break;
                        }
                    }
                }
                RowState::Deleted => {
                    let result = match row.id {
                        Some(id) => self.store.delete(id),
                        None => Ok(()),
                    };

                    match result {
                        Ok(()) => {
                            let removed = self.working_set.remove(index);
                            summary.deleted += 1;
                            saved.push(removed.key);
                            self.events
                                .push_back(GridEvent::RowRemoved { key: removed.key });
                        }
                        Err(error) => {
                            failure = Some((row.key, error));
                            break;
                        }
                    }
                }
            }
        }

        if let Some((failed, source)) = failure {
            self.patch_snapshot();
            tracing::error!("save aborted at row {failed:?}: {source}");

            return Err(Error::SaveAborted {
                saved,
                failed,
                source: Box::new(source),
            });
        }

        self.snapshot = self.working_set.clone();
        self.history.clear();
        tracing::info!(
            "saved working copy: {} created, {} updated, {} deleted",
            summary.created,
            summary.updated,
            summary.deleted
        );

        Ok(summary)
    }

    /// Throw away all unsaved changes, restoring the last-saved snapshot.
    pub fn discard(&mut self) {
        self.working_set = self.snapshot.clone();
        self.history.clear();
        self.events.push_back(GridEvent::Reloaded);
        tracing::debug!("discarded working copy, {} row(s) restored", self.working_set.len());
    }

    /// Change the currency converted amounts are expressed in and recompute
    /// every row's converted amount.
    pub fn set_main_currency(&mut self, main_currency: CurrencyCode) {
        self.main_currency = main_currency;

        for index in 0..self.working_set.len() {
            let converted = Self::convert_draft(
                &mut self.converter,
                self.main_currency,
                &self.working_set[index].draft,
            );
            self.working_set[index].converted = converted;
        }

        self.events.push_back(GridEvent::Reloaded);
    }

    /// Deliver a freshly fetched exchange rate, e.g. from a completed
    /// background refresh, and update the rows it affects.
    pub fn apply_rate(&mut self, from: CurrencyCode, to: CurrencyCode, day: Date, rate: f64) {
        self.converter.insert_rate(from, to, day, rate);

        if to != self.main_currency {
            return;
        }

        for index in 0..self.working_set.len() {
            if self.working_set[index].draft.currency != from {
                continue;
            }

            let converted = Self::convert_draft(
                &mut self.converter,
                self.main_currency,
                &self.working_set[index].draft,
            );
            let row = &mut self.working_set[index];

            if row.converted != converted {
                row.converted = converted;
                self.events.push_back(GridEvent::RowChanged { key: row.key });
            }
        }
    }

    /// Reverse the most recent mutation.
    ///
    /// Returns `false` when there is nothing to undo.
    ///
    /// # Errors
    /// Returns an [Error::RowNotFound] if the recorded operation no longer
    /// matches the working copy.
    pub fn undo(&mut self) -> Result<bool, Error> {
        let Some(command) = self.history.pop_undo() else {
            return Ok(false);
        };

        let inverse = self.apply(command)?;
        self.history.push_redo(inverse);

        Ok(true)
    }

    /// Re-apply the most recently undone mutation.
    ///
    /// Returns `false` when there is nothing to redo.
    ///
    /// # Errors
    /// Returns an [Error::RowNotFound] if the recorded operation no longer
    /// matches the working copy.
    pub fn redo(&mut self) -> Result<bool, Error> {
        let Some(command) = self.history.pop_redo() else {
            return Ok(false);
        };

        let inverse = self.apply(command)?;
        self.history.push_undo(inverse);

        Ok(true)
    }

    /// Apply a recorded command and return its inverse.
    fn apply(&mut self, command: Command) -> Result<Command, Error> {
        match command {
            Command::Edit {
                key,
                value,
                tracking,
            } => {
                let index = self.index_of(key)?;
                let row = &mut self.working_set[index];
                let field = value.field();
                let inverse_value = row.field_value(field);
                let inverse_tracking = row.tracking();

                row.set_field(value);
                row.set_tracking(tracking);

                if matters_to_conversion(field) {
                    row.converted =
                        Self::convert_draft(&mut self.converter, self.main_currency, &row.draft);
                }

                self.events.push_back(GridEvent::RowChanged { key });

                Ok(Command::Edit {
                    key,
                    value: inverse_value,
                    tracking: inverse_tracking,
                })
            }
            Command::Unadd { key } => {
                let index = self.index_of(key)?;
                let row = self.working_set.remove(index);

                self.events.push_back(GridEvent::RowRemoved { key });

                Ok(Command::Insert { index, row })
            }
            Command::Insert { index, row } => {
                let key = row.key;
                let index = index.min(self.working_set.len());

                self.working_set.insert(index, row);
                self.events.push_back(GridEvent::RowAdded { key });

                Ok(Command::Unadd { key })
            }
            Command::SetTracking { key, tracking } => {
                let index = self.index_of(key)?;
                let row = &mut self.working_set[index];
                let inverse = row.tracking();

                row.set_tracking(tracking);
                self.events.push_back(GridEvent::RowChanged { key });

                Ok(Command::SetTracking {
                    key,
                    tracking: inverse,
                })
            }
        }
    }

    /// Record a validation failure against the row at `index`.
    fn reject(&mut self, index: usize, error: FieldError) {
        let row = &mut self.working_set[index];
        let key = row.key;
        let tracking = row.tracking();

        row.record_error(error);

        self.history.record(Command::SetTracking { key, tracking });
        self.events.push_back(GridEvent::RowChanged { key });
    }

    /// Rebuild the snapshot after a partially failed save so that discard
    /// matches what the store now holds: rows that were written appear with
    /// their new values, the rest keep their last-saved values.
    fn patch_snapshot(&mut self) {
        let old: HashMap<RowKey, GridRow> = self
            .snapshot
            .drain(..)
            .map(|row| (row.key, row))
            .collect();

        let mut snapshot = Vec::new();

        for row in &self.working_set {
            if row.state == RowState::Clean {
                snapshot.push(row.clone());
            } else if let Some(entry) = old.get(&row.key) {
                snapshot.push(entry.clone());
            }
        }

        self.snapshot = snapshot;
    }

    fn index_of(&self, key: RowKey) -> Result<usize, Error> {
        self.working_set
            .iter()
            .position(|row| row.key == key)
            .ok_or(Error::RowNotFound(key))
    }

    fn allocate_key(&mut self) -> RowKey {
        let key = RowKey(self.next_key);
        self.next_key += 1;

        key
    }

    fn convert_draft(
        converter: &mut CurrencyConverter<R>,
        main_currency: CurrencyCode,
        draft: &TransactionDraft,
    ) -> Option<Conversion> {
        match converter.convert(draft.amount, draft.currency, main_currency, draft.date) {
            Ok(conversion) => Some(conversion),
            Err(error) => {
                tracing::debug!("converted amount unavailable: {error}");
                None
            }
        }
    }
}

/// Whether editing `field` changes the converted amount.
fn matters_to_conversion(field: Field) -> bool {
    matches!(field, Field::Date | Field::Amount | Field::Currency)
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}
