//! Tab-separated copy and paste of row blocks.
//!
//! Rows are serialized in the column order date, description, category,
//! amount, currency, one row per line with tab separators, so blocks can be
//! exchanged with spreadsheet applications. Pasted cells flow through the
//! controller's normal edit path and get the same validation and change
//! tracking as hand-typed values.

use crate::{
    Error,
    conversion::RateSource,
    grid::{GridController, RowKey},
    models::{DATE_FORMAT, Field},
    stores::TransactionStore,
};

/// The column order used for clipboard text.
const COLUMNS: [Field; 5] = [
    Field::Date,
    Field::Description,
    Field::Category,
    Field::Amount,
    Field::Currency,
];

/// Serialize the rows with `keys` to tab-separated clipboard text.
///
/// # Errors
/// Returns an [Error::RowNotFound] if a key does not refer to a row, or an
/// [Error::Clipboard] if the text could not be produced.
pub fn copy_rows<S, R>(controller: &GridController<S, R>, keys: &[RowKey]) -> Result<String, Error>
where
    S: TransactionStore,
    R: RateSource,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(Vec::new());

    for &key in keys {
        let row = controller.row(key).ok_or(Error::RowNotFound(key))?;
        let draft = row.draft();
        let date = draft
            .date
            .format(DATE_FORMAT)
            .map_err(|error| Error::Clipboard(error.to_string()))?;

        writer
            .write_record([
                date.as_str(),
                &draft.description,
                &draft.category,
                &draft.amount.to_string(),
                draft.currency.as_str(),
            ])
            .map_err(|error| Error::Clipboard(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::Clipboard(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::Clipboard(error.to_string()))
}

/// Paste tab-separated clipboard text as new rows at the end of the grid.
///
/// Each line becomes one new row. Cells are applied left to right in the
/// clipboard column order; empty cells leave the row's default value in
/// place. Cells that fail parsing or validation mark their row invalid, the
/// same as a hand-typed bad value.
///
/// # Errors
/// Returns an [Error::Clipboard] if `text` is not valid tab-separated data.
pub fn paste_rows<S, R>(
    controller: &mut GridController<S, R>,
    text: &str,
) -> Result<Vec<RowKey>, Error>
where
    S: TransactionStore,
    R: RateSource,
{
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut keys = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|error| Error::Clipboard(error.to_string()))?;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let key = controller.add_row();
        keys.push(key);

        for (field, cell) in COLUMNS.into_iter().zip(record.iter()) {
            if cell.trim().is_empty() {
                continue;
            }

            controller.edit_field_text(key, field, cell)?;
        }
    }

    Ok(keys)
}

#[cfg(test)]
mod clipboard_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        conversion::{CurrencyConverter, FixedRateSource},
        db::initialize,
        grid::{FieldEdit, GridController, RowState},
        models::CurrencyCode,
        stores::SQLiteTransactionStore,
    };

    use super::{copy_rows, paste_rows};

    fn get_controller() -> GridController<SQLiteTransactionStore, FixedRateSource> {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let store = SQLiteTransactionStore::new(Arc::new(Mutex::new(connection)));
        let mut source = FixedRateSource::default();
        source.set_rate(
            CurrencyCode::new_unchecked("USD"),
            CurrencyCode::new_unchecked("EUR"),
            0.9,
        );

        GridController::new(
            store,
            CurrencyConverter::new(source),
            CurrencyCode::new_unchecked("EUR"),
        )
    }

    #[test]
    fn copy_produces_tab_separated_lines() {
        let mut controller = get_controller();
        let key = controller.add_row();
        controller
            .edit_field(key, FieldEdit::Date(date!(2024 - 06 - 01)))
            .unwrap();
        controller
            .edit_field(key, FieldEdit::Description("Coffee".to_string()))
            .unwrap();
        controller
            .edit_field(key, FieldEdit::Category("Eating out".to_string()))
            .unwrap();
        controller.edit_field(key, FieldEdit::Amount(4.5)).unwrap();
        controller
            .edit_field(key, FieldEdit::Currency(CurrencyCode::new_unchecked("USD")))
            .unwrap();

        let text = copy_rows(&controller, &[key]).unwrap();

        assert_eq!(text, "2024-06-01\tCoffee\tEating out\t4.5\tUSD\n");
    }

    #[test]
    fn paste_creates_rows_through_the_edit_path() {
        let mut controller = get_controller();

        let keys = paste_rows(
            &mut controller,
            "2024-06-01\tCoffee\tEating out\t4.5\tUSD\n2024-06-02\tGroceries\tFood\t20\tEUR\n",
        )
        .unwrap();

        assert_eq!(keys.len(), 2);
        let first = controller.row(keys[0]).unwrap();
        assert_eq!(first.state(), RowState::New);
        assert_eq!(first.draft().description, "Coffee");
        assert_eq!(first.draft().amount, 4.5);
        assert_eq!(first.draft().currency, CurrencyCode::new_unchecked("USD"));
        assert_eq!(first.converted().unwrap().amount(), 4.5 * 0.9);

        let second = controller.row(keys[1]).unwrap();
        assert_eq!(second.draft().date, date!(2024 - 06 - 02));
        assert_eq!(second.draft().amount, 20.0);
    }

    #[test]
    fn pasted_bad_cell_marks_the_row_invalid() {
        let mut controller = get_controller();

        let keys = paste_rows(
            &mut controller,
            "2024-06-01\tCoffee\tEating out\tlots\tUSD\n",
        )
        .unwrap();

        let row = controller.row(keys[0]).unwrap();
        assert_eq!(row.state(), RowState::Invalid);
        assert_eq!(row.draft().amount, 0.0);
    }

    #[test]
    fn paste_skips_blank_lines() {
        let mut controller = get_controller();

        let keys = paste_rows(&mut controller, "\n2024-06-01\tCoffee\t\t4.5\tEUR\n\n").unwrap();

        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn copy_then_paste_round_trips_values() {
        let mut controller = get_controller();
        let key = controller.add_row();
        controller
            .edit_field(key, FieldEdit::Description("Rent".to_string()))
            .unwrap();
        controller
            .edit_field(key, FieldEdit::Amount(1200.0))
            .unwrap();

        let text = copy_rows(&controller, &[key]).unwrap();
        let keys = paste_rows(&mut controller, &text).unwrap();

        let pasted = controller.row(keys[0]).unwrap();
        assert_eq!(pasted.draft(), controller.row(key).unwrap().draft());
    }
}
