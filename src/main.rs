use std::{
    path::PathBuf,
    process::exit,
    sync::{Arc, Mutex},
};

use clap::Parser;
use numfmt::{Formatter, Precision};
use rusqlite::Connection;

use gridbook::{
    config::Config,
    conversion::{Conversion, CurrencyConverter, FixedRateSource},
    grid::GridController,
    initialize_db, logging,
    models::{CurrencyCode, DATE_FORMAT},
    stores::SQLiteTransactionStore,
};

/// Inspect a gridbook transaction database from the command line.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to a JSON configuration file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// File path to the SQLite database (overrides the config file).
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// The currency converted amounts are shown in (overrides the config
    /// file).
    #[arg(long)]
    main_currency: Option<String>,
}

fn main() {
    logging::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(error) => {
                eprintln!("{error}");
                exit(1);
            }
        },
        None => Config::default(),
    };

    if let Some(db_path) = args.db_path {
        config.db_path = db_path;
    }

    if let Some(code) = args.main_currency {
        config.main_currency = match CurrencyCode::new(&code) {
            Ok(code) => code,
            Err(error) => {
                eprintln!("{error}");
                exit(1);
            }
        };
    }

    let connection = match Connection::open(&config.db_path) {
        Ok(connection) => connection,
        Err(error) => {
            eprintln!("could not open {}: {error}", config.db_path.display());
            exit(1);
        }
    };

    if let Err(error) = initialize_db(&connection) {
        eprintln!("could not initialize the database: {error}");
        exit(1);
    }

    let store = SQLiteTransactionStore::new(Arc::new(Mutex::new(connection)));

    let mut source = FixedRateSource::default();
    for entry in &config.rates {
        source.set_rate(entry.from, entry.to, entry.rate);
    }

    let mut controller = GridController::new(
        store,
        CurrencyConverter::new(source),
        config.main_currency,
    );

    if let Err(error) = controller.load() {
        eprintln!("could not load transactions: {error}");
        exit(1);
    }

    print_grid(&controller);
}

fn print_grid<S, R>(controller: &GridController<S, R>)
where
    S: gridbook::stores::TransactionStore,
    R: gridbook::conversion::RateSource,
{
    let main_currency = controller.main_currency();

    println!(
        "{:<10}  {:<30}  {:<15}  {:>14}  {:>14}",
        "Date",
        "Description",
        "Category",
        "Amount",
        format!("In {main_currency}")
    );

    for row in controller.rows() {
        let draft = row.draft();
        let date = draft
            .date
            .format(DATE_FORMAT)
            .unwrap_or_else(|_| "??".to_string());
        let amount = format!("{} {}", format_amount(draft.amount), draft.currency);
        let converted = match row.converted() {
            Some(Conversion::Exact(amount)) => format_amount(amount),
            Some(Conversion::Stale(amount)) => format!("~{}", format_amount(amount)),
            None => "?".to_string(),
        };

        println!(
            "{:<10}  {:<30}  {:<15}  {:>14}  {:>14}",
            date, draft.description, draft.category, amount, converted
        );
    }
}

fn format_amount(amount: f64) -> String {
    let formatter = Formatter::new()
        .precision(Precision::Decimals(2))
        .separator(',')
        .unwrap();

    let mut formatted_string = if amount == 0.0 {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        "0.00".to_owned()
    } else {
        formatter.fmt_string(amount)
    };

    // numfmt omits the last trailing zero, so we must add it ourselves
    // For example, "12.30" is rendered as "12.3" so we append "0".
    if formatted_string.as_bytes()[formatted_string.len() - 3] != b'.' {
        formatted_string = format!("{formatted_string}0");
    }

    formatted_string
}
