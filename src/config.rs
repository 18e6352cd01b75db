//! Application configuration loaded from a JSON file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, models::CurrencyCode};

/// An exchange rate entry preloaded from the config file, used when no
/// network-backed rate source is available.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    /// The currency converted from.
    pub from: CurrencyCode,
    /// The currency converted to.
    pub to: CurrencyCode,
    /// The rate that converts one unit of `from` into `to`.
    pub rate: f64,
}

/// The application configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// File path to the SQLite database.
    pub db_path: PathBuf,
    /// The currency converted amounts are expressed in.
    pub main_currency: CurrencyCode,
    /// Exchange rates to preload into the converter.
    #[serde(default)]
    pub rates: Vec<RateEntry>,
}

impl Config {
    /// Read a configuration from the JSON file at `path`.
    ///
    /// # Errors
    /// Returns an [Error::InvalidConfig] if the file cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|error| {
            Error::InvalidConfig(format!("could not read {}: {error}", path.display()))
        })?;

        serde_json::from_str(&text).map_err(|error| {
            Error::InvalidConfig(format!("could not parse {}: {error}", path.display()))
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("gridbook.db"),
            main_currency: CurrencyCode::new_unchecked("USD"),
            rates: Vec::new(),
        }
    }
}
