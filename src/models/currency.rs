//! Defines the `CurrencyCode` type used to label transaction amounts.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::Error;

/// An ISO 4217 style currency code, e.g. `USD` or `EUR`.
///
/// Codes are always stored as three uppercase ASCII letters. Use
/// [CurrencyCode::new] to create a code from user input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// Create a currency code from a string such as "usd" or "EUR".
    ///
    /// Leading and trailing whitespace is trimmed and letters are converted
    /// to uppercase.
    ///
    /// # Errors
    /// This function will return an [Error::InvalidCurrencyCode] if `code` is
    /// not exactly three ASCII letters.
    pub fn new(code: &str) -> Result<Self, Error> {
        let code = code.trim();
        let bytes = code.as_bytes();

        if bytes.len() != 3 || !bytes.iter().all(|byte| byte.is_ascii_alphabetic()) {
            return Err(Error::InvalidCurrencyCode(code.to_string()));
        }

        let mut letters = [0u8; 3];

        for (letter, byte) in letters.iter_mut().zip(bytes) {
            *letter = byte.to_ascii_uppercase();
        }

        Ok(Self(letters))
    }

    /// Create a currency code without validation.
    ///
    /// The caller should ensure that the string is exactly three ASCII
    /// letters.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`,
    /// because if the three-letter invariant is violated it will cause
    /// incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(code: &str) -> Self {
        let mut letters = [b'?'; 3];

        for (letter, byte) in letters.iter_mut().zip(code.as_bytes()) {
            *letter = byte.to_ascii_uppercase();
        }

        Self(letters)
    }

    /// The code as a string slice, e.g. "USD".
    pub fn as_str(&self) -> &str {
        // The constructors only accept ASCII letters.
        std::str::from_utf8(&self.0).expect("currency codes contain only ASCII letters")
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.as_str().to_string()
    }
}

impl ToSql for CurrencyCode {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(ValueRef::Text(&self.0)))
    }
}

impl FromSql for CurrencyCode {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        CurrencyCode::new(text).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

#[cfg(test)]
mod currency_code_tests {
    use super::CurrencyCode;
    use crate::Error;

    #[test]
    fn new_uppercases_and_trims() {
        let code = CurrencyCode::new(" usd ").unwrap();

        assert_eq!(code.as_str(), "USD");
    }

    #[test]
    fn new_rejects_wrong_length() {
        let result = CurrencyCode::new("EURO");

        assert_eq!(result, Err(Error::InvalidCurrencyCode("EURO".to_string())));
    }

    #[test]
    fn new_rejects_non_letters() {
        let result = CurrencyCode::new("U5D");

        assert_eq!(result, Err(Error::InvalidCurrencyCode("U5D".to_string())));
    }

    #[test]
    fn serializes_as_string() {
        let code = CurrencyCode::new("nzd").unwrap();

        let json = serde_json::to_string(&code).unwrap();

        assert_eq!(json, "\"NZD\"");
    }

    #[test]
    fn deserializes_from_string() {
        let code: CurrencyCode = serde_json::from_str("\"gbp\"").unwrap();

        assert_eq!(code, CurrencyCode::new("GBP").unwrap());
    }

    #[test]
    fn deserialize_rejects_invalid_code() {
        let result: Result<CurrencyCode, _> = serde_json::from_str("\"pounds\"");

        assert!(result.is_err());
    }
}
