//! Currency conversion backed by a cached exchange-rate table.
//!
//! The grid must never block user input on a rate lookup, so the converter
//! only ever performs synchronous cache reads plus a single non-blocking call
//! into the [RateSource]. When no fresh rate is available it falls back to
//! the most recent rate it has seen for the pair, flagged as stale.

use std::collections::HashMap;

use time::Date;

use crate::{Error, models::CurrencyCode};

/// A source of exchange rates.
///
/// Implementations must not block: `fetch` should return a rate that is
/// already available (e.g. from a local table or a completed background
/// request) or an error meaning "no rate yet". Returning an error is also
/// the signal for the implementation to schedule a background refresh;
/// the refreshed rate is delivered later via
/// [CurrencyConverter::insert_rate].
pub trait RateSource {
    /// The rate that converts one unit of `from` into `to` on `day`.
    ///
    /// # Errors
    /// Returns an [Error::ConversionUnavailable] (or another error) if no
    /// rate is available right now.
    fn fetch(&mut self, from: CurrencyCode, to: CurrencyCode, day: Date) -> Result<f64, Error>;
}

/// A rate source backed by a fixed in-memory table.
///
/// Used for offline operation (rates loaded from the config file) and in
/// tests. The table ignores the requested day.
#[derive(Clone, Debug, Default)]
pub struct FixedRateSource {
    rates: HashMap<(CurrencyCode, CurrencyCode), f64>,
}

impl FixedRateSource {
    /// Set the rate that converts one unit of `from` into `to`.
    pub fn set_rate(&mut self, from: CurrencyCode, to: CurrencyCode, rate: f64) {
        self.rates.insert((from, to), rate);
    }
}

impl RateSource for FixedRateSource {
    fn fetch(&mut self, from: CurrencyCode, to: CurrencyCode, _day: Date) -> Result<f64, Error> {
        self.rates
            .get(&(from, to))
            .copied()
            .ok_or(Error::ConversionUnavailable { from, to })
    }
}

/// The result of converting an amount into the main currency.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Conversion {
    /// Converted with a rate for the requested day.
    Exact(f64),
    /// Converted with the most recent known rate because no rate for the
    /// requested day was available.
    Stale(f64),
}

impl Conversion {
    /// The converted amount, exact or stale.
    pub fn amount(self) -> f64 {
        match self {
            Conversion::Exact(amount) | Conversion::Stale(amount) => amount,
        }
    }

    /// Whether the conversion used a fallback rate from an earlier day.
    pub fn is_stale(self) -> bool {
        matches!(self, Conversion::Stale(_))
    }
}

/// Converts amounts between currencies, caching rates per day to bound the
/// volume of requests to the [RateSource].
#[derive(Clone, Debug)]
pub struct CurrencyConverter<S> {
    source: S,
    rates: HashMap<(CurrencyCode, CurrencyCode, Date), f64>,
    latest: HashMap<(CurrencyCode, CurrencyCode), (Date, f64)>,
}

impl<S: RateSource> CurrencyConverter<S> {
    /// Create a converter that fetches missing rates from `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            rates: HashMap::new(),
            latest: HashMap::new(),
        }
    }

    /// Convert `amount` from `from` into `to` using the rate for `day`.
    ///
    /// Cache hits and identity conversions return synchronously. On a cache
    /// miss the source is asked once; if it has no rate either, the most
    /// recent cached rate for the pair is used and flagged as
    /// [Conversion::Stale].
    ///
    /// # Errors
    /// Returns an [Error::ConversionUnavailable] if there is no fresh or
    /// stale rate for the pair.
    pub fn convert(
        &mut self,
        amount: f64,
        from: CurrencyCode,
        to: CurrencyCode,
        day: Date,
    ) -> Result<Conversion, Error> {
        if from == to {
            return Ok(Conversion::Exact(amount));
        }

        if let Some(&rate) = self.rates.get(&(from, to, day)) {
            return Ok(Conversion::Exact(amount * rate));
        }

        match self.source.fetch(from, to, day) {
            Ok(rate) => {
                self.insert_rate(from, to, day, rate);
                Ok(Conversion::Exact(amount * rate))
            }
            Err(error) => {
                tracing::debug!("rate {from}->{to} for {day} unavailable: {error}");

                match self.latest.get(&(from, to)) {
                    Some(&(_, rate)) => Ok(Conversion::Stale(amount * rate)),
                    None => Err(Error::ConversionUnavailable { from, to }),
                }
            }
        }
    }

    /// Record `rate` for the pair on `day`, e.g. when a background refresh
    /// completes.
    pub fn insert_rate(&mut self, from: CurrencyCode, to: CurrencyCode, day: Date, rate: f64) {
        self.rates.insert((from, to, day), rate);

        let is_newer = self
            .latest
            .get(&(from, to))
            .is_none_or(|&(latest_day, _)| day >= latest_day);

        if is_newer {
            self.latest.insert((from, to), (day, rate));
        }
    }
}

#[cfg(test)]
mod currency_converter_tests {
    use time::macros::date;

    use crate::{Error, models::CurrencyCode};

    use super::{Conversion, CurrencyConverter, FixedRateSource, RateSource};

    fn usd() -> CurrencyCode {
        CurrencyCode::new_unchecked("USD")
    }

    fn eur() -> CurrencyCode {
        CurrencyCode::new_unchecked("EUR")
    }

    /// Wraps a [FixedRateSource] and counts how often it is asked.
    struct CountingSource {
        inner: FixedRateSource,
        fetches: usize,
    }

    impl RateSource for CountingSource {
        fn fetch(
            &mut self,
            from: CurrencyCode,
            to: CurrencyCode,
            day: time::Date,
        ) -> Result<f64, Error> {
            self.fetches += 1;
            self.inner.fetch(from, to, day)
        }
    }

    #[test]
    fn identity_conversion_is_exact() {
        let mut converter = CurrencyConverter::new(FixedRateSource::default());

        let result = converter.convert(123.45, usd(), usd(), date!(2024 - 06 - 01));

        assert_eq!(result, Ok(Conversion::Exact(123.45)));
    }

    #[test]
    fn converts_with_fetched_rate() {
        let mut source = FixedRateSource::default();
        source.set_rate(usd(), eur(), 0.9);
        let mut converter = CurrencyConverter::new(source);

        let result = converter.convert(200.0, usd(), eur(), date!(2024 - 06 - 01));

        assert_eq!(result, Ok(Conversion::Exact(180.0)));
    }

    #[test]
    fn cache_hit_skips_the_source() {
        let mut inner = FixedRateSource::default();
        inner.set_rate(usd(), eur(), 0.9);
        let mut converter = CurrencyConverter::new(CountingSource { inner, fetches: 0 });
        let day = date!(2024 - 06 - 01);

        converter.convert(100.0, usd(), eur(), day).unwrap();
        converter.convert(50.0, usd(), eur(), day).unwrap();

        assert_eq!(converter.source.fetches, 1);
    }

    #[test]
    fn falls_back_to_stale_rate() {
        let mut converter = CurrencyConverter::new(FixedRateSource::default());
        converter.insert_rate(usd(), eur(), date!(2024 - 05 - 28), 0.85);

        let result = converter.convert(100.0, usd(), eur(), date!(2024 - 06 - 01));

        assert_eq!(result, Ok(Conversion::Stale(85.0)));
    }

    #[test]
    fn fails_without_any_rate() {
        let mut converter = CurrencyConverter::new(FixedRateSource::default());

        let result = converter.convert(100.0, usd(), eur(), date!(2024 - 06 - 01));

        assert_eq!(
            result,
            Err(Error::ConversionUnavailable {
                from: usd(),
                to: eur()
            })
        );
    }

    #[test]
    fn insert_rate_keeps_most_recent_as_fallback() {
        let mut converter = CurrencyConverter::new(FixedRateSource::default());
        converter.insert_rate(usd(), eur(), date!(2024 - 05 - 28), 0.85);
        converter.insert_rate(usd(), eur(), date!(2024 - 05 - 20), 0.80);

        let result = converter.convert(100.0, usd(), eur(), date!(2024 - 06 - 01));

        assert_eq!(result, Ok(Conversion::Stale(85.0)));
    }
}
