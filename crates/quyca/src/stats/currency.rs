//! APC currency normalization.
//!
//! Charges are converted to USD with a fixed exchange table and then brought
//! to a common year with the US consumer price index (CPI-U annual average).

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::error::{ServiceError, ServiceResult};

/// Most recent year in the built-in CPI series.
pub const LATEST_CPI_YEAR: i32 = 2024;

/// USD value of one unit of each currency.
const RATES_TO_USD: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 1.08),
    ("GBP", 1.27),
    ("CHF", 1.13),
    ("CAD", 0.74),
    ("AUD", 0.66),
    ("NZD", 0.61),
    ("JPY", 0.0068),
    ("CNY", 0.14),
    ("INR", 0.012),
    ("KRW", 0.00075),
    ("SGD", 0.74),
    ("MYR", 0.22),
    ("IDR", 0.000064),
    ("BRL", 0.20),
    ("COP", 0.00025),
    ("MXN", 0.058),
    ("ARS", 0.0012),
    ("CLP", 0.0011),
    ("PEN", 0.27),
    ("PLN", 0.25),
    ("CZK", 0.044),
    ("HUF", 0.0028),
    ("SEK", 0.095),
    ("NOK", 0.094),
    ("DKK", 0.145),
    ("RUB", 0.011),
    ("UAH", 0.027),
    ("TRY", 0.031),
    ("ZAR", 0.054),
    ("IRR", 0.000024),
];

/// CPI-U annual averages (1982-84 = 100).
const US_CPI: &[(i32, f64)] = &[
    (2000, 172.2),
    (2001, 177.1),
    (2002, 179.9),
    (2003, 184.0),
    (2004, 188.9),
    (2005, 195.3),
    (2006, 201.6),
    (2007, 207.342),
    (2008, 215.303),
    (2009, 214.537),
    (2010, 218.056),
    (2011, 224.939),
    (2012, 229.594),
    (2013, 232.957),
    (2014, 236.736),
    (2015, 237.017),
    (2016, 240.007),
    (2017, 245.120),
    (2018, 251.107),
    (2019, 255.657),
    (2020, 258.811),
    (2021, 270.970),
    (2022, 292.655),
    (2023, 304.702),
    (2024, 313.689),
];

/// Override file layout; both tables are merged over the built-in ones.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Overrides {
    rates: HashMap<String, f64>,
    cpi: BTreeMap<i32, f64>,
}

/// Converts APC charges to USD of a target year.
#[derive(Debug, Clone)]
pub struct CurrencyConverter {
    rates: HashMap<String, f64>,
    cpi: BTreeMap<i32, f64>,
    target_year: i32,
}

impl CurrencyConverter {
    /// Built-in tables, normalizing to `target_year`.
    #[must_use]
    pub fn new(target_year: i32) -> Self {
        Self {
            rates: RATES_TO_USD.iter().map(|&(code, rate)| (code.to_string(), rate)).collect(),
            cpi: US_CPI.iter().copied().collect(),
            target_year,
        }
    }

    /// Merge rates and CPI values from a JSON file of the form
    /// `{"rates": {"EUR": 1.1}, "cpi": {"2025": 320.1}}`.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn with_overrides_file(mut self, path: &Path) -> ServiceResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::internal(format!("cannot read currency table {}: {e}", path.display()))
        })?;
        let overrides: Overrides = serde_json::from_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            rates = overrides.rates.len(),
            cpi_years = overrides.cpi.len(),
            "Loaded currency overrides"
        );
        for (code, rate) in overrides.rates {
            self.rates.insert(code.to_ascii_uppercase(), rate);
        }
        self.cpi.extend(overrides.cpi);
        Ok(self)
    }

    /// Year every normalized amount is expressed in.
    #[must_use]
    pub fn target_year(&self) -> i32 {
        self.target_year
    }

    /// Amount in USD, `None` for an unknown currency.
    #[must_use]
    pub fn to_usd(&self, amount: f64, currency: &str) -> Option<f64> {
        let code = currency.trim().to_ascii_uppercase();
        self.rates.get(&code).map(|rate| amount * rate)
    }

    /// CPI for `year`, falling back to the nearest year in the table.
    #[must_use]
    pub fn cpi_for(&self, year: i32) -> Option<f64> {
        if let Some(value) = self.cpi.get(&year) {
            return Some(*value);
        }
        let below = self.cpi.range(..year).next_back();
        let above = self.cpi.range(year..).next();
        match (below, above) {
            (Some((by, bv)), Some((ay, av))) => {
                Some(if year - by <= ay - year { *bv } else { *av })
            }
            (Some((_, v)), None) | (None, Some((_, v))) => Some(*v),
            (None, None) => None,
        }
    }

    /// Express an amount of `from_year` dollars in `to_year` dollars.
    #[must_use]
    pub fn adjust_for_inflation(&self, amount: f64, from_year: i32, to_year: i32) -> f64 {
        match (self.cpi_for(from_year), self.cpi_for(to_year)) {
            (Some(from), Some(to)) if from > 0.0 => amount * to / from,
            _ => amount,
        }
    }

    /// USD of the target year. Without a year the amount is only converted.
    #[must_use]
    pub fn normalize(&self, amount: f64, currency: &str, year: Option<i32>) -> Option<f64> {
        let usd = self.to_usd(amount, currency);
        if usd.is_none() {
            tracing::warn!(currency, "Skipping charge in unknown currency");
        }
        let usd = usd?;
        Some(match year {
            Some(year) => self.adjust_for_inflation(usd, year, self.target_year),
            None => usd,
        })
    }
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        Self::new(LATEST_CPI_YEAR)
    }
}
