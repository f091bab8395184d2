//! Core data types.
//!
//! - [`Symbol`] - A-share ticker in the store's `SH600519` convention
//! - [`FactorRow`] - One long-format factor observation
//! - [`PivotedRecord`] - One wide row per symbol and period

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{DataError, Result};

/// Exchange prefixes used by the analytics store.
const EXCHANGES: [&str; 3] = ["SH", "SZ", "BJ"];

/// An A-share ticker.
///
/// Symbols are normalized on creation: uppercased, dashes replaced with dots, and
/// rewritten to the exchange-prefixed form the store keys on. `600519`, `600519.SH`,
/// `600519-sh` and `sh600519` all become `SH600519`. Anything that does not look like
/// an A-share code is kept as uppercased text.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol, normalizing it to the store's ticker convention.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        let raw = s.into().trim().to_uppercase().replace('-', ".");
        Self(canonical(raw))
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exchange prefix (`SH`, `SZ` or `BJ`), if the symbol carries one.
    #[must_use]
    pub fn exchange(&self) -> Option<&str> {
        split_prefixed(&self.0).map(|(exchange, _)| exchange)
    }

    /// The six-digit code without exchange prefix.
    #[must_use]
    pub fn code(&self) -> &str {
        split_prefixed(&self.0).map_or(&self.0, |(_, code)| code)
    }
}

fn is_code(s: &str) -> bool {
    s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit())
}

fn split_prefixed(s: &str) -> Option<(&str, &str)> {
    if s.len() != 8 || !s.is_char_boundary(2) {
        return None;
    }
    let (exchange, code) = s.split_at(2);
    (EXCHANGES.contains(&exchange) && is_code(code)).then_some((exchange, code))
}

fn infer_exchange(code: &str) -> Option<&'static str> {
    match code.as_bytes().first()? {
        b'6' | b'9' => Some("SH"),
        b'0' | b'2' | b'3' => Some("SZ"),
        b'4' | b'8' => Some("BJ"),
        _ => None,
    }
}

fn canonical(raw: String) -> String {
    if split_prefixed(&raw).is_some() {
        return raw;
    }
    if let Some((code, exchange)) = raw.split_once('.') {
        if is_code(code) && EXCHANGES.contains(&exchange) {
            return format!("{exchange}{code}");
        }
    }
    if is_code(&raw) {
        if let Some(exchange) = infer_exchange(&raw) {
            return format!("{exchange}{raw}");
        }
    }
    raw
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(DataError::InvalidParameter("symbol must not be empty".into()));
        }
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// Splits a comma-joined symbol list into normalized, de-duplicated symbols.
///
/// Order of first appearance is kept. An input with no symbols is rejected.
pub fn parse_symbols(input: &str) -> Result<Vec<Symbol>> {
    let mut symbols: Vec<Symbol> = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let symbol = Symbol::new(part);
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    if symbols.is_empty() {
        return Err(DataError::InvalidParameter("symbol must not be empty".into()));
    }
    Ok(symbols)
}

/// One long-format observation from the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactorRow {
    /// Disclosure date for finance factors, trading day for daily factors.
    pub timestamp: NaiveDate,
    /// Fiscal period end the value pertains to. Daily factors have none.
    pub report_period: Option<NaiveDate>,
    /// Ticker of the observation.
    pub symbol: Symbol,
    /// Source-taxonomy factor name.
    pub factor_name: String,
    /// Observed value; null when the store has none.
    pub value: Option<f64>,
}

impl FactorRow {
    /// The date the row pivots on: the report period when present, otherwise the timestamp.
    #[must_use]
    pub fn pivot_date(&self) -> NaiveDate {
        self.report_period.unwrap_or(self.timestamp)
    }
}

/// One wide row keyed by symbol and date, with one value per requested factor.
///
/// Factors that were requested but not observed are absent from `values`, and
/// [`value`](Self::value) reports them as `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PivotedRecord {
    /// Ticker of the row.
    pub symbol: Symbol,
    /// Report period for finance factors, trading day for daily factors.
    pub date: NaiveDate,
    /// Fiscal period label (`Q1`, `Q2`, `Q3` or `FY`).
    pub fiscal_period: Option<String>,
    /// Fiscal year of the report.
    pub fiscal_year: Option<i32>,
    /// Values keyed by source factor name.
    pub values: BTreeMap<String, Option<f64>>,
}

impl PivotedRecord {
    /// Creates an empty record for a symbol and date.
    #[must_use]
    pub const fn new(symbol: Symbol, date: NaiveDate) -> Self {
        Self {
            symbol,
            date,
            fiscal_period: None,
            fiscal_year: None,
            values: BTreeMap::new(),
        }
    }

    /// Value of a factor, `None` when missing or null.
    #[must_use]
    pub fn value(&self, factor: &str) -> Option<f64> {
        self.values.get(factor).copied().flatten()
    }

    /// Sets the value of a factor.
    pub fn set(&mut self, factor: impl Into<String>, value: Option<f64>) {
        self.values.insert(factor.into(), value);
    }

    /// Fills fiscal labels derived from the report date when the store did not supply them.
    pub fn annotate_fiscal(&mut self) {
        use chrono::Datelike;
        if self.fiscal_period.is_none() {
            self.fiscal_period = Some(fiscal_period_label(self.date).to_string());
        }
        if self.fiscal_year.is_none() {
            self.fiscal_year = Some(self.date.year());
        }
    }
}

/// Fiscal period label for a report date: `Q1`, `Q2`, `Q3`, or `FY` for year end.
#[must_use]
pub fn fiscal_period_label(date: NaiveDate) -> &'static str {
    use chrono::Datelike;
    match date.month() {
        1..=3 => "Q1",
        4..=6 => "Q2",
        7..=9 => "Q3",
        _ => "FY",
    }
}
