//! Table references and default windows.
//!
//! [`XiaoYuanConfig`] defaults to the production table layout, so most callers never
//! touch it. Deployments with a different layout can load one from JSON; any field
//! left out keeps its default.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};

/// A table inside a distributed database, e.g. `dfs://finance_factors_1Y` / `cn_finance_factors_1Q`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    /// Database path.
    pub database: String,
    /// Table name within the database.
    pub table: String,
}

impl TableRef {
    /// Creates a table reference.
    #[must_use]
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }

    /// The `loadTable` expression selecting this table.
    #[must_use]
    pub fn load_expr(&self) -> String {
        format!("loadTable(\"{}\", `{})", self.database, self.table)
    }
}

/// Which finance fact table a factor endpoint reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactTable {
    /// Quarterly report factors.
    #[default]
    Quarterly,
    /// Annual report factors.
    Annual,
}

/// Table layout of the analytics store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Quarterly finance factors, long format keyed by `报告期`.
    pub quarterly: TableRef,
    /// Annual finance factors, long format keyed by `报告期`.
    pub annual: TableRef,
    /// Daily market factors, long format keyed by `timestamp`.
    pub daily: TableRef,
    /// Dividend details.
    pub dividends: TableRef,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            quarterly: TableRef::new("dfs://finance_factors_1Y", "cn_finance_factors_1Q"),
            annual: TableRef::new("dfs://finance_factors_1Y", "cn_finance_factors_1Y"),
            daily: TableRef::new("dfs://factors_6M", "cn_factors_1D"),
            dividends: TableRef::new("dfs://cn_zvt", "dividend_detail"),
        }
    }
}

impl TableConfig {
    /// The finance table backing a fact table kind.
    #[must_use]
    pub const fn finance(&self, table: FactTable) -> &TableRef {
        match table {
            FactTable::Quarterly => &self.quarterly,
            FactTable::Annual => &self.annual,
        }
    }
}

/// Default date windows applied when callers omit a date range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Look-back for market capitalization history.
    pub market_cap_months: u32,
    /// Look-back for daily price history.
    pub price_history_months: u32,
    /// Look-back for daily factor series such as pledge ratios.
    pub factor_history_months: u32,
    /// Look-back for a single symbol's dividend history.
    pub dividend_history_months: u32,
    /// Look-ahead for the dividend calendar.
    pub dividend_calendar_days: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            market_cap_months: 60,
            price_history_months: 12,
            factor_history_months: 12,
            dividend_history_months: 12,
            dividend_calendar_days: 30,
        }
    }
}

/// Subtracts whole months from a date, clamping to the earliest representable date.
#[must_use]
pub fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

/// Provider configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XiaoYuanConfig {
    /// Table layout.
    pub tables: TableConfig,
    /// Default windows.
    pub windows: WindowConfig,
}

impl XiaoYuanConfig {
    /// Parses a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| DataError::Parse(format!("config: {e}")))
    }

    /// Replaces the table layout.
    #[must_use]
    pub fn with_tables(mut self, tables: TableConfig) -> Self {
        self.tables = tables;
        self
    }

    /// Replaces the default windows.
    #[must_use]
    pub fn with_windows(mut self, windows: WindowConfig) -> Self {
        self.windows = windows;
        self
    }
}
