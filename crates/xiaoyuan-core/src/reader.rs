//! Analytics store reader contract.
//!
//! The store client is an injected dependency: construct one, wrap it in an `Arc`, and
//! pass `&dyn FactorReader` into each fetch. Implementations report store failures as
//! [`DataError::Query`](crate::DataError::Query).

use async_trait::async_trait;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::fmt::Debug;

use crate::error::Result;
use crate::query::db_date;
use crate::types::Symbol;

/// Request for long-format daily factor rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactorRequest {
    /// Source factor names.
    pub factors: Vec<String>,
    /// Symbols to include.
    pub symbols: Vec<Symbol>,
    /// First trading day, inclusive.
    pub start: NaiveDate,
    /// Last trading day, inclusive.
    pub end: NaiveDate,
}

impl FactorRequest {
    /// Creates a request.
    #[must_use]
    pub fn new<I, S>(factors: I, symbols: Vec<Symbol>, start: NaiveDate, end: NaiveDate) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            factors: factors.into_iter().map(Into::into).collect(),
            symbols,
            start,
            end,
        }
    }
}

/// Client for the columnar analytics store.
#[async_trait]
pub trait FactorReader: Send + Sync + Debug {
    /// Returns the name of this reader.
    fn name(&self) -> &str;

    /// Runs a query script and returns its tabular result.
    async fn run_query(&self, script: &str) -> Result<DataFrame>;

    /// Fetches long-format daily factor rows.
    ///
    /// The frame has columns `timestamp`, `symbol`, `factor_name` and `value`.
    async fn get_factors(&self, request: &FactorRequest) -> Result<DataFrame>;

    /// Lists currently listed stocks.
    async fn get_stocks(&self) -> Result<Vec<Symbol>>;

    /// Resolves a trading day relative to `date`.
    ///
    /// Offset `0` is the latest trading day on or before `date`. A positive offset `n`
    /// is the `n`-th trading day after `date`; a negative one counts backwards from
    /// before `date`.
    async fn adjacent_trade_day(&self, date: NaiveDate, offset: i32) -> Result<NaiveDate>;

    /// Formats a date as a store date literal.
    fn convert_to_db_date_format(&self, date: NaiveDate) -> String {
        db_date(date)
    }
}
