//! In-memory reader implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::collections::BTreeSet;
use std::ops::Bound;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use xiaoyuan_core::frame::long_frame;
use xiaoyuan_core::{DataError, FactorReader, FactorRequest, FactorRow, Result, Symbol};

/// Scripted reader for testing and development.
///
/// Query scripts are answered by the first registered response whose pattern occurs
/// in the script; unmatched scripts get an empty frame. Daily factor requests are
/// served from preloaded long-format rows, and trading days come from a fixed
/// calendar. Every script received is recorded and can be inspected with
/// [`queries`](Self::queries).
#[derive(Debug, Default)]
pub struct InMemoryReader {
    responses: Vec<(String, DataFrame)>,
    factors: Vec<FactorRow>,
    stocks: Vec<Symbol>,
    calendar: BTreeSet<NaiveDate>,
    queries: RwLock<Vec<String>>,
}

impl InMemoryReader {
    /// Create a new reader with no data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers scripts containing `pattern` with `frame`.
    #[must_use]
    pub fn with_response(mut self, pattern: impl Into<String>, frame: DataFrame) -> Self {
        self.responses.push((pattern.into(), frame));
        self
    }

    /// Adds long-format rows served by `get_factors`.
    #[must_use]
    pub fn with_factor_rows(mut self, rows: impl IntoIterator<Item = FactorRow>) -> Self {
        self.factors.extend(rows);
        self
    }

    /// Sets the listed stocks.
    #[must_use]
    pub fn with_stocks(mut self, stocks: impl IntoIterator<Item = Symbol>) -> Self {
        self.stocks = stocks.into_iter().collect();
        self
    }

    /// Adds trading days to the calendar.
    #[must_use]
    pub fn with_trading_days(mut self, days: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.calendar.extend(days);
        self
    }

    /// Scripts received so far, oldest first.
    pub async fn queries(&self) -> Vec<String> {
        self.queries.read().await.clone()
    }
}

#[async_trait]
impl FactorReader for InMemoryReader {
    fn name(&self) -> &str {
        "memory"
    }

    #[instrument(skip(self, script), fields(len = script.len()))]
    async fn run_query(&self, script: &str) -> Result<DataFrame> {
        self.queries.write().await.push(script.to_string());
        match self.responses.iter().find(|(pattern, _)| script.contains(pattern)) {
            Some((pattern, frame)) => {
                debug!(pattern = %pattern, rows = frame.height(), "Matched scripted response");
                Ok(frame.clone())
            }
            None => {
                debug!("No scripted response, returning empty frame");
                Ok(DataFrame::empty())
            }
        }
    }

    #[instrument(skip(self, request), fields(factors = request.factors.len(), symbols = request.symbols.len()))]
    async fn get_factors(&self, request: &FactorRequest) -> Result<DataFrame> {
        let rows: Vec<FactorRow> = self
            .factors
            .iter()
            .filter(|row| {
                request.factors.contains(&row.factor_name)
                    && request.symbols.contains(&row.symbol)
                    && row.timestamp >= request.start
                    && row.timestamp <= request.end
            })
            .cloned()
            .collect();
        debug!(rows = rows.len(), "Serving factor rows");
        long_frame(&rows)
    }

    async fn get_stocks(&self) -> Result<Vec<Symbol>> {
        Ok(self.stocks.clone())
    }

    async fn adjacent_trade_day(&self, date: NaiveDate, offset: i32) -> Result<NaiveDate> {
        let steps = offset.unsigned_abs() as usize;
        let day = match offset {
            0 => self.calendar.range(..=date).next_back(),
            n if n > 0 => self
                .calendar
                .range((Bound::Excluded(date), Bound::Unbounded))
                .nth(steps - 1),
            _ => self.calendar.range(..date).rev().nth(steps - 1),
        };
        day.copied().ok_or_else(|| {
            DataError::EmptyData(format!("no trading day at offset {offset} from {date}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn week() -> InMemoryReader {
        // 2024-01-06/07 is a weekend
        InMemoryReader::new().with_trading_days([
            date(2024, 1, 2),
            date(2024, 1, 3),
            date(2024, 1, 4),
            date(2024, 1, 5),
            date(2024, 1, 8),
        ])
    }

    #[tokio::test]
    async fn test_memory_reader_scripted_response() {
        let df = DataFrame::new(vec![Column::new("symbol".into(), vec!["SH600519"])]).unwrap();
        let reader = InMemoryReader::new().with_response("cn_finance_factors_1Q", df);

        let hit = reader
            .run_query("select * from loadTable(\"dfs://finance_factors_1Y\", `cn_finance_factors_1Q)")
            .await
            .unwrap();
        assert_eq!(hit.height(), 1);

        let miss = reader.run_query("select * from dividends").await.unwrap();
        assert_eq!(miss.height(), 0);

        let queries = reader.queries().await;
        assert_eq!(queries.len(), 2);
        assert!(queries[1].contains("dividends"));
    }

    #[tokio::test]
    async fn test_memory_reader_trade_days() {
        let reader = week();
        // weekend resolves back to Friday
        assert_eq!(reader.adjacent_trade_day(date(2024, 1, 6), 0).await.unwrap(), date(2024, 1, 5));
        assert_eq!(reader.adjacent_trade_day(date(2024, 1, 4), 0).await.unwrap(), date(2024, 1, 4));
        assert_eq!(reader.adjacent_trade_day(date(2024, 1, 6), 1).await.unwrap(), date(2024, 1, 8));
        assert_eq!(reader.adjacent_trade_day(date(2024, 1, 4), -1).await.unwrap(), date(2024, 1, 3));
        assert_eq!(reader.adjacent_trade_day(date(2024, 1, 4), -2).await.unwrap(), date(2024, 1, 2));

        let err = reader.adjacent_trade_day(date(2024, 1, 2), -1).await.unwrap_err();
        assert!(err.is_empty_data());
    }

    #[tokio::test]
    async fn test_memory_reader_get_factors_filters() {
        let row = |d: NaiveDate, symbol: &str, factor: &str, value: f64| FactorRow {
            timestamp: d,
            report_period: None,
            symbol: Symbol::new(symbol),
            factor_name: factor.to_string(),
            value: Some(value),
        };
        let reader = InMemoryReader::new().with_factor_rows([
            row(date(2024, 1, 2), "SH600519", "股票质押率", 0.1),
            row(date(2024, 1, 3), "SH600519", "股票质押率", 0.2),
            row(date(2024, 1, 3), "SZ000001", "股票质押率", 0.3),
            row(date(2024, 1, 3), "SH600519", "总市值", 2.0e12),
            row(date(2024, 2, 1), "SH600519", "股票质押率", 0.4),
        ]);

        let request = FactorRequest::new(
            ["股票质押率"],
            vec![Symbol::new("SH600519")],
            date(2024, 1, 1),
            date(2024, 1, 31),
        );
        let frame = reader.get_factors(&request).await.unwrap();
        assert_eq!(frame.height(), 2);
    }

    #[tokio::test]
    async fn test_memory_reader_stocks() {
        let reader = InMemoryReader::new().with_stocks([Symbol::new("SH600519")]);
        assert_eq!(reader.get_stocks().await.unwrap(), vec![Symbol::new("SH600519")]);
    }
}
