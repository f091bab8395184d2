//! No-op reader implementation.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use polars::prelude::DataFrame;
use tracing::trace;
use xiaoyuan_core::{DataError, FactorReader, FactorRequest, Result, Symbol};

/// A reader that never returns data.
///
/// Queries yield empty frames and the stock list is empty. Every calendar day counts
/// as a trading day. Useful for exercising empty-result paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReader;

impl NoopReader {
    /// Create a new no-op reader.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FactorReader for NoopReader {
    fn name(&self) -> &str {
        "noop"
    }

    async fn run_query(&self, _script: &str) -> Result<DataFrame> {
        trace!("NoopReader: run_query called, returning empty frame");
        Ok(DataFrame::empty())
    }

    async fn get_factors(&self, _request: &FactorRequest) -> Result<DataFrame> {
        trace!("NoopReader: get_factors called, returning empty frame");
        Ok(DataFrame::empty())
    }

    async fn get_stocks(&self) -> Result<Vec<Symbol>> {
        trace!("NoopReader: get_stocks called, returning no stocks");
        Ok(Vec::new())
    }

    async fn adjacent_trade_day(&self, date: NaiveDate, offset: i32) -> Result<NaiveDate> {
        let days = Days::new(u64::from(offset.unsigned_abs()));
        let day = if offset >= 0 {
            date.checked_add_days(days)
        } else {
            date.checked_sub_days(days)
        };
        day.ok_or_else(|| DataError::InvalidParameter(format!("offset {offset} from {date}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_reader_returns_nothing() {
        let reader = NoopReader::new();
        assert_eq!(reader.run_query("t").await.unwrap().height(), 0);
        assert!(reader.get_stocks().await.unwrap().is_empty());

        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let request = FactorRequest::new(["总市值"], vec![Symbol::new("SH600519")], date, date);
        assert_eq!(reader.get_factors(&request).await.unwrap().height(), 0);
    }

    #[tokio::test]
    async fn test_noop_reader_calendar_days() {
        let reader = NoopReader::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            reader.adjacent_trade_day(date, -1).await.unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
        assert_eq!(reader.adjacent_trade_day(date, 0).await.unwrap(), date);
    }

    #[test]
    fn test_noop_reader_is_copy() {
        let reader1 = NoopReader::new();
        let reader2 = reader1;
        let _reader3 = reader2;
    }
}
