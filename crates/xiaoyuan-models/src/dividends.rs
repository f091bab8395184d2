//! Dividend calendar and per-symbol dividend history.

use async_trait::async_trait;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use xiaoyuan_core::config::months_before;
use xiaoyuan_core::frame::{date_column, ensure_not_empty, f64_column, string_column};
use xiaoyuan_core::{
    DataError, DividendQuery, FactorReader, Fetcher, Result, Symbol, TableRef, XiaoYuanConfig,
    parse_params, parse_symbols,
};

use crate::params::{CalendarParams, DateWindow, WindowParams};

/// One dividend distribution.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dividend {
    /// Ticker.
    pub symbol: Symbol,
    /// Ex-dividend date.
    pub ex_dividend_date: NaiveDate,
    /// Record date.
    pub record_date: Option<NaiveDate>,
    /// Payment date.
    pub payment_date: Option<NaiveDate>,
    /// Cash dividend per share before tax.
    pub amount: Option<f64>,
}

/// Reads dividend rows, newest ex-dividend date first.
fn dividends(frame: &DataFrame) -> Result<Vec<Dividend>> {
    let symbols = string_column(frame, "symbol")?;
    let record_dates = date_column(frame, "record_date")?;
    let dividend_dates = date_column(frame, "dividend_date")?;
    let amounts = f64_column(frame, "dividend_per_share_before_tax")?;

    let mut rows: Vec<Dividend> = symbols
        .into_iter()
        .zip(record_dates)
        .zip(dividend_dates)
        .zip(amounts)
        .filter_map(|(((symbol, record_date), dividend_date), amount)| {
            let date = dividend_date?;
            Some(Dividend {
                symbol: Symbol::new(symbol?),
                ex_dividend_date: date,
                record_date,
                payment_date: Some(date),
                amount,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        b.ex_dividend_date
            .cmp(&a.ex_dividend_date)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    Ok(rows)
}

async fn run_dividends(
    reader: &dyn FactorReader,
    table: &TableRef,
    window: &DateWindow,
    code: Option<&str>,
) -> Result<DataFrame> {
    let mut query = DividendQuery::new(
        table,
        reader.convert_to_db_date_format(window.start),
        reader.convert_to_db_date_format(window.end),
    );
    if let Some(code) = code {
        query = query.code(code);
    }
    debug!(start = %window.start, end = %window.end, code = ?code, "Running dividend query");
    let frame = reader.run_query(&query.build()).await?;
    ensure_not_empty(
        frame,
        format!("dividends between {} and {}", window.start, window.end),
    )
}

/// Dividends of all stocks in an upcoming window.
#[derive(Debug, Clone)]
pub struct CalendarDividendFetcher {
    config: XiaoYuanConfig,
}

impl CalendarDividendFetcher {
    /// Creates the fetcher.
    #[must_use]
    pub fn new(config: &XiaoYuanConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Fetcher for CalendarDividendFetcher {
    type Query = DateWindow;
    type Raw = DataFrame;
    type Data = Dividend;

    fn model(&self) -> &'static str {
        "CalendarDividend"
    }

    fn description(&self) -> &'static str {
        "Upcoming dividends of all stocks."
    }

    fn transform_query(&self, params: &Value) -> Result<DateWindow> {
        let params: CalendarParams = if params.is_null() {
            CalendarParams::default()
        } else {
            parse_params(params)?
        };
        DateWindow::looking_ahead(
            params.start_date,
            params.end_date,
            self.config.windows.dividend_calendar_days,
        )
    }

    async fn extract_data(&self, query: &DateWindow, reader: &dyn FactorReader) -> Result<DataFrame> {
        run_dividends(reader, &self.config.tables.dividends, query, None).await
    }

    fn transform_data(&self, _query: &DateWindow, raw: DataFrame) -> Result<Vec<Dividend>> {
        dividends(&raw)
    }
}

/// Validated dividend history query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DividendHistoryQuery {
    /// Requested symbol.
    pub symbol: Symbol,
    /// Dividend date window.
    pub window: DateWindow,
}

/// Dividend history of one symbol.
#[derive(Debug, Clone)]
pub struct HistoricalDividendsFetcher {
    config: XiaoYuanConfig,
}

impl HistoricalDividendsFetcher {
    /// Creates the fetcher.
    #[must_use]
    pub fn new(config: &XiaoYuanConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Fetcher for HistoricalDividendsFetcher {
    type Query = DividendHistoryQuery;
    type Raw = DataFrame;
    type Data = Dividend;

    fn model(&self) -> &'static str {
        "HistoricalDividends"
    }

    fn description(&self) -> &'static str {
        "Dividend history of one stock."
    }

    fn transform_query(&self, params: &Value) -> Result<DividendHistoryQuery> {
        let params: WindowParams = parse_params(params)?;
        let mut symbols = parse_symbols(&params.symbol)?;
        if symbols.len() > 1 {
            return Err(DataError::InvalidParameter(
                "HistoricalDividends accepts a single symbol".into(),
            ));
        }
        let months = self.config.windows.dividend_history_months;
        let window = DateWindow::looking_back(params.start_date, params.end_date, |end| {
            months_before(end, months)
        })?;
        Ok(DividendHistoryQuery {
            symbol: symbols.remove(0),
            window,
        })
    }

    async fn extract_data(
        &self,
        query: &DividendHistoryQuery,
        reader: &dyn FactorReader,
    ) -> Result<DataFrame> {
        run_dividends(
            reader,
            &self.config.tables.dividends,
            &query.window,
            Some(query.symbol.code()),
        )
        .await
    }

    fn transform_data(&self, query: &DividendHistoryQuery, raw: DataFrame) -> Result<Vec<Dividend>> {
        let rows = dividends(&raw)?;
        if rows.is_empty() {
            return Err(DataError::EmptyData(format!("dividends of {}", query.symbol)));
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use serde_json::json;
    use xiaoyuan_reader::InMemoryReader;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dividend_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("symbol".into(), vec!["SH600519", "SZ000001", "SH600519"]),
            Column::new("record_date".into(), vec!["2023-06-29", "2023-06-13", "2023-12-19"]),
            Column::new("dividend_date".into(), vec!["2023-06-30", "2023-06-14", "2023-12-20"]),
            Column::new("dividend_per_share_before_tax".into(), vec![25.911, 0.285, 19.106]),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_calendar_dividends_newest_first() {
        let reader = InMemoryReader::new().with_response("dividend_detail", dividend_frame());
        let fetcher = CalendarDividendFetcher::new(&XiaoYuanConfig::default());

        let rows = fetcher
            .fetch_data(&json!({"start_date": "2023-06-01"}), &reader)
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].ex_dividend_date, date(2023, 12, 20));
        assert_eq!(rows[0].payment_date, Some(date(2023, 12, 20)));
        assert_eq!(rows[0].record_date, Some(date(2023, 12, 19)));
        assert_eq!(rows[2].symbol.as_str(), "SZ000001");
        assert_eq!(rows[2].amount, Some(0.285));

        let queries = reader.queries().await;
        assert!(queries[0].contains("dividend_date between 2023.06.01 : 2023.07.01"));
        assert!(!queries[0].contains("entity_id like"));
    }

    #[tokio::test]
    async fn test_calendar_dividends_empty() {
        let reader = InMemoryReader::new();
        let fetcher = CalendarDividendFetcher::new(&XiaoYuanConfig::default());
        let err = fetcher.fetch_data(&Value::Null, &reader).await.unwrap_err();
        assert!(err.is_empty_data());
    }

    #[tokio::test]
    async fn test_historical_dividends_by_code() {
        let reader = InMemoryReader::new().with_response("%_600519", dividend_frame());
        let fetcher = HistoricalDividendsFetcher::new(&XiaoYuanConfig::default());

        let rows = fetcher
            .fetch_data(&json!({"symbol": "600519.SH", "end_date": "2024-01-31"}), &reader)
            .await
            .unwrap();
        assert_eq!(rows[0].ex_dividend_date, date(2023, 12, 20));

        let queries = reader.queries().await;
        assert!(queries[0].contains("dividend_date between 2023.01.31 : 2024.01.31"));
    }

    #[tokio::test]
    async fn test_historical_dividends_single_symbol() {
        let reader = InMemoryReader::new();
        let fetcher = HistoricalDividendsFetcher::new(&XiaoYuanConfig::default());
        let err = fetcher
            .fetch_data(&json!({"symbol": "SH600519,SZ000001"}), &reader)
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
