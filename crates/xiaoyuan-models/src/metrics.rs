//! Endpoints joining report-period factors with daily market factors.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};
use xiaoyuan_core::frame::{ensure_not_empty, pivoted_records};
use xiaoyuan_core::period::STATEMENT_PERIODS;
use xiaoyuan_core::query::{REPORT_PERIOD, TIMESTAMP};
use xiaoyuan_core::reshape::{limit_per_symbol, sort_by_period_desc};
use xiaoyuan_core::{
    DailyQuery, DataError, FactTable, FactorReader, FactorRecord, FinanceQuery, Fetcher,
    Normalization, Period, PeriodFilter, PivotedRecord, Result, Symbol, XiaoYuanConfig,
    parse_params, parse_symbols, report_record,
};

use crate::endpoint::{EndpointSpec, FundamentalQuery};
use crate::params::today;

report_record! {
    /// Headline fundamentals with market valuation on the report date.
    pub struct KeyMetrics {
        /// EPS, trailing twelve months.
        eps_ttm => "每股收益EPSTTM（元）",
        /// Working capital.
        working_capital => "营运资本",
        /// Gross profit.
        gross_margin => "毛利",
        /// EBIT.
        ebit => "息税前利润",
        /// Free cash flow to the firm.
        free_cash_flow_to_firm => "企业自由现金流量",
        /// Earnings per share.
        eps => "每股收益",
        /// Inventory turnover.
        inventory_turnover => "存货周转率",
        /// Days of inventory on hand.
        days_of_inventory_on_hand => "存货周转天数",
        /// Receivables turnover.
        receivables_turnover => "应收账款周转率（含应收票据）",
        /// Days sales outstanding.
        days_sales_outstanding => "应收账款周转天数（含应收票据）",
        /// Payables turnover.
        payables_turnover => "应付账款周转率",
        /// Days payables outstanding.
        days_payables_outstanding => "应付账款周转天数（含应付票据）",
        /// Diluted return on equity, percent.
        return_on_equity => "净资产收益率ROE（摊薄）（百分比）",
        /// Return on assets, percent.
        return_on_assets => "总资产净利率ROA（百分比）",
        /// Return on invested capital, percent.
        return_on_invested_capital => "投入资本回报率ROIC（百分比）",
        /// Current ratio.
        current_ratio => "流动比率",
        /// Quick ratio.
        quick_ratio => "速动比率",
        /// EBITDA.
        ebitda => "息税折旧摊销前利润",
        /// Total market capitalization.
        market_cap => "总市值",
        /// Static price to earnings.
        pe_ratio => "市盈率（静态）",
        /// Static price to book.
        price_to_book => "市净率（静态）",
        /// Dividend yield.
        dividend_yield => "股息率",
    }
}

/// Daily market factors joined onto key metrics.
pub const MARKET_FACTORS: [&str; 4] = ["总市值", "市盈率（静态）", "市净率（静态）", "股息率"];

const MARKET_CAP: &str = "总市值";

/// Key metrics endpoint.
pub const KEY_METRICS: EndpointSpec = EndpointSpec {
    model: "KeyMetrics",
    description: "Key fundamentals with market valuation.",
    periods: STATEMENT_PERIODS,
    default_period: Period::Annual,
    table: FactTable::Quarterly,
    multi_symbol: true,
    fiscal_annotation: false,
    normalization: Normalization::NONE,
};

fn finance_factors() -> Vec<&'static str> {
    KeyMetrics::ALIASES
        .factors()
        .into_iter()
        .filter(|f| !MARKET_FACTORS.contains(f))
        .collect()
}

/// How a report date is matched to a trading day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Alignment {
    /// Latest trading day on or before the date.
    Backward,
    /// The date itself when it is a trading day, otherwise the next one.
    Forward,
}

async fn align_day(reader: &dyn FactorReader, date: NaiveDate, alignment: Alignment) -> Result<NaiveDate> {
    let day = reader.adjacent_trade_day(date, 0).await?;
    match alignment {
        Alignment::Forward if day != date => reader.adjacent_trade_day(date, 1).await,
        _ => Ok(day),
    }
}

/// Resolves trading days for report dates, skipping dates the calendar cannot resolve.
async fn trade_days(
    reader: &dyn FactorReader,
    dates: BTreeSet<NaiveDate>,
    alignment: Alignment,
) -> Result<BTreeMap<NaiveDate, NaiveDate>> {
    let mut aligned = BTreeMap::new();
    for date in dates {
        match align_day(reader, date, alignment).await {
            Ok(day) => {
                aligned.insert(date, day);
            }
            Err(e) if e.is_empty_data() => warn!(%date, "No trading day for report date"),
            Err(e) => return Err(e),
        }
    }
    Ok(aligned)
}

/// Fetches the market factors on `days` keyed by symbol and trading day.
async fn market_values(
    reader: &dyn FactorReader,
    config: &XiaoYuanConfig,
    factors: &[&str],
    symbols: &[Symbol],
    days: &BTreeMap<NaiveDate, NaiveDate>,
) -> Result<BTreeMap<(Symbol, NaiveDate), PivotedRecord>> {
    let unique: BTreeSet<NaiveDate> = days.values().copied().collect();
    if unique.is_empty() {
        return Ok(BTreeMap::new());
    }
    let literals = unique
        .iter()
        .map(|d| reader.convert_to_db_date_format(*d))
        .collect();
    let script =
        DailyQuery::on_dates(&config.tables.daily, factors.iter().copied(), symbols, literals).build();
    let frame = reader.run_query(&script).await?;
    debug!(rows = frame.height(), days = unique.len(), "Market factors received");
    if frame.height() == 0 {
        return Ok(BTreeMap::new());
    }
    Ok(pivoted_records(&frame, TIMESTAMP, factors)?
        .into_iter()
        .map(|r| ((r.symbol.clone(), r.date), r))
        .collect())
}

/// Key metrics: finance factors per report period plus market valuation.
#[derive(Debug, Clone)]
pub struct KeyMetricsFetcher {
    config: XiaoYuanConfig,
}

impl KeyMetricsFetcher {
    /// Creates the fetcher.
    #[must_use]
    pub fn new(config: &XiaoYuanConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Fetcher for KeyMetricsFetcher {
    type Query = FundamentalQuery;
    type Raw = Vec<PivotedRecord>;
    type Data = KeyMetrics;

    fn model(&self) -> &'static str {
        KEY_METRICS.model
    }

    fn description(&self) -> &'static str {
        KEY_METRICS.description
    }

    fn transform_query(&self, params: &Value) -> Result<FundamentalQuery> {
        KEY_METRICS.validate(params)
    }

    async fn extract_data(
        &self,
        query: &FundamentalQuery,
        reader: &dyn FactorReader,
    ) -> Result<Vec<PivotedRecord>> {
        let factors = finance_factors();
        let script = FinanceQuery::new(
            self.config.tables.finance(KEY_METRICS.table),
            factors.iter().copied(),
            &query.symbols,
        )
        .period(query.filter)
        .build();
        debug!(period = %query.period, symbols = query.symbols.len(), "Running key metrics query");
        let frame = ensure_not_empty(
            reader.run_query(&script).await?,
            query.subject(KEY_METRICS.model),
        )?;
        let mut records = pivoted_records(&frame, REPORT_PERIOD, &factors)?;
        sort_by_period_desc(&mut records);
        let mut records = limit_per_symbol(records, query.filter.limit());

        let dates = records.iter().map(|r| r.date).collect();
        let days = trade_days(reader, dates, Alignment::Backward).await?;
        let market = market_values(reader, &self.config, &MARKET_FACTORS, &query.symbols, &days).await?;
        for record in &mut records {
            let daily = days
                .get(&record.date)
                .and_then(|day| market.get(&(record.symbol.clone(), *day)));
            for factor in MARKET_FACTORS {
                record.set(factor, daily.and_then(|d| d.value(factor)));
            }
        }
        Ok(records)
    }

    fn transform_data(&self, query: &FundamentalQuery, raw: Vec<PivotedRecord>) -> Result<Vec<KeyMetrics>> {
        let position = |symbol: &Symbol| {
            query
                .symbols
                .iter()
                .position(|s| s == symbol)
                .unwrap_or(query.symbols.len())
        };
        let mut kept: Vec<PivotedRecord> = raw
            .into_iter()
            .filter(|record| {
                let has_cap = record.value(MARKET_CAP).is_some();
                if !has_cap {
                    warn!(symbol = %record.symbol, period = %record.date, "No market cap, dropping record");
                }
                has_cap
            })
            .collect();
        kept.sort_by(|a, b| position(&a.symbol).cmp(&position(&b.symbol)).then(b.date.cmp(&a.date)));
        if kept.is_empty() {
            return Err(DataError::EmptyData(query.subject(KEY_METRICS.model)));
        }
        Ok(kept.into_iter().map(KeyMetrics::from_pivoted).collect())
    }
}

/// Trailing valuation multiples.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EquityValuationMultiples {
    /// Ticker.
    pub symbol: Symbol,
    /// Report period the ROIC is taken from.
    pub period_ending: NaiveDate,
    /// Trading day the multiples are taken on.
    pub date: Option<NaiveDate>,
    /// ROIC, trailing twelve months, percent.
    pub roic_ttm: Option<f64>,
    /// Price to earnings, trailing twelve months.
    pub pe_ratio_ttm: Option<f64>,
    /// Price to sales, trailing twelve months.
    pub price_to_sales_ratio_ttm: Option<f64>,
}

const ROIC_TTM: &str = "投入资本回报率ROIC（TTM）（百分比）";
const PE_TTM: &str = "市盈率（滚动）";
const PS_TTM: &str = "市销率（滚动）";

/// Parameters of the valuation multiples endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct ValuationParams {
    /// One symbol or a comma-joined list.
    pub symbol: String,
    /// As-of date, today when absent.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Validated valuation multiples query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValuationQuery {
    /// Requested symbols, before filtering to listed stocks.
    pub symbols: Vec<Symbol>,
    /// Latest report date considered.
    pub as_of: NaiveDate,
}

/// Raw valuation rows: the report records and the multiples keyed by symbol and day.
#[derive(Debug)]
pub struct ValuationRaw {
    reports: Vec<PivotedRecord>,
    days: BTreeMap<NaiveDate, NaiveDate>,
    market: BTreeMap<(Symbol, NaiveDate), PivotedRecord>,
}

/// Valuation multiples on the trading day after the latest report.
#[derive(Debug, Clone)]
pub struct EquityValuationMultiplesFetcher {
    config: XiaoYuanConfig,
}

impl EquityValuationMultiplesFetcher {
    /// Creates the fetcher.
    #[must_use]
    pub fn new(config: &XiaoYuanConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Fetcher for EquityValuationMultiplesFetcher {
    type Query = ValuationQuery;
    type Raw = ValuationRaw;
    type Data = EquityValuationMultiples;

    fn model(&self) -> &'static str {
        "EquityValuationMultiples"
    }

    fn description(&self) -> &'static str {
        "Trailing valuation multiples."
    }

    fn transform_query(&self, params: &Value) -> Result<ValuationQuery> {
        let params: ValuationParams = parse_params(params)?;
        Ok(ValuationQuery {
            symbols: parse_symbols(&params.symbol)?,
            as_of: params.date.unwrap_or_else(today),
        })
    }

    async fn extract_data(
        &self,
        query: &ValuationQuery,
        reader: &dyn FactorReader,
    ) -> Result<ValuationRaw> {
        let listed: BTreeSet<Symbol> = reader.get_stocks().await?.into_iter().collect();
        let symbols: Vec<Symbol> = query
            .symbols
            .iter()
            .filter(|s| listed.contains(*s))
            .cloned()
            .collect();
        if symbols.is_empty() {
            return Err(DataError::EmptyData(
                "EquityValuationMultiples: no listed symbols requested".into(),
            ));
        }
        debug!(requested = query.symbols.len(), listed = symbols.len(), "Filtered to listed stocks");

        let script = FinanceQuery::new(&self.config.tables.quarterly, [ROIC_TTM], &symbols)
            .as_of(reader.convert_to_db_date_format(query.as_of))
            .period(PeriodFilter::latest(1))
            .build();
        let frame = ensure_not_empty(
            reader.run_query(&script).await?,
            format!("EquityValuationMultiples as of {}", query.as_of),
        )?;
        let reports = pivoted_records(&frame, REPORT_PERIOD, &[ROIC_TTM])?;

        let dates = reports.iter().map(|r| r.date).collect();
        let days = trade_days(reader, dates, Alignment::Forward).await?;
        let market = market_values(reader, &self.config, &[PE_TTM, PS_TTM], &symbols, &days).await?;
        Ok(ValuationRaw {
            reports,
            days,
            market,
        })
    }

    fn transform_data(
        &self,
        query: &ValuationQuery,
        raw: ValuationRaw,
    ) -> Result<Vec<EquityValuationMultiples>> {
        let mut reports = raw.reports;
        sort_by_period_desc(&mut reports);
        let reports = limit_per_symbol(reports, 1);
        let mut out: Vec<EquityValuationMultiples> = reports
            .into_iter()
            .map(|report| {
                let day = raw.days.get(&report.date).copied();
                let daily = day.and_then(|d| raw.market.get(&(report.symbol.clone(), d)));
                EquityValuationMultiples {
                    roic_ttm: report.value(ROIC_TTM),
                    pe_ratio_ttm: daily.and_then(|d| d.value(PE_TTM)),
                    price_to_sales_ratio_ttm: daily.and_then(|d| d.value(PS_TTM)),
                    date: day,
                    period_ending: report.date,
                    symbol: report.symbol,
                }
            })
            .collect();
        out.sort_by_key(|m| {
            query
                .symbols
                .iter()
                .position(|s| *s == m.symbol)
                .unwrap_or(query.symbols.len())
        });
        Ok(out)
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

    fn key_metrics_reader() -> InMemoryReader {
        let finance = DataFrame::new(vec![
            Column::new("报告期".into(), vec!["2023-12-31", "2022-12-31", "2023-12-31"]),
            Column::new("symbol".into(), vec!["SH600519", "SH600519", "SZ000001"]),
            Column::new("每股收益".into(), vec![59.49, 49.93, 2.25]),
            Column::new("流动比率".into(), vec![4.0, 4.2, 0.0]),
        ])
        .unwrap();
        // SZ000001 has no market row and is dropped
        let daily = DataFrame::new(vec![
            Column::new("timestamp".into(), vec!["2023-12-29", "2022-12-30"]),
            Column::new("symbol".into(), vec!["SH600519", "SH600519"]),
            Column::new("总市值".into(), vec![2.2e12, 2.3e12]),
            Column::new("市盈率（静态）".into(), vec![29.4, 37.2]),
        ])
        .unwrap();
        InMemoryReader::new()
            .with_trading_days([date(2022, 12, 30), date(2023, 12, 29), date(2024, 1, 2)])
            .with_response("cn_finance_factors_1Q", finance)
            .with_response("cn_factors_1D", daily)
    }

    #[tokio::test]
    async fn test_key_metrics_merges_market_factors() {
        let reader = key_metrics_reader();
        let fetcher = KeyMetricsFetcher::new(&XiaoYuanConfig::default());

        let records = fetcher
            .fetch_data(&json!({"symbol": "SZ000001,SH600519", "limit": 2}), &reader)
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.symbol.as_str() == "SH600519"));
        assert_eq!(records[0].period_ending, date(2023, 12, 31));
        assert_eq!(records[0].eps, Some(59.49));
        assert_eq!(records[0].market_cap, Some(2.2e12));
        assert_eq!(records[0].pe_ratio, Some(29.4));
        assert_eq!(records[0].dividend_yield, None);
        assert_eq!(records[1].market_cap, Some(2.3e12));

        let queries = reader.queries().await;
        assert_eq!(queries.len(), 2);
        assert!(!queries[0].contains("总市值"));
        assert!(queries[1].contains("timestamp in [2022.12.30, 2023.12.29]"));
    }

    #[tokio::test]
    async fn test_key_metrics_all_dropped_is_empty() {
        let finance = DataFrame::new(vec![
            Column::new("报告期".into(), vec!["2023-12-31"]),
            Column::new("symbol".into(), vec!["SZ000001"]),
            Column::new("每股收益".into(), vec![2.25]),
        ])
        .unwrap();
        let reader = InMemoryReader::new()
            .with_trading_days([date(2023, 12, 29)])
            .with_response("cn_finance_factors_1Q", finance);
        let fetcher = KeyMetricsFetcher::new(&XiaoYuanConfig::default());
        let err = fetcher
            .fetch_data(&json!({"symbol": "SZ000001"}), &reader)
            .await
            .unwrap_err();
        assert!(err.is_empty_data());
    }

    fn valuation_reader() -> InMemoryReader {
        let finance = DataFrame::new(vec![
            Column::new("报告期".into(), vec!["2024-03-31"]),
            Column::new("symbol".into(), vec!["SH600519"]),
            Column::new(ROIC_TTM.into(), vec![33.1]),
        ])
        .unwrap();
        let daily = DataFrame::new(vec![
            Column::new("timestamp".into(), vec!["2024-04-01"]),
            Column::new("symbol".into(), vec!["SH600519"]),
            Column::new(PE_TTM.into(), vec![28.0]),
            Column::new(PS_TTM.into(), vec![14.2]),
        ])
        .unwrap();
        InMemoryReader::new()
            .with_stocks([Symbol::new("SH600519")])
            .with_trading_days([date(2024, 3, 29), date(2024, 4, 1)])
            .with_response("cn_finance_factors_1Q", finance)
            .with_response("cn_factors_1D", daily)
    }

    #[tokio::test]
    async fn test_valuation_aligns_to_next_trading_day() {
        let reader = valuation_reader();
        let fetcher = EquityValuationMultiplesFetcher::new(&XiaoYuanConfig::default());

        let out = fetcher
            .fetch_data(&json!({"symbol": "SH600519,SH601318", "date": "2024-06-30"}), &reader)
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].symbol.as_str(), "SH600519");
        assert_eq!(out[0].period_ending, date(2024, 3, 31));
        // 2024-03-31 is a Sunday
        assert_eq!(out[0].date, Some(date(2024, 4, 1)));
        assert_eq!(out[0].roic_ttm, Some(33.1));
        assert_eq!(out[0].pe_ratio_ttm, Some(28.0));
        assert_eq!(out[0].price_to_sales_ratio_ttm, Some(14.2));

        let queries = reader.queries().await;
        assert!(queries[0].contains("报告期 <= 2024.06.30"));
        assert!(queries[0].contains("limit 1"));
        assert!(!queries[0].contains("SH601318"));
    }

    #[tokio::test]
    async fn test_valuation_unlisted_symbols_are_empty() {
        let reader = valuation_reader();
        let fetcher = EquityValuationMultiplesFetcher::new(&XiaoYuanConfig::default());
        let err = fetcher
            .fetch_data(&json!({"symbol": "SH601318"}), &reader)
            .await
            .unwrap_err();
        assert!(err.is_empty_data());
        assert!(reader.queries().await.is_empty());
    }

    #[test]
    fn test_finance_factors_exclude_market() {
        let factors = finance_factors();
        assert_eq!(factors.len(), 18);
        assert!(MARKET_FACTORS.iter().all(|f| !factors.contains(f)));
    }
}
