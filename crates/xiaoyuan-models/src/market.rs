//! Daily market series: prices, market capitalization, pledge and reduction ratios.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use xiaoyuan_core::config::months_before;
use xiaoyuan_core::frame::{ensure_not_empty, pivoted_records};
use xiaoyuan_core::query::TIMESTAMP;
use xiaoyuan_core::{
    AliasTable, DailyQuery, DataError, FactorReader, Fetcher, FieldAlias, PivotedRecord, Result,
    Symbol, XiaoYuanConfig, daily_record, parse_params, parse_symbols,
};

use crate::daily::{DailySource, DailySpec, Lookback};
use crate::params::DateWindow;

daily_record! {
    /// Total market capitalization.
    pub struct HistoricalMarketCap {
        /// Total market capitalization in yuan.
        market_cap => "总市值",
    }
}

daily_record! {
    /// Share pledge ratio.
    pub struct EquityPledge {
        /// Pledged shares over total shares.
        stock_pledge_ratio => "股票质押率",
    }
}

daily_record! {
    /// Insider reduction over the trailing year.
    pub struct ReductionPercentage {
        /// Shares sold by directors, supervisors and executives over the past year.
        reduction_percentage => "过去一年董监高合计减持比例",
    }
}

/// Market capitalization endpoint.
pub const HISTORICAL_MARKET_CAP: DailySpec = DailySpec {
    model: "HistoricalMarketCap",
    description: "Historical market capitalization.",
    source: DailySource::Script,
    lookback: Lookback::MarketCap,
};

/// Share pledge endpoint.
pub const EQUITY_PLEDGE: DailySpec = DailySpec {
    model: "EquityPledge",
    description: "Share pledge ratio.",
    source: DailySource::Factors,
    lookback: Lookback::FactorHistory,
};

/// Insider reduction endpoint.
pub const REDUCTION_PERCENTAGE: DailySpec = DailySpec {
    model: "ReductionPercentage",
    description: "Insider share reduction over the past year.",
    source: DailySource::Factors,
    lookback: Lookback::FactorHistory,
};

const PRICE_ALIASES: AliasTable = AliasTable::new(&[
    FieldAlias { field: "open", factor: "开盘价（不复权）" },
    FieldAlias { field: "high", factor: "最高价（不复权）" },
    FieldAlias { field: "low", factor: "最低价（不复权）" },
    FieldAlias { field: "close", factor: "收盘价（不复权）" },
    FieldAlias { field: "volume", factor: "成交量（不复权）" },
    FieldAlias { field: "adj_close", factor: "收盘价（前复权）" },
]);

const CLOSE: &str = "收盘价（不复权）";

/// One daily bar.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EquityHistorical {
    /// Ticker.
    pub symbol: Symbol,
    /// Trading day.
    pub date: NaiveDate,
    /// Unadjusted open.
    pub open: Option<f64>,
    /// Unadjusted high.
    pub high: Option<f64>,
    /// Unadjusted low.
    pub low: Option<f64>,
    /// Unadjusted close.
    pub close: Option<f64>,
    /// Unadjusted volume.
    pub volume: Option<f64>,
    /// Front-adjusted close.
    pub adj_close: Option<f64>,
    /// Close minus previous close.
    pub change: Option<f64>,
    /// Change over previous close, as a fraction.
    pub change_percent: Option<f64>,
}

impl EquityHistorical {
    /// Field to factor aliases of the price columns.
    pub const ALIASES: AliasTable = PRICE_ALIASES;

    fn from_pivoted(record: &PivotedRecord, previous_close: Option<f64>) -> Self {
        let close = record.value(CLOSE);
        let change = close.zip(previous_close).map(|(c, p)| c - p);
        let change_percent = change
            .zip(previous_close)
            .filter(|(_, p)| *p != 0.0)
            .map(|(c, p)| c / p);
        let value = |field: &str| {
            PRICE_ALIASES
                .factor_for(field)
                .and_then(|factor| record.value(factor))
        };
        Self {
            symbol: record.symbol.clone(),
            date: record.date,
            open: value("open"),
            high: value("high"),
            low: value("low"),
            close,
            volume: value("volume"),
            adj_close: value("adj_close"),
            change,
            change_percent,
        }
    }
}

/// Parameters of the price history endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct EquityHistoricalParams {
    /// One symbol or a comma-joined list.
    pub symbol: String,
    /// First day of the window.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Last day of the window.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Bar interval; only `1d` is available.
    #[serde(default)]
    pub interval: Option<String>,
}

/// Validated price history query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EquityHistoricalQuery {
    /// Normalized symbols.
    pub symbols: Vec<Symbol>,
    /// Requested window.
    pub window: DateWindow,
}

/// Daily price history with change from the previous close.
#[derive(Debug, Clone)]
pub struct EquityHistoricalFetcher {
    config: XiaoYuanConfig,
}

impl EquityHistoricalFetcher {
    /// Creates the fetcher.
    #[must_use]
    pub fn new(config: &XiaoYuanConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Fetcher for EquityHistoricalFetcher {
    type Query = EquityHistoricalQuery;
    type Raw = Vec<PivotedRecord>;
    type Data = EquityHistorical;

    fn model(&self) -> &'static str {
        "EquityHistorical"
    }

    fn description(&self) -> &'static str {
        "Daily price history."
    }

    fn transform_query(&self, params: &Value) -> Result<EquityHistoricalQuery> {
        let params: EquityHistoricalParams = parse_params(params)?;
        if let Some(interval) = params.interval.as_deref() {
            if interval != "1d" {
                return Err(DataError::InvalidParameter(format!(
                    "unsupported interval '{interval}', expected 1d"
                )));
            }
        }
        let months = self.config.windows.price_history_months;
        let window = DateWindow::looking_back(params.start_date, params.end_date, |end| {
            months_before(end, months)
        })?;
        Ok(EquityHistoricalQuery {
            symbols: parse_symbols(&params.symbol)?,
            window,
        })
    }

    async fn extract_data(
        &self,
        query: &EquityHistoricalQuery,
        reader: &dyn FactorReader,
    ) -> Result<Vec<PivotedRecord>> {
        // one extra day so the first bar has a previous close
        let first = match reader.adjacent_trade_day(query.window.start, -1).await {
            Ok(day) => day,
            Err(e) if e.is_empty_data() => {
                warn!(start = %query.window.start, "No trading day before start, first bar has no change");
                query.window.start
            }
            Err(e) => return Err(e),
        };
        debug!(start = %first, end = %query.window.end, "Running price history query");
        let factors = PRICE_ALIASES.factors();
        let script = DailyQuery::between(
            &self.config.tables.daily,
            factors.iter().copied(),
            &query.symbols,
            reader.convert_to_db_date_format(first),
            reader.convert_to_db_date_format(query.window.end),
        )
        .build();
        let frame = ensure_not_empty(
            reader.run_query(&script).await?,
            format!("EquityHistorical from {}", query.window.start),
        )?;
        pivoted_records(&frame, TIMESTAMP, &factors)
    }

    fn transform_data(
        &self,
        query: &EquityHistoricalQuery,
        mut raw: Vec<PivotedRecord>,
    ) -> Result<Vec<EquityHistorical>> {
        raw.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.date.cmp(&b.date)));
        let mut bars = Vec::with_capacity(raw.len());
        let mut previous: Option<(&Symbol, Option<f64>)> = None;
        for record in &raw {
            let previous_close = match previous {
                Some((symbol, close)) if *symbol == record.symbol => close,
                _ => None,
            };
            if record.date >= query.window.start {
                bars.push(EquityHistorical::from_pivoted(record, previous_close));
            }
            previous = Some((&record.symbol, record.value(CLOSE)));
        }
        if bars.is_empty() {
            return Err(DataError::EmptyData(format!(
                "EquityHistorical from {}",
                query.window.start
            )));
        }
        Ok(bars)
    }
}
