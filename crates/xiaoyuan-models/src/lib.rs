#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/xiaoyuan/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! A-share fundamentals endpoints.
//!
//! Factor endpoints are declared as data: an [`EndpointSpec`] naming the accepted periods,
//! table and normalization, plus a typed record. [`FactorFetcher`] runs any of them.
//! Daily series go through [`DailyFactorFetcher`] the same way. Price history, key
//! metrics, valuation multiples and dividends have their own fetchers.

/// Field to factor alias tables by model name.
pub mod catalog;
/// The template behind daily factor endpoints.
pub mod daily;
/// Dividend calendar and history.
pub mod dividends;
/// The template behind report-period factor endpoints.
pub mod endpoint;
/// Statement growth endpoints.
pub mod growth;
/// Trailing, per-share and derived indicators.
pub mod indicators;
/// Daily market series and price history.
pub mod market;
/// Key metrics and valuation multiples.
pub mod metrics;
/// Caller parameters shared by the endpoints.
pub mod params;
/// Financial ratios and ability breakdowns.
pub mod ratios;
/// Balance sheet, income statement and cash flow statement.
pub mod statements;

pub use catalog::{ALIAS_TABLES, alias_table};
pub use daily::{DailyFactorFetcher, DailySource, DailySpec, Lookback};
pub use dividends::{CalendarDividendFetcher, Dividend, HistoricalDividendsFetcher};
pub use endpoint::{EndpointSpec, FactorFetcher, FundamentalQuery};
pub use market::{EquityHistorical, EquityHistoricalFetcher};
pub use metrics::{EquityValuationMultiples, EquityValuationMultiplesFetcher, KeyMetrics, KeyMetricsFetcher};
pub use params::{DateWindow, today};
