#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/xiaoyuan/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the XiaoYuan fundamentals provider.
//!
//! Every endpoint follows the same path: parameters are validated into a typed query,
//! a query script is built and handed to a [`FactorReader`], and the tabular result is
//! reshaped into typed records.
//!
//! - [`FactorReader`](reader::FactorReader) - Analytics store contract
//! - [`Fetcher`](fetcher::Fetcher) - Per-endpoint query/extract/transform triad
//! - [`PeriodFilter`](period::PeriodFilter) - Period token to query fragment
//! - [`FinanceQuery`](query::FinanceQuery), [`DailyQuery`](query::DailyQuery),
//!   [`DividendQuery`](query::DividendQuery) - Query builders
//! - [`AliasTable`](alias::AliasTable) - Factor name to field name mapping
//! - [`FactorRecord`](record::FactorRecord) - Typed output records

/// Factor-name to field-name alias tables.
pub mod alias;
/// Table references and default windows.
pub mod config;
/// Error types for data operations.
pub mod error;
/// The fetcher triad implemented by every endpoint.
pub mod fetcher;
/// Conversions between result frames and pivoted records.
pub mod frame;
/// Fiscal period tokens and the query fragments they map to.
pub mod period;
/// Query-language builders for the fact tables.
pub mod query;
/// Analytics store reader contract.
pub mod reader;
/// Typed output records and the macros that declare them.
pub mod record;
/// Value normalization and ordering of pivoted records.
pub mod reshape;
/// Core data types (Symbol, FactorRow, PivotedRecord).
pub mod types;

// Re-export commonly used items at crate root
pub use alias::{AliasTable, FieldAlias};
pub use config::{FactTable, TableConfig, TableRef, WindowConfig, XiaoYuanConfig};
pub use error::{DataError, Result};
pub use fetcher::{Fetcher, parse_params};
pub use period::{Period, PeriodFilter};
pub use query::{DailyQuery, DividendQuery, FinanceQuery};
pub use reader::{FactorReader, FactorRequest};
pub use record::FactorRecord;
pub use reshape::{Normalization, ValueScale, ZeroPolicy};
pub use types::{FactorRow, PivotedRecord, Symbol, parse_symbols};
