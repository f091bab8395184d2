//! The parameterized template behind every report-period factor endpoint.
//!
//! An endpoint is an [`EndpointSpec`] plus a record type declared with
//! [`report_record!`](xiaoyuan_core::report_record). The record supplies the factor
//! list and alias table; the endpoint declaration supplies the rest.

use async_trait::async_trait;
use polars::prelude::DataFrame;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;
use xiaoyuan_core::frame::{ensure_not_empty, pivoted_records, records_frame};
use xiaoyuan_core::query::REPORT_PERIOD;
use xiaoyuan_core::reshape::{limit_per_symbol, sort_by_period_desc};
use xiaoyuan_core::{
    DataError, FactTable, FactorReader, FactorRecord, Fetcher, FinanceQuery, Normalization,
    Period, PeriodFilter, PivotedRecord, Result, Symbol, TableConfig, XiaoYuanConfig,
    parse_params, parse_symbols,
};

use crate::params::FundamentalParams;

/// Declarative description of a factor endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndpointSpec {
    /// Model name the endpoint is registered under.
    pub model: &'static str,
    /// Short description.
    pub description: &'static str,
    /// Accepted period tokens.
    pub periods: &'static [Period],
    /// Period used when the caller gives none.
    pub default_period: Period,
    /// Fact table read.
    pub table: FactTable,
    /// Whether a comma-joined symbol list is accepted.
    pub multi_symbol: bool,
    /// Whether records carry fiscal period and year labels from the store.
    pub fiscal_annotation: bool,
    /// Value normalization.
    pub normalization: Normalization,
}

/// Validated parameters of a factor endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FundamentalQuery {
    /// Normalized symbols.
    pub symbols: Vec<Symbol>,
    /// Selected period.
    pub period: Period,
    /// Period filter derived from the period and limit.
    pub filter: PeriodFilter,
}

impl FundamentalQuery {
    /// Human-readable subject used in empty-data errors.
    #[must_use]
    pub fn subject(&self, model: &str) -> String {
        let symbols: Vec<&str> = self.symbols.iter().map(Symbol::as_str).collect();
        format!("{model} for {} ({})", symbols.join(","), self.period)
    }
}

impl EndpointSpec {
    /// Validates caller parameters against this endpoint.
    pub fn validate(&self, params: &Value) -> Result<FundamentalQuery> {
        let params: FundamentalParams = parse_params(params)?;
        let symbols = parse_symbols(&params.symbol)?;
        if !self.multi_symbol && symbols.len() > 1 {
            return Err(DataError::InvalidParameter(format!(
                "{} accepts a single symbol, got {}",
                self.model,
                symbols.len()
            )));
        }
        let period =
            Period::parse_accepted(params.period.as_deref(), self.periods, self.default_period)?;
        let filter = PeriodFilter::new(period, params.limit)?;
        Ok(FundamentalQuery {
            symbols,
            period,
            filter,
        })
    }
}

/// Fetcher for any factor endpoint.
pub struct FactorFetcher<R> {
    spec: EndpointSpec,
    tables: TableConfig,
    record: PhantomData<fn() -> R>,
}

impl<R> fmt::Debug for FactorFetcher<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactorFetcher")
            .field("model", &self.spec.model)
            .field("table", &self.spec.table)
            .finish()
    }
}

impl<R: FactorRecord> FactorFetcher<R> {
    /// Creates the fetcher for `spec` against the configured tables.
    #[must_use]
    pub fn new(spec: EndpointSpec, config: &XiaoYuanConfig) -> Self {
        Self {
            spec,
            tables: config.tables.clone(),
            record: PhantomData,
        }
    }

    /// The endpoint description.
    #[must_use]
    pub const fn spec(&self) -> &EndpointSpec {
        &self.spec
    }

    /// Builds the query script for a validated query.
    #[must_use]
    pub fn script(&self, query: &FundamentalQuery) -> String {
        FinanceQuery::new(
            self.tables.finance(self.spec.table),
            R::ALIASES.factors(),
            &query.symbols,
        )
        .period(query.filter)
        .fiscal_annotation(self.spec.fiscal_annotation)
        .build()
    }

    /// Pivots, normalizes, orders and limits the result frame.
    pub fn reshape(&self, query: &FundamentalQuery, frame: &DataFrame) -> Result<Vec<PivotedRecord>> {
        let mut records = pivoted_records(frame, REPORT_PERIOD, &R::ALIASES.factors())?;
        for record in &mut records {
            self.spec.normalization.apply_record(record);
            if self.spec.fiscal_annotation {
                record.annotate_fiscal();
            }
        }
        sort_by_period_desc(&mut records);
        let records = limit_per_symbol(records, query.filter.limit());
        if records.is_empty() {
            return Err(DataError::EmptyData(query.subject(self.spec.model)));
        }
        Ok(records)
    }

    /// Fetches the endpoint as a wide frame with field-named columns.
    pub async fn fetch_frame(&self, params: &Value, reader: &dyn FactorReader) -> Result<DataFrame> {
        let query = self.transform_query(params)?;
        let frame = self.extract_data(&query, reader).await?;
        let records = self.reshape(&query, &frame)?;
        records_frame(&records, R::KEY, &R::ALIASES)
    }
}

#[async_trait]
impl<R: FactorRecord> Fetcher for FactorFetcher<R> {
    type Query = FundamentalQuery;
    type Raw = DataFrame;
    type Data = R;

    fn model(&self) -> &'static str {
        self.spec.model
    }

    fn description(&self) -> &'static str {
        self.spec.description
    }

    fn transform_query(&self, params: &Value) -> Result<FundamentalQuery> {
        self.spec.validate(params)
    }

    async fn extract_data(
        &self,
        query: &FundamentalQuery,
        reader: &dyn FactorReader,
    ) -> Result<DataFrame> {
        debug!(
            model = self.spec.model,
            period = %query.period,
            symbols = query.symbols.len(),
            "Running finance factor query"
        );
        let frame = reader.run_query(&self.script(query)).await?;
        ensure_not_empty(frame, query.subject(self.spec.model))
    }

    fn transform_data(&self, query: &FundamentalQuery, raw: DataFrame) -> Result<Vec<R>> {
        Ok(self
            .reshape(query, &raw)?
            .into_iter()
            .map(R::from_pivoted)
            .collect())
    }
}
