//! The template behind daily factor endpoints.
//!
//! A daily endpoint reads one or more factors of the daily fact table over a window of
//! trading days, either as a script pivoted by the store or as long rows pivoted here.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;
use xiaoyuan_core::config::months_before;
use xiaoyuan_core::frame::{factor_rows, pivot_rows, pivoted_records};
use xiaoyuan_core::query::TIMESTAMP;
use xiaoyuan_core::reshape::sort_by_period_desc;
use xiaoyuan_core::{
    DailyQuery, DataError, FactorReader, FactorRecord, FactorRequest, Fetcher, PivotedRecord,
    Result, Symbol, XiaoYuanConfig, parse_params, parse_symbols,
};

use crate::params::{DateWindow, WindowParams};

/// How rows are obtained from the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DailySource {
    /// A query script pivoted by the store.
    Script,
    /// Long-format rows from [`FactorReader::get_factors`], pivoted client-side.
    Factors,
}

/// Which configured window applies when no start date is given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookback {
    /// Market capitalization history.
    MarketCap,
    /// Daily factor series.
    FactorHistory,
}

/// Declarative description of a daily factor endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DailySpec {
    /// Model name the endpoint is registered under.
    pub model: &'static str,
    /// Short description.
    pub description: &'static str,
    /// Row source.
    pub source: DailySource,
    /// Default look-back window.
    pub lookback: Lookback,
}

/// Validated parameters of a daily endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DailyWindowQuery {
    /// Normalized symbols.
    pub symbols: Vec<Symbol>,
    /// Trading day window.
    pub window: DateWindow,
}

impl DailyWindowQuery {
    fn subject(&self, model: &str) -> String {
        let symbols: Vec<&str> = self.symbols.iter().map(Symbol::as_str).collect();
        format!(
            "{model} for {} between {} and {}",
            symbols.join(","),
            self.window.start,
            self.window.end
        )
    }
}

/// Fetcher for any daily factor endpoint.
pub struct DailyFactorFetcher<R> {
    spec: DailySpec,
    config: XiaoYuanConfig,
    record: PhantomData<fn() -> R>,
}

impl<R> fmt::Debug for DailyFactorFetcher<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DailyFactorFetcher")
            .field("model", &self.spec.model)
            .field("source", &self.spec.source)
            .finish()
    }
}

impl<R: FactorRecord> DailyFactorFetcher<R> {
    /// Creates the fetcher for `spec`.
    #[must_use]
    pub fn new(spec: DailySpec, config: &XiaoYuanConfig) -> Self {
        Self {
            spec,
            config: config.clone(),
            record: PhantomData,
        }
    }

    fn lookback_months(&self) -> u32 {
        match self.spec.lookback {
            Lookback::MarketCap => self.config.windows.market_cap_months,
            Lookback::FactorHistory => self.config.windows.factor_history_months,
        }
    }

    async fn run_script(
        &self,
        query: &DailyWindowQuery,
        reader: &dyn FactorReader,
    ) -> Result<Vec<PivotedRecord>> {
        let factors = R::ALIASES.factors();
        let script = DailyQuery::between(
            &self.config.tables.daily,
            factors.iter().copied(),
            &query.symbols,
            reader.convert_to_db_date_format(query.window.start),
            reader.convert_to_db_date_format(query.window.end),
        )
        .build();
        let frame = reader.run_query(&script).await?;
        if frame.height() == 0 {
            return Ok(Vec::new());
        }
        pivoted_records(&frame, TIMESTAMP, &factors)
    }

    async fn read_factors(
        &self,
        query: &DailyWindowQuery,
        reader: &dyn FactorReader,
    ) -> Result<Vec<PivotedRecord>> {
        let request = FactorRequest::new(
            R::ALIASES.factors(),
            query.symbols.clone(),
            query.window.start,
            query.window.end,
        );
        let frame = reader.get_factors(&request).await?;
        if frame.height() == 0 {
            return Ok(Vec::new());
        }
        Ok(pivot_rows(factor_rows(&frame)?))
    }
}

#[async_trait]
impl<R: FactorRecord> Fetcher for DailyFactorFetcher<R> {
    type Query = DailyWindowQuery;
    type Raw = Vec<PivotedRecord>;
    type Data = R;

    fn model(&self) -> &'static str {
        self.spec.model
    }

    fn description(&self) -> &'static str {
        self.spec.description
    }

    fn transform_query(&self, params: &Value) -> Result<DailyWindowQuery> {
        let params: WindowParams = parse_params(params)?;
        let months = self.lookback_months();
        let window = DateWindow::looking_back(params.start_date, params.end_date, |end| {
            months_before(end, months)
        })?;
        Ok(DailyWindowQuery {
            symbols: parse_symbols(&params.symbol)?,
            window,
        })
    }

    async fn extract_data(
        &self,
        query: &DailyWindowQuery,
        reader: &dyn FactorReader,
    ) -> Result<Vec<PivotedRecord>> {
        debug!(
            model = self.spec.model,
            source = ?self.spec.source,
            start = %query.window.start,
            end = %query.window.end,
            "Running daily factor query"
        );
        let records = match self.spec.source {
            DailySource::Script => self.run_script(query, reader).await?,
            DailySource::Factors => self.read_factors(query, reader).await?,
        };
        if records.is_empty() {
            return Err(DataError::EmptyData(query.subject(self.spec.model)));
        }
        debug!(rows = records.len(), "Daily factor rows received");
        Ok(records)
    }

    fn transform_data(&self, _query: &DailyWindowQuery, mut raw: Vec<PivotedRecord>) -> Result<Vec<R>> {
        sort_by_period_desc(&mut raw);
        Ok(raw.into_iter().map(R::from_pivoted).collect())
    }
}
