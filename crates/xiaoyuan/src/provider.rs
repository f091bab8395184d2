//! The provider: every endpoint registered under its model name.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use xiaoyuan_core::{DataError, FactorReader, Fetcher, Result, XiaoYuanConfig};
use xiaoyuan_models::daily::DailyFactorFetcher;
use xiaoyuan_models::dividends::{CalendarDividendFetcher, HistoricalDividendsFetcher};
use xiaoyuan_models::endpoint::FactorFetcher;
use xiaoyuan_models::growth::{
    BALANCE_SHEET_GROWTH, BalanceSheetGrowth, CASH_FLOW_STATEMENT_GROWTH, CashFlowStatementGrowth,
    INCOME_STATEMENT_GROWTH, IncomeStatementGrowth,
};
use xiaoyuan_models::indicators::{
    DU_PONT_ANALYSIS, DuPontAnalysis, ENTERPRISE_LIFE_CYCLE, EnterpriseLifeCycle,
    FINANCIAL_DERIVATIVE, FINANCIAL_TTM_INDICATORS, FinancialDerivative, FinancialTTMIndicators,
    PER_SHARE_INDICATOR, PerShareIndicator,
};
use xiaoyuan_models::market::{
    EQUITY_PLEDGE, EquityHistoricalFetcher, EquityPledge, HISTORICAL_MARKET_CAP,
    HistoricalMarketCap, REDUCTION_PERCENTAGE, ReductionPercentage,
};
use xiaoyuan_models::metrics::{EquityValuationMultiplesFetcher, KeyMetricsFetcher};
use xiaoyuan_models::ratios::{
    FINANCE_CAPITAL_STRUCTURE, FINANCE_CASHPOSITION, FINANCE_DEBTPAYING_ABILITY,
    FINANCE_GROWTH_ABILITY, FINANCE_OPERATIONAL_CAPABILITY, FINANCE_PROFIT_ABILITY,
    FINANCE_REVENUE_QUALITY, FINANCIAL_RATIOS, FinanceCapitalStructure, FinanceCashposition,
    FinanceDebtpayingAbility, FinanceGrowthAbility, FinanceOperationalCapability,
    FinanceProfitAbility, FinanceRevenueQuality, FinancialRatios,
};
use xiaoyuan_models::statements::{
    BALANCE_SHEET, BalanceSheet, CASH_FLOW_STATEMENT, CashFlowStatement, INCOME_STATEMENT,
    IncomeStatement,
};

/// A fetcher with its record type erased to JSON.
///
/// Every [`Fetcher`] is a `Command`.
#[async_trait]
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Model name the command is registered under.
    fn model(&self) -> &'static str;

    /// Short description of the command.
    fn description(&self) -> &'static str;

    /// Checks parameters without touching the store.
    fn validate(&self, params: &Value) -> Result<()>;

    /// Runs the fetcher and serializes its records.
    async fn execute(&self, params: &Value, reader: &dyn FactorReader) -> Result<Vec<Value>>;
}

#[async_trait]
impl<F: Fetcher> Command for F {
    fn model(&self) -> &'static str {
        Fetcher::model(self)
    }

    fn description(&self) -> &'static str {
        Fetcher::description(self)
    }

    fn validate(&self, params: &Value) -> Result<()> {
        self.transform_query(params).map(|_| ())
    }

    async fn execute(&self, params: &Value, reader: &dyn FactorReader) -> Result<Vec<Value>> {
        let records = self.fetch_data(params, reader).await?;
        records
            .iter()
            .map(|record| serde_json::to_value(record).map_err(|e| DataError::Parse(e.to_string())))
            .collect()
    }
}

/// Result of one provider call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Envelope {
    /// Provider name.
    pub provider: &'static str,
    /// Model that produced the results.
    pub model: &'static str,
    /// Serialized records.
    pub results: Vec<Value>,
}

/// Runs XiaoYuan endpoints against an injected reader.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use serde_json::json;
/// use xiaoyuan::XiaoYuanProvider;
///
/// let provider = XiaoYuanProvider::new(Arc::new(reader));
/// let envelope = provider
///     .fetch("IncomeStatement", &json!({"symbol": "SH600519", "period": "annual", "limit": 4}))
///     .await?;
/// assert_eq!(envelope.provider, "xiaoyuan");
/// ```
pub struct XiaoYuanProvider {
    reader: Arc<dyn FactorReader>,
    config: XiaoYuanConfig,
    fetchers: BTreeMap<&'static str, Arc<dyn Command>>,
}

impl std::fmt::Debug for XiaoYuanProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XiaoYuanProvider")
            .field("reader", &self.reader.name())
            .field("config", &self.config)
            .field("fetchers", &self.fetchers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl XiaoYuanProvider {
    /// Provider name reported in every envelope.
    pub const NAME: &'static str = "xiaoyuan";

    /// Creates a provider over `reader` with the default tables and windows.
    #[must_use]
    pub fn new(reader: Arc<dyn FactorReader>) -> Self {
        Self::with_config(reader, XiaoYuanConfig::default())
    }

    /// Creates a provider over `reader` with custom tables and windows.
    #[must_use]
    pub fn with_config(reader: Arc<dyn FactorReader>, config: XiaoYuanConfig) -> Self {
        let mut provider = Self {
            reader,
            config,
            fetchers: BTreeMap::new(),
        };
        provider.register_defaults();
        provider
    }

    /// The configuration endpoints were built with.
    #[must_use]
    pub const fn config(&self) -> &XiaoYuanConfig {
        &self.config
    }

    /// Registers a command, replacing any under the same model name.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        debug!(model = command.model(), "Registering fetcher");
        if self.fetchers.insert(command.model(), command).is_some() {
            debug!("Replaced an existing fetcher");
        }
    }

    /// Registered model names with their descriptions.
    pub fn models(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.fetchers
            .values()
            .map(|command| (command.model(), command.description()))
    }

    /// Looks up the command registered under `model`.
    pub fn command(&self, model: &str) -> Result<&Arc<dyn Command>> {
        self.fetchers
            .get(model)
            .ok_or_else(|| DataError::ModelNotFound(model.to_string()))
    }

    /// Runs the fetcher registered under `model`.
    #[instrument(skip(self, params), fields(reader = self.reader.name()))]
    pub async fn fetch(&self, model: &str, params: &Value) -> Result<Envelope> {
        let command = self.command(model)?;
        match command.execute(params, self.reader.as_ref()).await {
            Ok(results) => {
                debug!(count = results.len(), "Fetched records");
                Ok(Envelope {
                    provider: Self::NAME,
                    model: command.model(),
                    results,
                })
            }
            Err(e) => {
                warn!(error = %e, "Fetch failed");
                Err(e)
            }
        }
    }

    fn register_defaults(&mut self) {
        let config = self.config.clone();
        let c = &config;

        self.register(Arc::new(FactorFetcher::<BalanceSheet>::new(BALANCE_SHEET, c)));
        self.register(Arc::new(FactorFetcher::<IncomeStatement>::new(INCOME_STATEMENT, c)));
        self.register(Arc::new(FactorFetcher::<CashFlowStatement>::new(CASH_FLOW_STATEMENT, c)));

        self.register(Arc::new(FactorFetcher::<BalanceSheetGrowth>::new(BALANCE_SHEET_GROWTH, c)));
        self.register(Arc::new(FactorFetcher::<IncomeStatementGrowth>::new(
            INCOME_STATEMENT_GROWTH,
            c,
        )));
        self.register(Arc::new(FactorFetcher::<CashFlowStatementGrowth>::new(
            CASH_FLOW_STATEMENT_GROWTH,
            c,
        )));

        self.register(Arc::new(FactorFetcher::<FinancialRatios>::new(FINANCIAL_RATIOS, c)));
        self.register(Arc::new(FactorFetcher::<FinanceProfitAbility>::new(
            FINANCE_PROFIT_ABILITY,
            c,
        )));
        self.register(Arc::new(FactorFetcher::<FinanceGrowthAbility>::new(
            FINANCE_GROWTH_ABILITY,
            c,
        )));
        self.register(Arc::new(FactorFetcher::<FinanceDebtpayingAbility>::new(
            FINANCE_DEBTPAYING_ABILITY,
            c,
        )));
        self.register(Arc::new(FactorFetcher::<FinanceOperationalCapability>::new(
            FINANCE_OPERATIONAL_CAPABILITY,
            c,
        )));
        self.register(Arc::new(FactorFetcher::<FinanceCapitalStructure>::new(
            FINANCE_CAPITAL_STRUCTURE,
            c,
        )));
        self.register(Arc::new(FactorFetcher::<FinanceCashposition>::new(
            FINANCE_CASHPOSITION,
            c,
        )));
        self.register(Arc::new(FactorFetcher::<FinanceRevenueQuality>::new(
            FINANCE_REVENUE_QUALITY,
            c,
        )));

        self.register(Arc::new(FactorFetcher::<FinancialTTMIndicators>::new(
            FINANCIAL_TTM_INDICATORS,
            c,
        )));
        self.register(Arc::new(FactorFetcher::<PerShareIndicator>::new(PER_SHARE_INDICATOR, c)));
        self.register(Arc::new(FactorFetcher::<FinancialDerivative>::new(FINANCIAL_DERIVATIVE, c)));
        self.register(Arc::new(FactorFetcher::<DuPontAnalysis>::new(DU_PONT_ANALYSIS, c)));
        self.register(Arc::new(FactorFetcher::<EnterpriseLifeCycle>::new(ENTERPRISE_LIFE_CYCLE, c)));

        self.register(Arc::new(DailyFactorFetcher::<HistoricalMarketCap>::new(
            HISTORICAL_MARKET_CAP,
            c,
        )));
        self.register(Arc::new(DailyFactorFetcher::<EquityPledge>::new(EQUITY_PLEDGE, c)));
        self.register(Arc::new(DailyFactorFetcher::<ReductionPercentage>::new(
            REDUCTION_PERCENTAGE,
            c,
        )));

        self.register(Arc::new(EquityHistoricalFetcher::new(c)));
        self.register(Arc::new(KeyMetricsFetcher::new(c)));
        self.register(Arc::new(EquityValuationMultiplesFetcher::new(c)));
        self.register(Arc::new(CalendarDividendFetcher::new(c)));
        self.register(Arc::new(HistoricalDividendsFetcher::new(c)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use serde_json::json;
    use xiaoyuan_reader::{InMemoryReader, NoopReader};

    fn income_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("报告期".into(), vec!["2022-12-31", "2023-12-31"]),
            Column::new("symbol".into(), vec!["SH600519"; 2]),
            Column::new("营业总收入".into(), vec![1.28e11, 1.51e11]),
        ])
        .unwrap()
    }

    #[test]
    fn test_every_endpoint_registered() {
        let provider = XiaoYuanProvider::new(Arc::new(NoopReader));
        let models: Vec<&str> = provider.models().map(|(model, _)| model).collect();
        assert_eq!(models.len(), 27);
        for model in [
            "BalanceSheet",
            "IncomeStatement",
            "CashFlowStatement",
            "IncomeStatementGrowth",
            "FinancialRatios",
            "EnterpriseLifeCycle",
            "HistoricalMarketCap",
            "EquityHistorical",
            "KeyMetrics",
            "EquityValuationMultiples",
            "CalendarDividend",
            "HistoricalDividends",
        ] {
            assert!(models.contains(&model), "{model} is not registered");
        }
        for (model, description) in provider.models() {
            assert!(!description.is_empty(), "{model} has no description");
        }
    }

    #[tokio::test]
    async fn test_fetch_wraps_records() {
        let reader = InMemoryReader::new().with_response("cn_finance_factors_1Q", income_frame());
        let provider = XiaoYuanProvider::new(Arc::new(reader));

        let envelope = provider
            .fetch("IncomeStatement", &json!({"symbol": "SH600519", "period": "annual", "limit": 4}))
            .await
            .unwrap();
        assert_eq!(envelope.provider, "xiaoyuan");
        assert_eq!(envelope.model, "IncomeStatement");
        assert_eq!(envelope.results.len(), 2);
        assert_eq!(envelope.results[0]["symbol"], "SH600519");
        assert_eq!(envelope.results[0]["period_ending"], "2023-12-31");
        assert_eq!(envelope.results[0]["total_operating_income"], 1.51e11);
        assert!(envelope.results[0]["research_and_development_expense"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_model() {
        let provider = XiaoYuanProvider::new(Arc::new(NoopReader));
        let err = provider.fetch("StName", &json!({"symbol": "SH600519"})).await.unwrap_err();
        assert!(matches!(err, DataError::ModelNotFound(model) if model == "StName"));
    }

    #[tokio::test]
    async fn test_fetch_propagates_empty_data() {
        let provider = XiaoYuanProvider::new(Arc::new(NoopReader));
        let err = provider
            .fetch("BalanceSheet", &json!({"symbol": "SH600519"}))
            .await
            .unwrap_err();
        assert!(err.is_empty_data());
    }

    #[test]
    fn test_register_replaces_model() {
        let mut provider = XiaoYuanProvider::new(Arc::new(NoopReader));
        let before = provider.models().count();
        let calendar = CalendarDividendFetcher::new(provider.config());
        provider.register(Arc::new(calendar));
        assert_eq!(provider.models().count(), before);
    }
}
