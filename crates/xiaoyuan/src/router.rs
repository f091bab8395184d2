//! Command paths and the models behind them.

use serde_json::Value;
use tracing::debug;

use xiaoyuan_core::{DataError, Result};

use crate::provider::{Envelope, XiaoYuanProvider};

/// One command: a dotted path, the model it runs and example parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    /// Dotted command path.
    pub path: &'static str,
    /// Model the command dispatches to.
    pub model: &'static str,
    /// Example parameters as a JSON object.
    pub example: &'static str,
}

const fn route(path: &'static str, model: &'static str, example: &'static str) -> Route {
    Route {
        path,
        model,
        example,
    }
}

const ANNUAL: &str = r#"{"symbol": "SH600519", "period": "annual"}"#;
const WINDOW: &str = r#"{"symbol": "SH600519", "start_date": "2024-01-01", "end_date": "2024-02-10"}"#;

/// Every command exposed by the provider.
pub const ROUTES: &[Route] = &[
    route("equity.fundamental.balance", "BalanceSheet", r#"{"symbol": "SH600519", "period": "annual", "limit": 4}"#),
    route("equity.fundamental.income", "IncomeStatement", r#"{"symbol": "SH600519", "period": "annual", "limit": 4}"#),
    route("equity.fundamental.cash", "CashFlowStatement", r#"{"symbol": "SH600519", "period": "ytd"}"#),
    route("equity.fundamental.balance_growth", "BalanceSheetGrowth", ANNUAL),
    route("equity.fundamental.income_growth", "IncomeStatementGrowth", r#"{"symbol": "SH600519", "period": "quarter", "limit": 8}"#),
    route("equity.fundamental.cash_growth", "CashFlowStatementGrowth", ANNUAL),
    route("equity.fundamental.ratios", "FinancialRatios", ANNUAL),
    route("equity.fundamental.metrics", "KeyMetrics", r#"{"symbol": "SH600519,SZ000001", "period": "annual", "limit": 2}"#),
    route("equity.fundamental.multiples", "EquityValuationMultiples", r#"{"symbol": "SH600519,SZ000001"}"#),
    route("equity.fundamental.dividends", "HistoricalDividends", r#"{"symbol": "SH600519", "start_date": "2023-01-01", "end_date": "2024-01-01"}"#),
    route("equity.fundamental.finance_profit_ability", "FinanceProfitAbility", ANNUAL),
    route("equity.fundamental.finance_growth_ability", "FinanceGrowthAbility", ANNUAL),
    route("equity.fundamental.finance_debt_paying_ability", "FinanceDebtpayingAbility", ANNUAL),
    route("equity.fundamental.finance_operational_capability", "FinanceOperationalCapability", ANNUAL),
    route("equity.fundamental.finance_capital_structure", "FinanceCapitalStructure", ANNUAL),
    route("equity.fundamental.finance_cash_position", "FinanceCashposition", ANNUAL),
    route("equity.fundamental.finance_revenue_quality", "FinanceRevenueQuality", ANNUAL),
    route("equity.fundamental.financial_ttm_indicators", "FinancialTTMIndicators", r#"{"symbol": "SH600519", "period": "q3"}"#),
    route("equity.fundamental.per_share_indicator", "PerShareIndicator", ANNUAL),
    route("equity.fundamental.financial_derivative_data", "FinancialDerivative", ANNUAL),
    route("equity.fundamental.du_pont_analysis", "DuPontAnalysis", ANNUAL),
    route("equity.fundamental.enterprise_life_cycle", "EnterpriseLifeCycle", ANNUAL),
    route("equity.fundamental.equity_pledge", "EquityPledge", WINDOW),
    route("equity.fundamental.calculate_reduction_percentage", "ReductionPercentage", r#"{"symbol": "SH600519", "start_date": "2021-01-01", "end_date": "2023-01-10"}"#),
    route("equity.historical_market_cap", "HistoricalMarketCap", WINDOW),
    route("equity.price.historical", "EquityHistorical", r#"{"symbol": "SH600519", "interval": "1d"}"#),
    route("equity.calendar.dividend", "CalendarDividend", r#"{"start_date": "2024-02-01", "end_date": "2024-02-07"}"#),
];

/// Finds the route for a command path.
#[must_use]
pub fn find_route(path: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|route| route.path == path)
}

impl Route {
    /// Parses the example parameters.
    pub fn example_params(&self) -> Result<Value> {
        serde_json::from_str(self.example).map_err(|e| DataError::Parse(e.to_string()))
    }
}

impl XiaoYuanProvider {
    /// Runs the command at `path`.
    pub async fn call(&self, path: &str, params: &Value) -> Result<Envelope> {
        let route = find_route(path).ok_or_else(|| DataError::ModelNotFound(path.to_string()))?;
        debug!(path, model = route.model, "Dispatching command");
        self.fetch(route.model, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use serde_json::json;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use xiaoyuan_reader::{InMemoryReader, NoopReader};

    #[test]
    fn test_routes_cover_every_model() {
        let provider = XiaoYuanProvider::new(Arc::new(NoopReader));
        let routed: BTreeSet<&str> = ROUTES.iter().map(|route| route.model).collect();
        let registered: BTreeSet<&str> = provider.models().map(|(model, _)| model).collect();
        assert_eq!(routed, registered);

        let paths: BTreeSet<&str> = ROUTES.iter().map(|route| route.path).collect();
        assert_eq!(paths.len(), ROUTES.len());
    }

    #[test]
    fn test_route_examples_are_valid_parameters() {
        let provider = XiaoYuanProvider::new(Arc::new(NoopReader));
        for route in ROUTES {
            let params = route.example_params().unwrap();
            let command = provider.command(route.model).unwrap();
            assert!(
                command.validate(&params).is_ok(),
                "{} example rejected: {}",
                route.path,
                route.example
            );
        }
    }

    #[tokio::test]
    async fn test_call_dispatches_by_path() {
        let frame = DataFrame::new(vec![
            Column::new("报告期".into(), vec!["2023-12-31"]),
            Column::new("symbol".into(), vec!["SH600519"]),
            Column::new("资产总计".into(), vec![2.7e11]),
        ])
        .unwrap();
        let reader = InMemoryReader::new().with_response("cn_finance_factors_1Q", frame);
        let provider = XiaoYuanProvider::new(Arc::new(reader));

        let envelope = provider
            .call("equity.fundamental.balance", &json!({"symbol": "600519"}))
            .await
            .unwrap();
        assert_eq!(envelope.model, "BalanceSheet");
        assert_eq!(envelope.results[0]["total_assets"], 2.7e11);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let provider = XiaoYuanProvider::new(Arc::new(NoopReader));
        let err = provider
            .call("equity.fundamental.st_name", &json!({"symbol": "SH600519"}))
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::ModelNotFound(_)));
    }
}
