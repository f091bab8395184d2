//! Year-over-year growth of statement line items.
//!
//! Growth rates are stored as percentages; records carry them as fractions, so a
//! stored `15.0` is reported as `0.15`. Zero means not reported.

use xiaoyuan_core::period::{GROWTH_PERIODS, STATEMENT_PERIODS};
use xiaoyuan_core::{FactTable, Normalization, Period, report_record};

use crate::endpoint::EndpointSpec;

report_record! {
    /// Balance sheet growth.
    pub struct BalanceSheetGrowth {
        /// Total assets, year over year.
        growth_total_assets => "总资产同比增长率（百分比）",
    }
}

report_record! {
    /// Income statement growth.
    pub struct IncomeStatementGrowth {
        /// Total operating income, year over year.
        growth_revenue => "营业总收入同比增长率（百分比）",
        /// Operating income, year over year.
        growth_operating_income => "营业收入同比增长率",
        /// Basic earnings per share, year over year.
        growth_basic_earnings_per_share => "基本每股收益同比增长率（百分比）",
        /// Diluted earnings per share, year over year.
        growth_diluted_earnings_per_share => "稀释每股收益同比增长率（百分比）",
    }
}

report_record! {
    /// Cash flow statement growth.
    pub struct CashFlowStatementGrowth {
        /// Net income, year over year.
        growth_net_income => "净利润同比增长率（百分比）",
        /// Net cash from operating activities, year over year.
        growth_operating_cash_flow => "经营活动产生的现金流量净额同比增长率（百分比）",
    }
}

const fn growth(
    model: &'static str,
    description: &'static str,
    periods: &'static [Period],
) -> EndpointSpec {
    EndpointSpec {
        model,
        description,
        periods,
        default_period: Period::Annual,
        table: FactTable::Quarterly,
        multi_symbol: false,
        fiscal_annotation: false,
        normalization: Normalization::GROWTH,
    }
}

/// Balance sheet growth endpoint.
pub const BALANCE_SHEET_GROWTH: EndpointSpec =
    growth("BalanceSheetGrowth", "Balance sheet growth rates.", STATEMENT_PERIODS);

/// Income statement growth endpoint.
pub const INCOME_STATEMENT_GROWTH: EndpointSpec =
    growth("IncomeStatementGrowth", "Income statement growth rates.", GROWTH_PERIODS);

/// Cash flow statement growth endpoint.
pub const CASH_FLOW_STATEMENT_GROWTH: EndpointSpec =
    growth("CashFlowStatementGrowth", "Cash flow statement growth rates.", STATEMENT_PERIODS);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::FactorFetcher;
    use polars::prelude::*;
    use serde_json::json;
    use xiaoyuan_core::{Fetcher, XiaoYuanConfig};
    use xiaoyuan_reader::InMemoryReader;

    #[tokio::test]
    async fn test_income_growth_scaled_to_fraction() {
        let frame = DataFrame::new(vec![
            Column::new("报告期".into(), vec!["2023-12-31", "2023-09-30"]),
            Column::new("symbol".into(), vec!["SH600519", "SH600519"]),
            Column::new("营业总收入同比增长率（百分比）".into(), vec![18.04, 0.0]),
            Column::new("基本每股收益同比增长率（百分比）".into(), vec![19.16, -2.5]),
        ])
        .unwrap();
        let reader = InMemoryReader::new().with_response("cn_finance_factors_1Q", frame);
        let fetcher = FactorFetcher::<IncomeStatementGrowth>::new(
            INCOME_STATEMENT_GROWTH,
            &XiaoYuanConfig::default(),
        );

        let records = fetcher
            .fetch_data(&json!({"symbol": "600519", "period": "quarter", "limit": 2}), &reader)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!((records[0].growth_revenue.unwrap() - 0.1804).abs() < 1e-12);
        assert!((records[1].growth_basic_earnings_per_share.unwrap() + 0.025).abs() < 1e-12);
        assert_eq!(records[1].growth_revenue, None);
        assert_eq!(records[0].growth_operating_income, None);
        assert!(records[0].fiscal_period.is_none());

        let queries = reader.queries().await;
        assert!(!queries[0].contains("monthOfYear(报告期) ="));
        assert!(queries[0].contains("limit 2"));
    }

    #[tokio::test]
    async fn test_growth_period_sets_differ() {
        let reader = InMemoryReader::new();
        let config = XiaoYuanConfig::default();

        let balance = FactorFetcher::<BalanceSheetGrowth>::new(BALANCE_SHEET_GROWTH, &config);
        let err = balance
            .fetch_data(&json!({"symbol": "SH600519", "period": "quarter"}), &reader)
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let cash = FactorFetcher::<CashFlowStatementGrowth>::new(CASH_FLOW_STATEMENT_GROWTH, &config);
        let err = cash
            .fetch_data(&json!({"symbol": "SH600519", "period": "ytd"}), &reader)
            .await
            .unwrap_err();
        assert!(err.is_empty_data());
    }
}
