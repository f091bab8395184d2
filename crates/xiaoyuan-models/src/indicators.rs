//! Trailing, per-share and derived indicators.

use xiaoyuan_core::period::{ANNUAL_PERIODS, FISCAL_PERIODS, QUARTER_PERIODS};
use xiaoyuan_core::{FactTable, Normalization, Period, report_record};

use crate::endpoint::EndpointSpec;
use crate::ratios::breakdown;

report_record! {
    /// Trailing twelve month income statement figures.
    pub struct FinancialTTMIndicators {
        /// Total operating income.
        total_revenue_ttm => "营业总收入TTM",
        /// Total operating cost.
        total_cost_ttm => "营业总成本TTM",
        /// Operating income.
        revenue_ttm => "营业收入TTM",
        /// Operating cost, non-financial companies.
        operating_cost_non_financial_ttm => "营业成本非金融类TTM",
        /// Operating expenses, financial companies.
        operating_expenses_financial_ttm => "营业支出金融类TTM",
        /// Gross profit.
        gross_profit_ttm => "毛利TTM",
        /// Selling expenses.
        selling_expenses_ttm => "销售费用TTM",
        /// Administrative expenses.
        admin_expenses_ttm => "管理费用TTM",
        /// Financial expenses.
        financial_expenses_ttm => "财务费用TTM",
        /// Impairment losses.
        impairment_losses_ttm => "资产减值损失TTM",
        /// Net operating income.
        net_operating_income_ttm => "经营活动净收益TTM",
        /// Fair value changes.
        net_income_from_fair_value_changes_ttm => "价值变动净收益TTM",
        /// Operating profit.
        operating_profit_ttm => "营业利润TTM",
        /// Net non-operating income and expenses.
        net_non_operating_income_and_expenses_ttm => "营业外收支净额TTM",
        /// EBIT.
        ebit_ttm => "息税前利润TTM",
        /// Total profit.
        total_profit_ttm => "利润总额TTM",
        /// Income tax.
        income_tax_ttm => "所得税TTM",
        /// Net profit attributable to shareholders.
        net_profit_attributable_to_shareholders_ttm => "归属母公司股东的净利润TTM",
    }
}

report_record! {
    /// Per-share figures, in yuan.
    pub struct PerShareIndicator {
        /// Diluted EPS at period end.
        eps_diluted => "期末摊薄每股收益（元）",
        /// EPS excluding non-recurring items.
        eps_excl_extraordinary => "扣非每股收益（元）",
        /// EPS, trailing twelve months.
        eps_ttm => "每股收益EPSTTM（元）",
        /// Net assets per share.
        nav_per_share => "每股净资产（元）",
        /// Total operating income per share.
        total_revenue_per_share => "每股营业总收入（元）",
        /// Operating income per share.
        revenue_per_share => "每股营业收入（元）",
        /// Operating income per share, trailing twelve months.
        revenue_p_share_ttm => "每股营业收入TTM（元）",
        /// EBIT per share.
        ebit_per_share => "每股息税前利润（元）",
        /// Capital reserve per share.
        capital_reserve_per_share => "每股资本公积（元）",
        /// Surplus reserve per share.
        surplus_reserve_per_share => "每股盈余公积（元）",
        /// Undistributed profit per share.
        undistributed_profit_per_share => "每股未分配利润（元）",
        /// Retained earnings per share.
        retained_earnings_per_share => "每股留存收益（元）",
        /// Operating cash flow per share.
        ocf_per_share => "每股经营活动产生的现金流量净额（元）",
        /// Operating cash flow per share, trailing twelve months.
        ocf_p_share_ttm => "每股经营活动产生的现金流量净额TTM（元）",
        /// Net cash flow per share.
        ncf_per_share => "每股现金流量净额（元）",
        /// Net cash flow per share, trailing twelve months.
        ncf_p_share_ttm => "每股现金流量净额TTM（元）",
        /// Free cash flow to the firm per share.
        fcf_to_firm_per_share => "每股企业自由现金流量（元）",
        /// Free cash flow to equity per share.
        fcf_to_equity_per_share => "每股股东自由现金流量（元）",
    }
}

report_record! {
    /// Derived balance sheet and income figures.
    pub struct FinancialDerivative {
        /// Non-interest-bearing current liabilities.
        non_interest_bearing_current_liabilities => "无息流动负债",
        /// Non-interest-bearing non-current liabilities.
        non_interest_bearing_non_current_liabilities => "无息非流动负债",
        /// Interest-bearing debt.
        interest_bearing_debt => "带息债务",
        /// Net debt.
        net_debt => "净债务",
        /// Tangible net assets.
        tangible_net_assets => "有形净资产",
        /// Working capital.
        working_capital => "营运资本",
        /// Net working capital.
        net_working_capital => "净营运资本",
        /// Retained earnings.
        retained_earnings => "留存收益",
        /// Gross profit.
        gross_profit => "毛利",
        /// Net operating income.
        net_operating_income => "经营活动净收益",
        /// Fair value changes.
        net_income_from_fair_value_changes => "价值变动净收益",
        /// EBIT.
        ebit => "息税前利润",
        /// EBITDA.
        ebitda => "息税折旧摊销前利润",
        /// Non-recurring gains and losses.
        non_recurring_gains_and_losses => "非经常性损益",
        /// Net profit attributable to shareholders excluding non-recurring items.
        net_profit_attributable_to_shareholders_excl_non_recurring_gains_and_losses => "扣除非经常性损益后的归属于上市公司股东的净利润",
        /// Free cash flow to the firm.
        free_cash_flow_to_firm => "企业自由现金流量",
        /// Free cash flow to equity.
        free_cash_flow_to_equity => "股权自由现金流量",
        /// Depreciation and amortization.
        depreciation_and_amortization => "折旧与摊销",
    }
}

report_record! {
    /// DuPont equity multiplier.
    pub struct DuPontAnalysis {
        /// Equity multiplier.
        du_pont_analysis => "权益乘数（杜邦分析）",
    }
}

report_record! {
    /// Enterprise life cycle stage code.
    pub struct EnterpriseLifeCycle {
        /// Life cycle stage.
        enterprise_life_cycle => "企业生命周期",
    }
}

/// Trailing twelve month indicators endpoint.
pub const FINANCIAL_TTM_INDICATORS: EndpointSpec = breakdown(
    "FinancialTTMIndicators",
    "Trailing twelve month indicators.",
    QUARTER_PERIODS,
);

/// Per-share indicators endpoint.
pub const PER_SHARE_INDICATOR: EndpointSpec =
    breakdown("PerShareIndicator", "Per-share indicators.", FISCAL_PERIODS);

/// Derived figures endpoint.
pub const FINANCIAL_DERIVATIVE: EndpointSpec =
    breakdown("FinancialDerivative", "Derived financial figures.", FISCAL_PERIODS);

/// DuPont analysis endpoint.
pub const DU_PONT_ANALYSIS: EndpointSpec =
    breakdown("DuPontAnalysis", "DuPont equity multiplier.", QUARTER_PERIODS);

/// Enterprise life cycle endpoint, read from the annual table.
pub const ENTERPRISE_LIFE_CYCLE: EndpointSpec = EndpointSpec {
    model: "EnterpriseLifeCycle",
    description: "Enterprise life cycle stage.",
    periods: ANNUAL_PERIODS,
    default_period: Period::Fy,
    table: FactTable::Annual,
    multi_symbol: true,
    fiscal_annotation: false,
    normalization: Normalization::NONE,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::FactorFetcher;
    use polars::prelude::*;
    use serde_json::json;
    use xiaoyuan_core::{Fetcher, XiaoYuanConfig};
    use xiaoyuan_reader::InMemoryReader;

    #[tokio::test]
    async fn test_life_cycle_reads_annual_table() {
        let frame = DataFrame::new(vec![
            Column::new("报告期".into(), vec!["2023-12-31", "2022-12-31"]),
            Column::new("symbol".into(), vec!["SH600519", "SH600519"]),
            Column::new("企业生命周期".into(), vec![3.0, 2.0]),
        ])
        .unwrap();
        let reader = InMemoryReader::new().with_response("cn_finance_factors_1Y)", frame);
        let fetcher = FactorFetcher::<EnterpriseLifeCycle>::new(
            ENTERPRISE_LIFE_CYCLE,
            &XiaoYuanConfig::default(),
        );

        let records = fetcher
            .fetch_data(&json!({"symbol": "SH600519"}), &reader)
            .await
            .unwrap();
        // fy keeps the latest report only
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].enterprise_life_cycle, Some(3.0));

        let err = fetcher
            .fetch_data(&json!({"symbol": "SH600519", "period": "q1"}), &reader)
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_du_pont_keeps_zero() {
        let frame = DataFrame::new(vec![
            Column::new("报告期".into(), vec!["2023-09-30"]),
            Column::new("symbol".into(), vec!["SH600519"]),
            Column::new("权益乘数（杜邦分析）".into(), vec![0.0]),
        ])
        .unwrap();
        let reader = InMemoryReader::new().with_response("cn_finance_factors_1Q", frame);
        let fetcher = FactorFetcher::<DuPontAnalysis>::new(DU_PONT_ANALYSIS, &XiaoYuanConfig::default());

        let records = fetcher
            .fetch_data(&json!({"symbol": "SH600519", "period": "q3"}), &reader)
            .await
            .unwrap();
        assert_eq!(records[0].du_pont_analysis, Some(0.0));
    }
}
