//! Financial ratios and the ability breakdowns.
//!
//! [`FinancialRatios`] is a single-symbol statement-style endpoint where zero means not
//! reported. The `Finance*` endpoints accept several symbols and keep values as stored.

use xiaoyuan_core::period::{FISCAL_PERIODS, QUARTER_PERIODS, STATEMENT_PERIODS};
use xiaoyuan_core::{FactTable, Normalization, Period, report_record};

use crate::endpoint::EndpointSpec;

report_record! {
    /// Liquidity, efficiency, profitability and leverage ratios.
    pub struct FinancialRatios {
        /// Current ratio.
        current_ratio => "流动比率",
        /// Quick ratio.
        quick_ratio => "速动比率",
        /// Days of sales outstanding, notes included.
        days_of_sales_outstanding => "应收账款周转天数（含应收票据）",
        /// Days of inventory outstanding.
        days_of_inventory_outstanding => "存货周转天数",
        /// Operating cycle in days.
        operating_cycle => "营业周期",
        /// Days of payables outstanding, notes included.
        days_of_payables_outstanding => "应付账款周转天数（含应付票据）",
        /// Gross profit margin, percent.
        gross_profit_margin => "销售毛利率（百分比）",
        /// Operating profit over total operating income, percent.
        operating_profit_margin => "营业利润比营业总收入（百分比）",
        /// Net profit over total operating income, percent.
        net_profit_margin => "净利润比营业总收入（百分比）",
        /// Return on assets, percent.
        return_on_assets => "总资产净利率ROA（百分比）",
        /// Diluted return on equity, percent.
        return_on_equity => "净资产收益率ROE（摊薄）（百分比）",
        /// Return on invested capital, percent.
        return_on_capital_employed => "投入资本回报率ROIC（百分比）",
        /// Net income over earnings before tax.
        net_income_per_ebt => "净利润比利润总额",
        /// Earnings before tax over EBIT.
        ebt_per_ebit => "利润总额比息税前利润",
        /// EBIT over total operating income.
        ebit_per_revenue => "息税前利润比营业总收入",
        /// Total liabilities over total assets.
        debt_ratio => "资产负债率",
        /// Liabilities over equity.
        debt_equity_ratio => "产权比率",
        /// Receivables turnover, notes included.
        receivables_turnover => "应收账款周转率（含应收票据）",
        /// Payables turnover.
        payables_turnover => "应付账款周转率",
        /// Inventory turnover.
        inventory_turnover => "存货周转率",
        /// Fixed asset turnover.
        fixed_asset_turnover => "固定资产周转率",
        /// Total asset turnover.
        asset_turnover => "总资产周转率",
    }
}

report_record! {
    /// Profitability.
    pub struct FinanceProfitAbility {
        /// Diluted ROE, percent.
        roe_diluted_percent => "净资产收益率ROE（摊薄）（百分比）",
        /// Average ROE, percent.
        roe_average_percent => "净资产收益率ROE（平均）（百分比）",
        /// Weighted ROE, percent.
        roe_weighted_percent => "净资产收益率ROE（加权）（百分比）",
        /// Diluted ROE excluding non-recurring items, percent.
        roe_ex_diluted_percent => "净资产收益率ROE（扣除比摊薄）（百分比）",
        /// Weighted ROE excluding non-recurring items, percent.
        roe_ex_weighted_percent => "净资产收益率ROE（扣除比加权）（百分比）",
        /// Net ROA, percent.
        roa_net_percent => "总资产净利率ROA（百分比）",
        /// Return on total assets, percent.
        roa_return_percent => "总资产报酬率ROA（百分比）",
        /// ROIC, percent.
        roic_percent => "投入资本回报率ROIC（百分比）",
        /// ROE trailing twelve months, percent.
        roe_ttm_percent => "净资产收益率ROE（TTM）（百分比）",
        /// Return on total assets trailing twelve months, percent.
        roa_return_ttm_percent => "总资产报酬率ROA（TTM）（百分比）",
        /// Net ROA trailing twelve months, percent.
        roa_net_ttm_percent => "总资产净利率（TTM）（百分比）",
        /// Net profit margin, percent.
        net_profit_margin_percent => "销售净利率（百分比）",
        /// Net profit margin trailing twelve months, percent.
        net_profit_margin_ttm_percent => "销售净利率（TTM）（百分比）",
        /// Gross profit margin, percent.
        gross_profit_margin_percent => "销售毛利率（百分比）",
        /// Gross profit margin trailing twelve months, percent.
        gross_profit_margin_ttm_percent => "销售毛利率（TTM）（百分比）",
        /// Period expenses over revenue, percent.
        selling_expenses_to_revenue_percent => "销售期间费用率（百分比）",
        /// Period expenses over revenue trailing twelve months, percent.
        selling_expenses_to_revenue_ttm_percent => "销售期间费用率（TTM）（百分比）",
        /// Net profit over total operating income, percent.
        net_profit_to_total_revenue_percent => "净利润比营业总收入（百分比）",
        /// Net profit over total operating income trailing twelve months, percent.
        net_profit_to_total_revenue_ttm_percent => "净利润比营业总收入（TTM）（百分比）",
        /// Operating profit over total operating income, percent.
        operating_profit_to_total_revenue_percent => "营业利润比营业总收入（百分比）",
        /// Operating profit over total operating income trailing twelve months, percent.
        operating_profit_to_total_revenue_ttm_percent => "营业利润比营业总收入（TTM）（百分比）",
        /// Total cost over total operating income trailing twelve months, percent.
        total_cost_to_revenue_ttm_percent => "营业总成本比营业总收入（TTM）（百分比）",
        /// Selling expenses over total operating income trailing twelve months, percent.
        selling_expenses_to_total_revenue_ttm_percent => "营业费用比营业总收入（TTM）（百分比）",
        /// Administrative expenses over total operating income trailing twelve months, percent.
        admin_expenses_to_total_revenue_ttm_percent => "管理费用比营业总收入（TTM）（百分比）",
        /// Financial expenses over total operating income trailing twelve months, percent.
        financial_expenses_to_total_revenue_ttm_percent => "财务费用比营业总收入（TTM）（百分比）",
        /// Impairment losses over total operating income trailing twelve months, percent.
        impairment_losses_to_total_revenue_ttm_percent => "资产减值损失比营业总收入（TTM）（百分比）",
        /// ROE trailing twelve months excluding non-recurring items, percent.
        roe_ex_ttm_percent => "净资产收益率ROETTM（扣非）（百分比）",
        /// ROIC trailing twelve months, percent.
        roic_ttm_percent => "投入资本回报率ROIC（TTM）（百分比）",
        /// Profit over cost and expenses, percent.
        cost_to_profit_ratio_percent => "成本费用利润率（百分比）",
        /// R&D expenses over total operating income, percent.
        r_and_d_expenses_to_revenue_percent => "研发费用比营业总收入（百分比）",
    }
}

report_record! {
    /// Growth ability.
    pub struct FinanceGrowthAbility {
        /// Total assets, year over year, percent.
        total_asset_yoy_growth_rate_percent => "总资产同比增长率（百分比）",
        /// Total operating income, year over year, percent.
        total_revenue_yoy_growth_rate_percent => "营业总收入同比增长率（百分比）",
        /// Operating profit, year over year, percent.
        operating_profit_yoy_growth_rate_percent => "营业利润同比增长率（百分比）",
        /// Total profit, year over year, percent.
        total_profit_yoy_growth_rate_percent => "利润总额同比增长率（百分比）",
        /// Net profit, year over year, percent.
        net_profit_yoy_growth_rate_percent => "净利润同比增长率（百分比）",
        /// Net profit attributable to shareholders, year over year, percent.
        shareholder_net_profit_yoy_growth_rate_percent => "归属母公司股东的净利润同比增长率（百分比）",
        /// Net profit attributable to shareholders excluding non-recurring items, year over year, percent.
        shareholder_net_profit_excl_nonrecurring_yoy_growth_rate_percent => "归属母公司股东的净利润同比增长率（扣非）（百分比）",
        /// Basic EPS, year over year, percent.
        basic_eps_yoy_growth_rate_percent => "基本每股收益同比增长率（百分比）",
        /// Diluted EPS, year over year, percent.
        diluted_eps_yoy_growth_rate_percent => "稀释每股收益同比增长率（百分比）",
        /// Diluted ROE, year over year, percent.
        roe_yoy_growth_rate_diluted_percent => "净资产收益率同比增长率（摊薄）（百分比）",
        /// Net operating cash flow, year over year, percent.
        net_operating_cash_flow_yoy_growth_rate_percent => "经营活动产生的现金流量净额同比增长率（百分比）",
        /// Net operating cash flow per share, year over year, percent.
        net_operating_cash_flow_per_share_yoy_growth_rate_percent => "每股经营活动中产生的现金流量净额同比增长率（百分比）",
        /// Total assets relative to the start of the year, percent.
        total_assets_relative_to_year_begin_growth_rate_percent => "资产总计相对年初增长率（百分比）",
        /// Shareholders' equity relative to the start of the year, percent.
        shareholder_equity_relative_to_year_begin_growth_rate_percent => "归属母公司股东的权益相对年初增长率（百分比）",
        /// Net assets per share relative to the start of the year, percent.
        net_assets_per_share_relative_to_year_begin_growth_rate_percent => "每股净资产相对年初增长率（百分比）",
        /// Operating income, quarter over quarter, percent.
        revenue_qoq_growth_rate_percent => "营业收入环比增长率（百分比）",
        /// Rolling net profit attributable to shareholders, quarter over quarter, percent.
        shareholder_net_profit_rolling_qoq_growth_rate_percent => "归属净利润滚动环比增长（百分比）",
        /// Net profit attributable to shareholders excluding non-recurring items, quarter over quarter, percent.
        shareholder_net_profit_excl_nonrecurring_qoq_growth_rate_percent => "归属母公司股东的净利润环比增长率（扣非）（百分比）",
    }
}

report_record! {
    /// Solvency.
    pub struct FinanceDebtpayingAbility {
        /// Total liabilities over total assets.
        debt_to_asset_ratio => "资产负债率",
        /// Conservative quick ratio.
        conservative_quick_ratio => "保守速动比率",
        /// Liabilities over equity.
        equity_to_debt_ratio => "产权比率",
        /// Shareholders' equity over interest-bearing debt.
        shareholder_equity_to_interest_bearing_debt => "归属母公司股东的权益比带息债务",
        /// Shareholders' equity over total liabilities.
        shareholder_equity_to_total_liabilities => "归属母公司股东的权益比负债合计",
        /// Operating cash flow over interest-bearing debt.
        net_cash_flow_from_operating_activities_to_interest_bearing_debt => "经营活动产生的现金流量净额比带息债务",
        /// Operating cash flow over total liabilities.
        net_cash_flow_from_operating_activities_to_total_liabilities => "经营活动产生的现金流量净额比负债合计",
        /// Operating cash flow over net debt.
        net_cash_flow_from_operating_activities_to_net_debt => "经营活动产生的现金流量净额比净债务",
        /// Operating cash flow over current liabilities.
        net_cash_flow_from_operating_activities_to_current_liabilities => "经营活动产生的现金流量净额比流动负债",
        /// Current ratio.
        current_ratio => "流动比率",
        /// Quick ratio.
        quick_ratio => "速动比率",
        /// Tangible assets over interest-bearing debt.
        tangible_assets_to_interest_bearing_debt => "有形资产比带息债务",
        /// Tangible assets over total liabilities.
        tangible_assets_to_total_liabilities => "有形资产比负债合计",
        /// Tangible assets over net debt.
        tangible_assets_to_net_debt => "有形资产比净债务",
    }
}

report_record! {
    /// Operating efficiency.
    pub struct FinanceOperationalCapability {
        /// Fixed asset turnover.
        fixed_asset_turnover_ratio => "固定资产周转率",
        /// Current asset turnover.
        current_asset_turnover_ratio => "流动资产周转率",
        /// Total asset turnover.
        total_asset_turnover_ratio => "总资产周转率",
        /// Inventory turnover.
        inventory_turnover_ratio => "存货周转率",
        /// Inventory turnover in days.
        inventory_turnover_days => "存货周转天数",
        /// Receivables turnover, notes included.
        accounts_receivable_turnover_ratio => "应收账款周转率（含应收票据）",
        /// Receivables turnover in days, notes included.
        accounts_receivable_turnover_days => "应收账款周转天数（含应收票据）",
        /// Operating cycle in days.
        operating_cycle => "营业周期",
        /// Payables turnover.
        accounts_payable_turnover_ratio => "应付账款周转率",
        /// Payables turnover in days, notes included.
        accounts_payable_turnover_days => "应付账款周转天数（含应付票据）",
    }
}

report_record! {
    /// Capital structure.
    pub struct FinanceCapitalStructure {
        /// Current assets over total assets, percent.
        current_assets_to_total_assets => "流动资产比总资产（百分比）",
        /// Non-current assets over total assets, percent.
        non_current_assets_to_total_assets => "非流动资产比总资产（百分比）",
        /// Tangible assets over total assets, percent.
        tangible_assets_to_total_assets => "有形资产比总资产（百分比）",
        /// Shareholders' equity over invested capital, percent.
        equity_to_total_capital => "归属母公司股东的权益比全部投入资本（百分比）",
        /// Interest-bearing liabilities over invested capital, percent.
        interest_bearing_liabilities_to_total_capital => "带息负债比全部投入资本（百分比）",
        /// Current liabilities over total liabilities, percent.
        current_liabilities_to_total_liabilities => "流动负债比负债合计（百分比）",
        /// Non-current liabilities over total liabilities, percent.
        non_current_liabilities_to_total_liabilities => "非流动负债比负债合计（百分比）",
        /// Interest-bearing debt ratio, percent.
        interest_bearing_debt_ratio => "有息负债率（百分比）",
    }
}

report_record! {
    /// Cash position.
    pub struct FinanceCashposition {
        /// Cash from sales over operating income.
        cash_sales_to_revenue => "销售商品提供劳务收到的现金比营业收入",
        /// Operating cash flow over operating income.
        op_cash_to_revenue => "经营活动产生的现金流量净额比营业收入",
        /// Operating cash flow over net operating income.
        op_cash_to_income => "经营活动产生的现金流量净额比经营活动净收益",
        /// Capital expenditure over depreciation and amortization.
        capex_to_depr => "资本支出比折旧摊销",
        /// Cash from sales over operating income, trailing twelve months.
        cash_sales_to_revenue_ttm => "销售商品提供劳务收到的现金比营业收入（TTM）",
        /// Operating cash flow over operating income, trailing twelve months.
        op_cash_to_revenue_ttm => "经营活动产生的现金流量净额比营业收入（TTM）",
        /// Operating cash flow over net operating income, trailing twelve months.
        op_cash_to_income_ttm => "经营活动产生的现金流量净额比经营活动净收益（TTM）",
        /// Operating cash flow over total operating income.
        op_cash_to_total_revenue => "经营活动产生的现金流量净额比营业总收入",
        /// Operating cash flow over net profit.
        op_cash_to_net_profit => "经营活动产生的现金流量净额比净利润",
    }
}

report_record! {
    /// Earnings quality.
    pub struct FinanceRevenueQuality {
        /// Net non-operating income and expenses.
        net_non_operating_income_and_expenses => "营业外收支净额",
        /// Net operating income over total profit.
        operating_income_to_total_profit => "经营活动净收益比利润总额",
        /// Fair value changes over total profit.
        value_change_net_income_to_total_profit => "价值变动净收益比利润总额",
        /// Net non-operating income over total profit.
        non_operating_income_to_total_profit => "营业外收支净额比利润总额",
        /// Income tax over total profit.
        income_tax_to_total_profit => "所得税比利润总额",
        /// Net profit excluding non-recurring items over net profit.
        net_profit_excluding_non_recurring_gains_and_losses_to_net_profit => "扣除非经常性损益的净利润比净利润",
        /// Net operating income over total profit, trailing twelve months.
        operating_income_to_total_profit_ttm => "经营活动净收益比利润总额（TTM）",
        /// Fair value changes over total profit, trailing twelve months.
        value_change_net_income_to_total_profit_ttm => "价值变动净收益比利润总额（TTM）",
        /// Net non-operating income over total profit, trailing twelve months.
        non_operating_income_to_total_profit_ttm => "营业外收支净额比利润总额（TTM）",
    }
}

/// Financial ratios endpoint.
pub const FINANCIAL_RATIOS: EndpointSpec = EndpointSpec {
    model: "FinancialRatios",
    description: "Financial ratios.",
    periods: STATEMENT_PERIODS,
    default_period: Period::Annual,
    table: FactTable::Quarterly,
    multi_symbol: false,
    fiscal_annotation: false,
    normalization: Normalization::STATEMENT,
};

pub(crate) const fn breakdown(
    model: &'static str,
    description: &'static str,
    periods: &'static [Period],
) -> EndpointSpec {
    EndpointSpec {
        model,
        description,
        periods,
        default_period: Period::Fy,
        table: FactTable::Quarterly,
        multi_symbol: true,
        fiscal_annotation: false,
        normalization: Normalization::NONE,
    }
}

/// Profitability endpoint.
pub const FINANCE_PROFIT_ABILITY: EndpointSpec =
    breakdown("FinanceProfitAbility", "Profitability ratios.", FISCAL_PERIODS);

/// Growth ability endpoint.
pub const FINANCE_GROWTH_ABILITY: EndpointSpec =
    breakdown("FinanceGrowthAbility", "Growth rates.", FISCAL_PERIODS);

/// Solvency endpoint.
pub const FINANCE_DEBTPAYING_ABILITY: EndpointSpec =
    breakdown("FinanceDebtpayingAbility", "Solvency ratios.", QUARTER_PERIODS);

/// Operating efficiency endpoint.
pub const FINANCE_OPERATIONAL_CAPABILITY: EndpointSpec =
    breakdown("FinanceOperationalCapability", "Turnover ratios.", FISCAL_PERIODS);

/// Capital structure endpoint.
pub const FINANCE_CAPITAL_STRUCTURE: EndpointSpec =
    breakdown("FinanceCapitalStructure", "Capital structure ratios.", QUARTER_PERIODS);

/// Cash position endpoint.
pub const FINANCE_CASHPOSITION: EndpointSpec =
    breakdown("FinanceCashposition", "Cash position ratios.", FISCAL_PERIODS);

/// Earnings quality endpoint.
pub const FINANCE_REVENUE_QUALITY: EndpointSpec =
    breakdown("FinanceRevenueQuality", "Earnings quality ratios.", FISCAL_PERIODS);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::FactorFetcher;
    use polars::prelude::*;
    use serde_json::json;
    use xiaoyuan_core::{FactorRecord, Fetcher, XiaoYuanConfig};
    use xiaoyuan_reader::InMemoryReader;

    #[tokio::test]
    async fn test_financial_ratios_request_fetched_names() {
        let frame = DataFrame::new(vec![
            Column::new("报告期".into(), vec!["2023-12-31"]),
            Column::new("symbol".into(), vec!["SH600519"]),
            Column::new("应收账款周转天数（含应收票据）".into(), vec![0.0]),
            Column::new("投入资本回报率ROIC（百分比）".into(), vec![34.2]),
        ])
        .unwrap();
        let reader = InMemoryReader::new().with_response("cn_finance_factors_1Q", frame);
        let fetcher = FactorFetcher::<FinancialRatios>::new(FINANCIAL_RATIOS, &XiaoYuanConfig::default());

        let records = fetcher
            .fetch_data(&json!({"symbol": "SH600519"}), &reader)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].days_of_sales_outstanding, None);
        assert_eq!(records[0].return_on_capital_employed, Some(34.2));

        let queries = reader.queries().await;
        for alias in FinancialRatios::ALIASES.entries() {
            assert!(queries[0].contains(alias.factor), "missing {}", alias.factor);
        }
    }

    #[tokio::test]
    async fn test_breakdown_keeps_zero_across_symbols() {
        let frame = DataFrame::new(vec![
            Column::new("报告期".into(), vec!["2023-12-31", "2023-12-31", "2022-12-31"]),
            Column::new("symbol".into(), vec!["SZ000001", "SH600519", "SH600519"]),
            Column::new("资产负债率".into(), vec![91.5, 0.0, 19.4]),
        ])
        .unwrap();
        let reader = InMemoryReader::new().with_response("资产负债率", frame);
        let fetcher = FactorFetcher::<FinanceDebtpayingAbility>::new(
            FINANCE_DEBTPAYING_ABILITY,
            &XiaoYuanConfig::default(),
        );

        let records = fetcher
            .fetch_data(&json!({"symbol": "SH600519,SZ000001", "period": "annual"}), &reader)
            .await
            .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].symbol.as_str(), "SH600519");
        assert_eq!(records[0].debt_to_asset_ratio, Some(0.0));
        assert_eq!(records[1].symbol.as_str(), "SZ000001");
        assert_eq!(records[2].debt_to_asset_ratio, Some(19.4));

        let queries = reader.queries().await;
        assert!(queries[0].contains("[\"SH600519\", \"SZ000001\"]"));
    }

    #[tokio::test]
    async fn test_breakdown_period_sets() {
        let reader = InMemoryReader::new();
        let config = XiaoYuanConfig::default();

        let profit = FactorFetcher::<FinanceProfitAbility>::new(FINANCE_PROFIT_ABILITY, &config);
        let err = profit
            .fetch_data(&json!({"symbol": "SH600519", "period": "q2"}), &reader)
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let capital = FactorFetcher::<FinanceCapitalStructure>::new(FINANCE_CAPITAL_STRUCTURE, &config);
        let err = capital
            .fetch_data(&json!({"symbol": "SH600519", "period": "q2ytd"}), &reader)
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = capital
            .fetch_data(&json!({"symbol": "SH600519", "period": "q2"}), &reader)
            .await
            .unwrap_err();
        assert!(err.is_empty_data());
        let queries = reader.queries().await;
        assert!(queries[0].contains("monthOfYear(报告期) = 6"));
        assert!(queries[0].contains("limit 4"));
    }
}
