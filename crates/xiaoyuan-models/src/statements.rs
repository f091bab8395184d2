//! Balance sheet, income statement and cash flow statement.
//!
//! Statement line items reported as exactly zero are treated as not reported.

use xiaoyuan_core::period::STATEMENT_PERIODS;
use xiaoyuan_core::{FactTable, Normalization, Period, report_record};

use crate::endpoint::EndpointSpec;

report_record! {
    /// Balance sheet line items.
    pub struct BalanceSheet {
        /// Accounts receivable.
        accounts_receivable => "应收账款",
        /// Prepaid expenses.
        prepaid_expenses => "预付款项",
        /// Inventory.
        inventory => "存货",
        /// Other current assets.
        other_current_assets => "其他流动资产",
        /// Total current assets.
        total_current_assets => "流动资产合计",
        /// Fixed assets, gross.
        plant_property_equipment_gross => "固定资产",
        /// Intangible assets.
        intangible_assets => "无形资产",
        /// Goodwill.
        goodwill => "商誉",
        /// Other non-current assets.
        other_non_current_assets => "其他非流动资产",
        /// Total non-current assets.
        total_non_current_assets => "非流动资产合计",
        /// Total assets.
        total_assets => "资产总计",
        /// Accounts payable.
        accounts_payable => "应付账款",
        /// Accrued interest payable.
        accrued_interest_payable => "应付利息",
        /// Other current liabilities.
        other_current_liabilities => "其他流动负债",
        /// Total current liabilities.
        total_current_liabilities => "流动负债合计",
        /// Other non-current liabilities.
        other_non_current_liabilities => "其他非流动负债",
        /// Total non-current liabilities.
        total_non_current_liabilities => "非流动负债合计",
        /// Total liabilities.
        total_liabilities => "负债合计",
        /// Minority interest.
        minority_interest => "少数股东权益",
        /// Total shareholders' equity.
        total_shareholders_equity => "股东权益合计",
        /// Total liabilities and shareholders' equity.
        total_liabilities_and_shareholders_equity => "负债和股东权益合计",
        /// Dividends payable.
        dividends_payable => "应付股利",
        /// Treasury stock.
        treasury_stock => "减：库存股",
        /// Accumulated other comprehensive income.
        accumulated_other_comprehensive_income => "其他综合收益",
        /// Net debt.
        net_debt => "净债务",
    }
}

report_record! {
    /// Income statement line items.
    pub struct IncomeStatement {
        /// Total operating income.
        total_operating_income => "营业总收入",
        /// Total operating expenses.
        total_operating_expenses => "营业总成本",
        /// Cost of revenue.
        operating_cost_of_revenue => "营业成本",
        /// Research and development expense.
        research_and_development_expense => "研发费用",
        /// Basic earnings per share.
        basic_earnings_per_share => "每股收益",
        /// Diluted earnings per share.
        diluted_earnings_per_share => "稀释每股收益",
        /// Total comprehensive income.
        total_comprehensive_income => "综合收益总额",
        /// Interest income.
        interest_income => "其中：利息收入",
        /// Total interest expense.
        total_interest_expense => "利息支出",
        /// Other income.
        other_income => "其他收益",
        /// Net income from continuing operations.
        net_income_continuing_operations => "持续经营净利润",
        /// Net income from discontinued operations.
        net_income_discontinued_operations => "终止经营净利润",
        /// EBITDA.
        ebitda => "息税折旧摊销前利润",
        /// Depreciation and amortization.
        depreciation_and_amortization => "折旧与摊销",
    }
}

report_record! {
    /// Cash flow statement line items.
    pub struct CashFlowStatement {
        /// Net cash from operating activities.
        net_cash_from_operating_activities => "经营活动产生的现金流量净额",
        /// Net cash from investing activities.
        net_cash_from_investing_activities => "投资活动产生的现金流量净额",
        /// Cash received from issuing debt.
        issuance_of_debt => "发行债券收到的现金",
        /// Cash paid to repay debt.
        repayment_of_debt => "偿还债务支付的现金",
        /// Net cash from financing activities.
        net_cash_from_financing_activities => "筹资活动产生的现金流量净额",
        /// Depreciation and amortization.
        depreciation_and_amortization => "折旧与摊销",
    }
}

const fn statement(model: &'static str, description: &'static str) -> EndpointSpec {
    EndpointSpec {
        model,
        description,
        periods: STATEMENT_PERIODS,
        default_period: Period::Annual,
        table: FactTable::Quarterly,
        multi_symbol: false,
        fiscal_annotation: true,
        normalization: Normalization::STATEMENT,
    }
}

/// Balance sheet endpoint.
pub const BALANCE_SHEET: EndpointSpec = statement("BalanceSheet", "Balance sheet statement.");

/// Income statement endpoint.
pub const INCOME_STATEMENT: EndpointSpec = statement("IncomeStatement", "Income statement.");

/// Cash flow statement endpoint.
pub const CASH_FLOW_STATEMENT: EndpointSpec =
    statement("CashFlowStatement", "Cash flow statement.");
