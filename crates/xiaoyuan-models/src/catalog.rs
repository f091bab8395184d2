//! Field to factor alias tables of every typed endpoint, by model name.

use xiaoyuan_core::{AliasTable, FactorRecord};

use crate::growth::{BalanceSheetGrowth, CashFlowStatementGrowth, IncomeStatementGrowth};
use crate::indicators::{
    DuPontAnalysis, EnterpriseLifeCycle, FinancialDerivative, FinancialTTMIndicators,
    PerShareIndicator,
};
use crate::market::{EquityHistorical, EquityPledge, HistoricalMarketCap, ReductionPercentage};
use crate::metrics::KeyMetrics;
use crate::ratios::{
    FinanceCapitalStructure, FinanceCashposition, FinanceDebtpayingAbility, FinanceGrowthAbility,
    FinanceOperationalCapability, FinanceProfitAbility, FinanceRevenueQuality, FinancialRatios,
};
use crate::statements::{BalanceSheet, CashFlowStatement, IncomeStatement};

/// Alias tables keyed by model name.
pub const ALIAS_TABLES: &[(&str, AliasTable)] = &[
    ("BalanceSheet", BalanceSheet::ALIASES),
    ("IncomeStatement", IncomeStatement::ALIASES),
    ("CashFlowStatement", CashFlowStatement::ALIASES),
    ("BalanceSheetGrowth", BalanceSheetGrowth::ALIASES),
    ("IncomeStatementGrowth", IncomeStatementGrowth::ALIASES),
    ("CashFlowStatementGrowth", CashFlowStatementGrowth::ALIASES),
    ("FinancialRatios", FinancialRatios::ALIASES),
    ("FinanceProfitAbility", FinanceProfitAbility::ALIASES),
    ("FinanceGrowthAbility", FinanceGrowthAbility::ALIASES),
    ("FinanceDebtpayingAbility", FinanceDebtpayingAbility::ALIASES),
    ("FinanceOperationalCapability", FinanceOperationalCapability::ALIASES),
    ("FinanceCapitalStructure", FinanceCapitalStructure::ALIASES),
    ("FinanceCashposition", FinanceCashposition::ALIASES),
    ("FinanceRevenueQuality", FinanceRevenueQuality::ALIASES),
    ("FinancialTTMIndicators", FinancialTTMIndicators::ALIASES),
    ("PerShareIndicator", PerShareIndicator::ALIASES),
    ("FinancialDerivative", FinancialDerivative::ALIASES),
    ("DuPontAnalysis", DuPontAnalysis::ALIASES),
    ("EnterpriseLifeCycle", EnterpriseLifeCycle::ALIASES),
    ("HistoricalMarketCap", HistoricalMarketCap::ALIASES),
    ("EquityPledge", EquityPledge::ALIASES),
    ("ReductionPercentage", ReductionPercentage::ALIASES),
    ("EquityHistorical", EquityHistorical::ALIASES),
    ("KeyMetrics", KeyMetrics::ALIASES),
];

/// The alias table of a model, if it has one.
#[must_use]
pub fn alias_table(model: &str) -> Option<AliasTable> {
    ALIAS_TABLES
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, table)| *table)
}
