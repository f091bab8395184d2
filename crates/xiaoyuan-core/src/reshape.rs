//! Value normalization and ordering of pivoted records.

use serde::{Deserialize, Serialize};

use crate::types::{PivotedRecord, Symbol};

/// How literal zero values are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZeroPolicy {
    /// Zero is a real value.
    #[default]
    Keep,
    /// Zero means the line item was not reported and becomes null.
    Null,
}

/// Scale applied to stored values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueScale {
    /// Values are used as stored.
    #[default]
    Unit,
    /// Values are stored as percentages and divided by 100.
    Percent,
}

/// Per-endpoint value normalization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Normalization {
    /// Treatment of zero.
    pub zero: ZeroPolicy,
    /// Value scale.
    pub scale: ValueScale,
}

impl Normalization {
    /// Values pass through unchanged.
    pub const NONE: Self = Self {
        zero: ZeroPolicy::Keep,
        scale: ValueScale::Unit,
    };

    /// Statement line items: zero means not reported.
    pub const STATEMENT: Self = Self {
        zero: ZeroPolicy::Null,
        scale: ValueScale::Unit,
    };

    /// Growth rates: zero means not reported, percentages become fractions.
    pub const GROWTH: Self = Self {
        zero: ZeroPolicy::Null,
        scale: ValueScale::Percent,
    };

    /// Normalizes one value.
    #[must_use]
    pub fn apply(&self, value: Option<f64>) -> Option<f64> {
        let value = match self.zero {
            ZeroPolicy::Null => zero_to_null(value),
            ZeroPolicy::Keep => value,
        };
        match self.scale {
            ValueScale::Unit => value,
            ValueScale::Percent => value.map(|v| v / 100.0),
        }
    }

    /// Normalizes every value of a record in place.
    pub fn apply_record(&self, record: &mut PivotedRecord) {
        if *self == Self::NONE {
            return;
        }
        for value in record.values.values_mut() {
            *value = self.apply(*value);
        }
    }
}

/// Maps an exact zero to null.
#[must_use]
pub fn zero_to_null(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

/// Sorts records by date descending, then symbol.
pub fn sort_by_period_desc(records: &mut [PivotedRecord]) {
    records.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.symbol.cmp(&b.symbol)));
}

/// Keeps the first `limit` records of each symbol, preserving order.
#[must_use]
pub fn limit_per_symbol(records: Vec<PivotedRecord>, limit: usize) -> Vec<PivotedRecord> {
    let mut seen: Vec<(Symbol, usize)> = Vec::new();
    records
        .into_iter()
        .filter(|record| {
            match seen.iter_mut().find(|(symbol, _)| *symbol == record.symbol) {
                Some((_, count)) if *count >= limit => false,
                Some((_, count)) => {
                    *count += 1;
                    true
                }
                None => {
                    seen.push((record.symbol.clone(), 1));
                    limit > 0
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn record(symbol: &str, y: i32, m: u32, d: u32) -> PivotedRecord {
        PivotedRecord::new(Symbol::new(symbol), NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_zero_to_null() {
        assert_eq!(zero_to_null(Some(0.0)), None);
        assert_eq!(zero_to_null(Some(-0.0)), None);
        assert_eq!(zero_to_null(Some(1.5)), Some(1.5));
        assert_eq!(zero_to_null(None), None);
    }

    #[test]
    fn test_statement_normalization_nulls_zero_only() {
        let mut rec = record("SH600519", 2023, 12, 31);
        rec.set("商誉", Some(0.0));
        rec.set("存货", Some(4.6e10));
        Normalization::STATEMENT.apply_record(&mut rec);
        assert_eq!(rec.value("商誉"), None);
        assert_eq!(rec.value("存货"), Some(4.6e10));
    }

    #[test]
    fn test_keep_policy_retains_zero() {
        let mut rec = record("SH600519", 2023, 12, 31);
        rec.set("权益乘数（杜邦分析）", Some(0.0));
        Normalization::NONE.apply_record(&mut rec);
        assert_eq!(rec.value("权益乘数（杜邦分析）"), Some(0.0));
        assert!(rec.values.contains_key("权益乘数（杜邦分析）"));
    }

    #[test]
    fn test_growth_normalization_scales_percent() {
        assert_eq!(Normalization::GROWTH.apply(Some(15.0)), Some(0.15));
        assert_eq!(Normalization::GROWTH.apply(Some(0.0)), None);
        assert_eq!(Normalization::GROWTH.apply(None), None);
    }

    #[test]
    fn test_sort_by_period_desc() {
        let mut records = vec![
            record("SH600519", 2021, 12, 31),
            record("SH600519", 2023, 12, 31),
            record("SH600519", 2022, 12, 31),
        ];
        sort_by_period_desc(&mut records);
        let dates: Vec<String> = records.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2023-12-31", "2022-12-31", "2021-12-31"]);
    }

    #[test]
    fn test_limit_per_symbol() {
        let mut records = vec![
            record("SH600519", 2023, 12, 31),
            record("SZ000001", 2023, 12, 31),
            record("SH600519", 2022, 12, 31),
            record("SH600519", 2021, 12, 31),
            record("SZ000001", 2022, 12, 31),
        ];
        sort_by_period_desc(&mut records);
        let kept = limit_per_symbol(records, 2);
        assert_eq!(kept.len(), 4);
        assert_eq!(
            kept.iter().filter(|r| r.symbol.as_str() == "SH600519").count(),
            2
        );
        assert!(kept.iter().all(|r| r.date.year() >= 2022));
    }
}
