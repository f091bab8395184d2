//! Fiscal period tokens and the query fragments they map to.
//!
//! Each endpoint accepts its own closed set of [`Period`] tokens. A [`PeriodFilter`]
//! turns an accepted token and an optional row limit into the filter/ordering fragment
//! appended to a finance factor query.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DataError, Result};
use crate::query::REPORT_PERIOD;

/// Period token accepted by fundamental endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Year-end reports.
    Annual,
    /// Latest reports of any kind.
    Ytd,
    /// Latest quarterly reports of any kind.
    Quarter,
    /// Latest fiscal reports of any kind.
    Fy,
    /// First quarter reports.
    Q1,
    /// Second quarter reports.
    Q2,
    /// Third quarter reports.
    Q3,
    /// Fourth quarter (year-end) reports.
    Q4,
    /// Half-year cumulative reports.
    Q2Ytd,
    /// Nine-month cumulative reports.
    Q3Ytd,
}

impl Period {
    /// All tokens, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Annual,
        Self::Ytd,
        Self::Quarter,
        Self::Fy,
        Self::Q1,
        Self::Q2,
        Self::Q3,
        Self::Q4,
        Self::Q2Ytd,
        Self::Q3Ytd,
    ];

    /// The lowercase token for this period.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Ytd => "ytd",
            Self::Quarter => "quarter",
            Self::Fy => "fy",
            Self::Q1 => "q1",
            Self::Q2 => "q2",
            Self::Q3 => "q3",
            Self::Q4 => "q4",
            Self::Q2Ytd => "q2ytd",
            Self::Q3Ytd => "q3ytd",
        }
    }

    /// Report month selected by this period, `None` when unfiltered by month.
    #[must_use]
    pub const fn report_month(&self) -> Option<u32> {
        match self {
            Self::Annual | Self::Q4 => Some(12),
            Self::Q1 => Some(3),
            Self::Q2 | Self::Q2Ytd => Some(6),
            Self::Q3 | Self::Q3Ytd => Some(9),
            Self::Ytd | Self::Quarter | Self::Fy => None,
        }
    }

    /// Parses `token` and checks it against an endpoint's accepted set.
    ///
    /// A missing token resolves to `default`.
    pub fn parse_accepted(token: Option<&str>, accepted: &[Self], default: Self) -> Result<Self> {
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(default);
        };
        let unsupported = || DataError::UnsupportedPeriod {
            period: token.to_string(),
            accepted: accepted
                .iter()
                .map(Self::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        };
        let period: Self = token.parse().map_err(|_| unsupported())?;
        if accepted.contains(&period) {
            Ok(period)
        } else {
            Err(unsupported())
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| DataError::InvalidParameter(format!("unknown period '{s}'")))
    }
}

/// Statement endpoints: balance sheet, income, cash flow and ratios.
pub const STATEMENT_PERIODS: &[Period] = &[Period::Annual, Period::Ytd];
/// Income statement growth.
pub const GROWTH_PERIODS: &[Period] = &[Period::Annual, Period::Quarter];
/// Fiscal-indicator endpoints reporting cumulative half and nine-month figures.
pub const FISCAL_PERIODS: &[Period] = &[
    Period::Fy,
    Period::Q1,
    Period::Q2Ytd,
    Period::Q3Ytd,
    Period::Annual,
];
/// Fiscal-indicator endpoints reporting plain quarters.
pub const QUARTER_PERIODS: &[Period] = &[
    Period::Fy,
    Period::Q1,
    Period::Q2,
    Period::Q3,
    Period::Annual,
];
/// Endpoints backed by the annual fact table.
pub const ANNUAL_PERIODS: &[Period] = &[Period::Fy, Period::Annual];

/// Default number of periods kept when a month filter applies.
pub const DEFAULT_MONTH_LIMIT: usize = 4;
/// Default number of periods kept without a month filter.
pub const DEFAULT_LATEST_LIMIT: usize = 1;
/// Largest accepted limit: fifty years of quarterly reports.
pub const MAX_LIMIT: usize = 200;

/// Filter and ordering fragment for one period selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodFilter {
    month: Option<u32>,
    limit: usize,
}

impl PeriodFilter {
    /// Builds the filter for a period, falling back to the default limit for its variant.
    pub fn new(period: Period, limit: Option<usize>) -> Result<Self> {
        let month = period.report_month();
        let limit = match limit {
            Some(0) => {
                return Err(DataError::InvalidParameter(
                    "limit must be at least 1".into(),
                ));
            }
            Some(n) if n > MAX_LIMIT => {
                return Err(DataError::InvalidParameter(format!(
                    "limit {n} exceeds the maximum of {MAX_LIMIT}"
                )));
            }
            Some(n) => n,
            None if month.is_some() => DEFAULT_MONTH_LIMIT,
            None => DEFAULT_LATEST_LIMIT,
        };
        Ok(Self { month, limit })
    }

    /// Parses a token against an accepted set and builds its filter in one step.
    pub fn parse(
        token: Option<&str>,
        accepted: &[Period],
        default: Period,
        limit: Option<usize>,
    ) -> Result<Self> {
        Self::new(Period::parse_accepted(token, accepted, default)?, limit)
    }

    /// Latest `limit` reports regardless of month.
    #[must_use]
    pub const fn latest(limit: usize) -> Self {
        Self { month: None, limit }
    }

    /// Report month selected, if any.
    #[must_use]
    pub const fn month(&self) -> Option<u32> {
        self.month
    }

    /// Periods kept per symbol.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Renders the fragment appended after the `where` clause of a finance query.
    #[must_use]
    pub fn render(&self) -> String {
        let month = self
            .month
            .map(|m| format!(" and monthOfYear({REPORT_PERIOD}) = {m}"))
            .unwrap_or_default();
        format!(
            "{month} context by symbol, factor_name csort {REPORT_PERIOD} desc limit {}",
            self.limit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_SETS: [&[Period]; 5] = [
        STATEMENT_PERIODS,
        GROWTH_PERIODS,
        FISCAL_PERIODS,
        QUARTER_PERIODS,
        ANNUAL_PERIODS,
    ];

    #[test]
    fn test_every_accepted_token_renders_fragment() {
        for set in ALL_SETS {
            for period in set {
                let filter =
                    PeriodFilter::parse(Some(period.as_str()), set, set[0], None).unwrap();
                let fragment = filter.render();
                assert!(!fragment.trim().is_empty());
                assert!(fragment.contains("context by symbol, factor_name"));
                assert!(fragment.contains(&format!("csort {REPORT_PERIOD} desc")));
                assert!(fragment.trim_end().ends_with(&format!("limit {}", filter.limit())));
            }
        }
    }

    #[test]
    fn test_unsupported_token_is_invalid_argument() {
        let err = PeriodFilter::parse(Some("q1"), STATEMENT_PERIODS, Period::Annual, None)
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(matches!(err, DataError::UnsupportedPeriod { .. }));

        let err = PeriodFilter::parse(Some("monthly"), FISCAL_PERIODS, Period::Fy, None)
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_month_mapping() {
        assert_eq!(Period::Annual.report_month(), Some(12));
        assert_eq!(Period::Q1.report_month(), Some(3));
        assert_eq!(Period::Q2.report_month(), Some(6));
        assert_eq!(Period::Q2Ytd.report_month(), Some(6));
        assert_eq!(Period::Q3Ytd.report_month(), Some(9));
        assert_eq!(Period::Fy.report_month(), None);
        assert_eq!(Period::Ytd.report_month(), None);
    }

    #[test]
    fn test_default_limits() {
        let annual = PeriodFilter::new(Period::Annual, None).unwrap();
        assert_eq!(annual.limit(), DEFAULT_MONTH_LIMIT);
        assert_eq!(
            annual.render(),
            " and monthOfYear(报告期) = 12 context by symbol, factor_name csort 报告期 desc limit 4"
        );

        let ytd = PeriodFilter::new(Period::Ytd, None).unwrap();
        assert_eq!(ytd.limit(), DEFAULT_LATEST_LIMIT);
        assert_eq!(
            ytd.render(),
            " context by symbol, factor_name csort 报告期 desc limit 1"
        );
    }

    #[test]
    fn test_explicit_limit_overrides_default() {
        let filter = PeriodFilter::new(Period::Fy, Some(8)).unwrap();
        assert_eq!(filter.limit(), 8);
        assert!(filter.render().ends_with("limit 8"));
        assert!(PeriodFilter::new(Period::Annual, Some(0)).is_err());
    }

    #[test]
    fn test_limit_upper_bound() {
        let filter = PeriodFilter::new(Period::Ytd, Some(MAX_LIMIT)).unwrap();
        assert_eq!(filter.limit(), MAX_LIMIT);
        let err = PeriodFilter::new(Period::Ytd, Some(MAX_LIMIT + 1)).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_missing_token_uses_default() {
        let period = Period::parse_accepted(None, FISCAL_PERIODS, Period::Fy).unwrap();
        assert_eq!(period, Period::Fy);
        let period = Period::parse_accepted(Some("ANNUAL"), STATEMENT_PERIODS, Period::Ytd).unwrap();
        assert_eq!(period, Period::Annual);
    }

    #[test]
    fn test_period_serde_tokens() {
        let json = serde_json::to_string(&Period::Q2Ytd).unwrap();
        assert_eq!(json, "\"q2ytd\"");
        let period: Period = serde_json::from_str("\"annual\"").unwrap();
        assert_eq!(period, Period::Annual);
    }
}
