//! Caller parameters shared by the endpoints.

use chrono::{Days, NaiveDate, Utc};
use serde::Deserialize;
use xiaoyuan_core::{DataError, Result};

/// Parameters of report-period endpoints.
#[derive(Clone, Debug, Deserialize)]
pub struct FundamentalParams {
    /// One symbol or a comma-joined list.
    pub symbol: String,
    /// Period token; the endpoint default applies when absent.
    #[serde(default)]
    pub period: Option<String>,
    /// Number of periods to return per symbol.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Parameters of endpoints reading a window of trading days.
#[derive(Clone, Debug, Deserialize)]
pub struct WindowParams {
    /// One symbol or a comma-joined list.
    pub symbol: String,
    /// First day of the window.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Last day of the window, today when absent.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Parameters of endpoints that span the whole market.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CalendarParams {
    /// First day of the window, today when absent.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Last day of the window.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// An inclusive date window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    /// First day, inclusive.
    pub start: NaiveDate,
    /// Last day, inclusive.
    pub end: NaiveDate,
}

impl DateWindow {
    /// Creates a window, rejecting one that ends before it starts.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DataError::InvalidParameter(format!(
                "start_date {start} is after end_date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Window ending at `end` (default today) and starting at `start`, or `lookback`
    /// applied to the end date.
    pub fn looking_back(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        lookback: impl FnOnce(NaiveDate) -> NaiveDate,
    ) -> Result<Self> {
        let end = end.unwrap_or_else(today);
        Self::new(start.unwrap_or_else(|| lookback(end)), end)
    }

    /// Window starting at `start` (default today) and spanning `days` unless `end` is given.
    pub fn looking_ahead(start: Option<NaiveDate>, end: Option<NaiveDate>, days: u64) -> Result<Self> {
        let start = start.unwrap_or_else(today);
        let end = match end {
            Some(end) => end,
            None => start
                .checked_add_days(Days::new(days))
                .ok_or_else(|| DataError::InvalidParameter(format!("window of {days} days from {start}")))?,
        };
        Self::new(start, end)
    }

    /// Returns true if `date` falls in the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Today's date.
#[must_use]
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use xiaoyuan_core::config::months_before;
    use xiaoyuan_core::parse_params;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_defaults() {
        let window =
            DateWindow::looking_back(None, Some(date(2024, 6, 30)), |end| months_before(end, 12))
                .unwrap();
        assert_eq!(window.start, date(2023, 6, 30));
        assert!(window.contains(date(2024, 1, 1)));
        assert!(!window.contains(date(2024, 7, 1)));

        let window = DateWindow::looking_ahead(Some(date(2024, 1, 1)), None, 30).unwrap();
        assert_eq!(window.end, date(2024, 1, 31));
    }

    #[test]
    fn test_inverted_window_rejected() {
        let err = DateWindow::new(date(2024, 2, 1), date(2024, 1, 1)).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_params_deserialize() {
        let params: WindowParams = parse_params(&serde_json::json!({
            "symbol": "SH600519",
            "start_date": "2024-01-01",
        }))
        .unwrap();
        assert_eq!(params.start_date, Some(date(2024, 1, 1)));
        assert_eq!(params.end_date, None);

        let err = parse_params::<FundamentalParams>(&serde_json::json!({
            "symbol": "SH600519",
            "limit": -1,
        }))
        .unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
