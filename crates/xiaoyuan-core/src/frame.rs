//! Conversions between store result frames and pivoted records.
//!
//! Result frames arrive in one of two shapes:
//!
//! - wide, already pivoted by the store: a date key column, `symbol`, and one column
//!   per factor (see [`pivoted_records`])
//! - long: `timestamp`, `symbol`, `factor_name`, `value` and optionally `报告期`
//!   (see [`factor_rows`] and [`pivot_rows`])
//!
//! Date columns may be typed dates, datetimes, or strings in `2024-01-31` or
//! `2024.01.31` form.

use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::debug;

use crate::alias::AliasTable;
use crate::error::{DataError, Result};
use crate::query::{FISCAL_PERIOD, FISCAL_YEAR, REPORT_PERIOD, TIMESTAMP};
use crate::types::{FactorRow, PivotedRecord, Symbol};

/// Fails with [`DataError::EmptyData`] when the frame has no rows.
pub fn ensure_not_empty(frame: DataFrame, what: impl Display) -> Result<DataFrame> {
    if frame.height() == 0 {
        return Err(DataError::EmptyData(what.to_string()));
    }
    Ok(frame)
}

/// Parses a store date string.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let head = s.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(head, "%Y.%m.%d"))
        .ok()
}

fn has_column(frame: &DataFrame, name: &str) -> bool {
    frame.column(name).is_ok()
}

fn series(frame: &DataFrame, name: &str, dtype: &DataType) -> Result<Series> {
    let column = frame
        .column(name)
        .map_err(|_| DataError::Parse(format!("result has no column '{name}'")))?;
    Ok(column.as_materialized_series().cast(dtype)?)
}

/// Reads a date column.
pub fn date_column(frame: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>> {
    let values = series(frame, name, &DataType::String)?;
    Ok(values.str()?.into_iter().map(|v| v.and_then(parse_date)).collect())
}

/// Reads a string column.
pub fn string_column(frame: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let values = series(frame, name, &DataType::String)?;
    Ok(values
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Reads a numeric column as `f64`. NaN is read as null.
pub fn f64_column(frame: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let values = series(frame, name, &DataType::Float64)?;
    Ok(values
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

fn i32_column(frame: &DataFrame, name: &str) -> Result<Vec<Option<i32>>> {
    let values = series(frame, name, &DataType::Int32)?;
    Ok(values.i32()?.into_iter().collect())
}

/// Reads a frame pivoted by the store into records keyed by `key` and `symbol`.
///
/// Each factor in `factors` becomes one value per record. A factor whose column is
/// absent from the frame is recorded as null for every row. Rows without a symbol or
/// key date are skipped.
pub fn pivoted_records(
    frame: &DataFrame,
    key: &str,
    factors: &[&str],
) -> Result<Vec<PivotedRecord>> {
    let dates = date_column(frame, key)?;
    let symbols = string_column(frame, "symbol")?;
    let fiscal_periods = if has_column(frame, FISCAL_PERIOD) {
        Some(string_column(frame, FISCAL_PERIOD)?)
    } else {
        None
    };
    let fiscal_years = if has_column(frame, FISCAL_YEAR) {
        Some(i32_column(frame, FISCAL_YEAR)?)
    } else {
        None
    };

    let mut columns = Vec::with_capacity(factors.len());
    for factor in factors {
        if has_column(frame, factor) {
            columns.push((*factor, Some(f64_column(frame, factor)?)));
        } else {
            debug!(factor, "Factor column missing from result");
            columns.push((*factor, None));
        }
    }

    let mut records = Vec::with_capacity(frame.height());
    for (row, (date, symbol)) in dates.into_iter().zip(symbols).enumerate() {
        let (Some(date), Some(symbol)) = (date, symbol) else {
            continue;
        };
        let mut record = PivotedRecord::new(Symbol::new(symbol), date);
        record.fiscal_period = fiscal_periods.as_ref().and_then(|v| v[row].clone());
        record.fiscal_year = fiscal_years.as_ref().and_then(|v| v[row]);
        for (factor, values) in &columns {
            let value = values.as_ref().and_then(|v| v[row]);
            record.set(*factor, value);
        }
        records.push(record);
    }
    Ok(records)
}

/// Reads a long-format frame into factor rows. Rows without a timestamp or symbol are skipped.
pub fn factor_rows(frame: &DataFrame) -> Result<Vec<FactorRow>> {
    let timestamps = date_column(frame, TIMESTAMP)?;
    let symbols = string_column(frame, "symbol")?;
    let names = string_column(frame, "factor_name")?;
    let values = f64_column(frame, "value")?;
    let periods = if has_column(frame, REPORT_PERIOD) {
        date_column(frame, REPORT_PERIOD)?
    } else {
        vec![None; frame.height()]
    };

    let rows = timestamps
        .into_iter()
        .zip(symbols)
        .zip(names)
        .zip(values)
        .zip(periods)
        .filter_map(|((((timestamp, symbol), name), value), period)| {
            Some(FactorRow {
                timestamp: timestamp?,
                report_period: period,
                symbol: Symbol::new(symbol?),
                factor_name: name?,
                value,
            })
        })
        .collect();
    Ok(rows)
}

/// Pivots long-format rows into one record per symbol and pivot date.
///
/// Records come out ordered by symbol, then date ascending. A factor observed more
/// than once for the same key keeps its last value.
#[must_use]
pub fn pivot_rows(rows: Vec<FactorRow>) -> Vec<PivotedRecord> {
    let mut pivoted: BTreeMap<(Symbol, NaiveDate), PivotedRecord> = BTreeMap::new();
    for row in rows {
        let date = row.pivot_date();
        pivoted
            .entry((row.symbol.clone(), date))
            .or_insert_with(|| PivotedRecord::new(row.symbol, date))
            .set(row.factor_name, row.value);
    }
    pivoted.into_values().collect()
}

/// Builds a long-format frame from factor rows.
pub fn long_frame(rows: &[FactorRow]) -> Result<DataFrame> {
    let format = |d: &NaiveDate| d.format("%Y-%m-%d").to_string();
    let frame = DataFrame::new(vec![
        Column::new(
            TIMESTAMP.into(),
            rows.iter().map(|r| format(&r.timestamp)).collect::<Vec<_>>(),
        ),
        Column::new(
            REPORT_PERIOD.into(),
            rows.iter()
                .map(|r| r.report_period.as_ref().map(format))
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "symbol".into(),
            rows.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "factor_name".into(),
            rows.iter().map(|r| r.factor_name.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "value".into(),
            rows.iter().map(|r| r.value).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(frame)
}

/// Builds a wide frame from records, with columns renamed to field names.
///
/// Columns are `symbol`, `key` (typed as a date), then one column per alias in table
/// order.
pub fn records_frame(
    records: &[PivotedRecord],
    key: &str,
    aliases: &AliasTable,
) -> Result<DataFrame> {
    let mut columns = vec![
        Column::new(
            "symbol".into(),
            records.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            key.into(),
            records
                .iter()
                .map(|r| r.date.format("%Y-%m-%d").to_string())
                .collect::<Vec<_>>(),
        ),
    ];
    for alias in aliases.entries() {
        columns.push(Column::new(
            alias.factor.into(),
            records
                .iter()
                .map(|r| r.value(alias.factor))
                .collect::<Vec<_>>(),
        ));
    }

    let mut frame = DataFrame::new(columns)?;
    aliases.to_fields(&mut frame)?;
    let frame = frame
        .lazy()
        .with_column(col(key).cast(DataType::Date))
        .collect()?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::FieldAlias;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_forms() {
        assert_eq!(parse_date("2023-12-31"), Some(date(2023, 12, 31)));
        assert_eq!(parse_date("2023.12.31"), Some(date(2023, 12, 31)));
        assert_eq!(parse_date("2023-12-31 00:00:00"), Some(date(2023, 12, 31)));
        assert_eq!(parse_date("20231231"), None);
    }

    #[test]
    fn test_ensure_not_empty() {
        let err = ensure_not_empty(DataFrame::empty(), "IncomeStatement for SH600519").unwrap_err();
        assert!(err.is_empty_data());
        assert!(err.to_string().contains("SH600519"));
    }

    #[test]
    fn test_pivoted_records_from_wide_frame() {
        let df = DataFrame::new(vec![
            Column::new("报告期".into(), vec!["2023-12-31", "2022-12-31"]),
            Column::new("symbol".into(), vec!["SH600519", "SH600519"]),
            Column::new("营业总收入".into(), vec![Some(1.5e11), None]),
            Column::new("研发费用".into(), vec![Some(f64::NAN), Some(1.2e8)]),
        ])
        .unwrap();

        let records = pivoted_records(&df, "报告期", &["营业总收入", "研发费用", "商誉"]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, date(2023, 12, 31));
        assert_eq!(records[0].symbol.as_str(), "SH600519");
        assert_eq!(records[0].value("营业总收入"), Some(1.5e11));
        assert_eq!(records[0].value("研发费用"), None);
        assert_eq!(records[1].value("营业总收入"), None);
        assert_eq!(records[1].value("研发费用"), Some(1.2e8));
        // requested but never returned
        assert!(records.iter().all(|r| r.value("商誉").is_none()));
        assert!(records[0].fiscal_period.is_none());
    }

    #[test]
    fn test_pivoted_records_reads_fiscal_columns() {
        let df = DataFrame::new(vec![
            Column::new("报告期".into(), vec!["2023.09.30"]),
            Column::new("symbol".into(), vec!["SH600519"]),
            Column::new("fiscal_period".into(), vec!["Q3"]),
            Column::new("fiscal_year".into(), vec![2023i64]),
            Column::new("每股收益".into(), vec![44.0]),
        ])
        .unwrap();
        let records = pivoted_records(&df, "报告期", &["每股收益"]).unwrap();
        assert_eq!(records[0].fiscal_period.as_deref(), Some("Q3"));
        assert_eq!(records[0].fiscal_year, Some(2023));
    }

    #[test]
    fn test_missing_key_column_is_parse_error() {
        let df = DataFrame::new(vec![Column::new("symbol".into(), vec!["SH600519"])]).unwrap();
        let err = pivoted_records(&df, "报告期", &[]).unwrap_err();
        assert!(matches!(err, DataError::Parse(_)));
    }

    #[test]
    fn test_long_rows_pivot_with_nulls() {
        let rows = vec![
            FactorRow {
                timestamp: date(2024, 1, 3),
                report_period: None,
                symbol: Symbol::new("SH600519"),
                factor_name: "股票质押率".into(),
                value: Some(0.12),
            },
            FactorRow {
                timestamp: date(2024, 1, 2),
                report_period: None,
                symbol: Symbol::new("SH600519"),
                factor_name: "股票质押率".into(),
                value: Some(0.1),
            },
            FactorRow {
                timestamp: date(2024, 1, 2),
                report_period: None,
                symbol: Symbol::new("SZ000001"),
                factor_name: "总市值".into(),
                value: Some(2.1e11),
            },
        ];

        let frame = long_frame(&rows).unwrap();
        assert_eq!(frame.height(), 3);
        let parsed = factor_rows(&frame).unwrap();
        assert_eq!(parsed, rows);

        let pivoted = pivot_rows(parsed);
        assert_eq!(pivoted.len(), 3);
        assert_eq!(pivoted[0].symbol.as_str(), "SH600519");
        assert_eq!(pivoted[0].date, date(2024, 1, 2));
        assert_eq!(pivoted[0].value("股票质押率"), Some(0.1));
        assert_eq!(pivoted[0].value("总市值"), None);
        assert_eq!(pivoted[2].symbol.as_str(), "SZ000001");
    }

    #[test]
    fn test_records_frame_uses_field_names() {
        const ALIASES: AliasTable = AliasTable::new(&[
            FieldAlias { field: "total_operating_income", factor: "营业总收入" },
            FieldAlias { field: "ebitda", factor: "息税折旧摊销前利润" },
        ]);
        let mut record = PivotedRecord::new(Symbol::new("SH600519"), date(2023, 12, 31));
        record.set("营业总收入", Some(1.5e11));

        let frame = records_frame(&[record], "period_ending", &ALIASES).unwrap();
        let names: Vec<String> = frame
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["symbol", "period_ending", "total_operating_income", "ebitda"]);
        assert_eq!(frame.column("period_ending").unwrap().dtype(), &DataType::Date);
        assert_eq!(f64_column(&frame, "ebitda").unwrap(), vec![None]);
    }
}
