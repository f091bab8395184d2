//! Typed output records and the macros that declare them.
//!
//! A record is declared once, listing each output field next to the source factor it
//! is read from. The macro generates the struct, its alias table, and the conversion
//! from a [`PivotedRecord`], so field and factor cannot drift apart.
//!
//! ```rust,ignore
//! xiaoyuan_core::report_record! {
//!     /// Per-share indicators.
//!     pub struct PerShare {
//!         /// Diluted earnings per share.
//!         eps_diluted => "期末摊薄每股收益（元）",
//!     }
//! }
//! ```
//!
//! Crates invoking the macros must depend on `serde` and `chrono`.

use serde::Serialize;
use std::fmt::Debug;

use crate::alias::AliasTable;
use crate::types::PivotedRecord;

/// A typed record built from one pivoted row.
pub trait FactorRecord: Serialize + Send + Sync + Debug + Sized + 'static {
    /// Name of the date field in the output (`period_ending` or `date`).
    const KEY: &'static str;

    /// Field to factor aliases. The query requests exactly these factors.
    const ALIASES: AliasTable;

    /// Builds the record from a pivoted row. Missing factors become `None`.
    fn from_pivoted(record: PivotedRecord) -> Self;
}

/// Declares a record keyed by report period.
///
/// The generated struct has `symbol`, `period_ending`, `fiscal_period` and
/// `fiscal_year`, followed by one `Option<f64>` per declared field.
#[macro_export]
macro_rules! report_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident => $factor:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        $vis struct $name {
            /// Ticker the figures belong to.
            pub symbol: $crate::Symbol,
            /// Fiscal period end date.
            pub period_ending: ::chrono::NaiveDate,
            /// Fiscal period label (`Q1`, `Q2`, `Q3` or `FY`).
            pub fiscal_period: ::std::option::Option<::std::string::String>,
            /// Fiscal year of the report.
            pub fiscal_year: ::std::option::Option<i32>,
            $(
                $(#[$field_meta])*
                pub $field: ::std::option::Option<f64>,
            )+
        }

        impl $crate::FactorRecord for $name {
            const KEY: &'static str = "period_ending";
            const ALIASES: $crate::AliasTable = $crate::AliasTable::new(&[
                $($crate::FieldAlias { field: stringify!($field), factor: $factor },)+
            ]);

            fn from_pivoted(record: $crate::PivotedRecord) -> Self {
                Self {
                    $($field: record.value($factor),)+
                    symbol: record.symbol,
                    period_ending: record.date,
                    fiscal_period: record.fiscal_period,
                    fiscal_year: record.fiscal_year,
                }
            }
        }
    };
}

/// Declares a record keyed by trading day.
///
/// The generated struct has `symbol` and `date`, followed by one `Option<f64>` per
/// declared field.
#[macro_export]
macro_rules! daily_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident => $factor:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        $vis struct $name {
            /// Ticker the values belong to.
            pub symbol: $crate::Symbol,
            /// Trading day of the observation.
            pub date: ::chrono::NaiveDate,
            $(
                $(#[$field_meta])*
                pub $field: ::std::option::Option<f64>,
            )+
        }

        impl $crate::FactorRecord for $name {
            const KEY: &'static str = "date";
            const ALIASES: $crate::AliasTable = $crate::AliasTable::new(&[
                $($crate::FieldAlias { field: stringify!($field), factor: $factor },)+
            ]);

            fn from_pivoted(record: $crate::PivotedRecord) -> Self {
                Self {
                    $($field: record.value($factor),)+
                    symbol: record.symbol,
                    date: record.date,
                }
            }
        }
    };
}
