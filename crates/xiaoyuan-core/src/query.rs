//! Query-language builders for the fact tables.
//!
//! Builders are pure string construction; the reader executes the result. Every factor
//! name and symbol is emitted as a double-quoted literal, unchanged apart from escaping
//! `"` and `\`.

use chrono::NaiveDate;

use crate::config::TableRef;
use crate::period::PeriodFilter;
use crate::types::Symbol;

/// Report period column of the finance fact tables.
pub const REPORT_PERIOD: &str = "报告期";
/// Trading day column of the daily fact table.
pub const TIMESTAMP: &str = "timestamp";
/// Fiscal period label column added by [`FinanceQuery::fiscal_annotation`].
pub const FISCAL_PERIOD: &str = "fiscal_period";
/// Fiscal year column added by [`FinanceQuery::fiscal_annotation`].
pub const FISCAL_YEAR: &str = "fiscal_year";

const FISCAL_PERIOD_FN: &str = "def fiscalPeriodOf(d) { m = monthOfYear(d); \
return iif(m <= 3, \"Q1\", iif(m <= 6, \"Q2\", iif(m <= 9, \"Q3\", \"FY\"))) }";

/// Formats a date as a store date literal (`2024.01.31`).
#[must_use]
pub fn db_date(date: NaiveDate) -> String {
    date.format("%Y.%m.%d").to_string()
}

/// Quotes a string literal.
#[must_use]
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Renders a vector literal of quoted strings.
#[must_use]
pub fn string_vector<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let quoted: Vec<String> = items.into_iter().map(|s| quote(s.as_ref())).collect();
    format!("[{}]", quoted.join(", "))
}

fn symbol_vector(symbols: &[Symbol]) -> String {
    string_vector(symbols.iter().map(Symbol::as_str))
}

/// Query over a finance fact table, pivoted to one column per factor.
#[derive(Clone, Debug)]
pub struct FinanceQuery<'a> {
    table: &'a TableRef,
    factors: Vec<String>,
    symbols: Vec<Symbol>,
    period: Option<PeriodFilter>,
    as_of: Option<String>,
    fiscal_annotation: bool,
}

impl<'a> FinanceQuery<'a> {
    /// Starts a query for `factors` of `symbols` in `table`.
    #[must_use]
    pub fn new<I, S>(table: &'a TableRef, factors: I, symbols: &[Symbol]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table,
            factors: factors.into_iter().map(Into::into).collect(),
            symbols: symbols.to_vec(),
            period: None,
            as_of: None,
            fiscal_annotation: false,
        }
    }

    /// Restricts rows with a period filter.
    #[must_use]
    pub const fn period(mut self, filter: PeriodFilter) -> Self {
        self.period = Some(filter);
        self
    }

    /// Keeps only reports whose period ends on or before `date` (a store date literal).
    #[must_use]
    pub fn as_of(mut self, date: impl Into<String>) -> Self {
        self.as_of = Some(date.into());
        self
    }

    /// Adds fiscal period and fiscal year columns to the pivoted result.
    #[must_use]
    pub const fn fiscal_annotation(mut self, enabled: bool) -> Self {
        self.fiscal_annotation = enabled;
        self
    }

    /// Renders the script.
    #[must_use]
    pub fn build(&self) -> String {
        let mut script = String::new();
        if self.fiscal_annotation {
            script.push_str(FISCAL_PERIOD_FN);
            script.push('\n');
        }
        let as_of = self
            .as_of
            .as_ref()
            .map(|d| format!(" and {REPORT_PERIOD} <= {d}"))
            .unwrap_or_default();
        let period = self.period.map(|p| p.render()).unwrap_or_default();
        script.push_str(&format!(
            "t = select {REPORT_PERIOD}, symbol, factor_name, value from {} \
where factor_name in {} and symbol in {}{as_of}{period};\n",
            self.table.load_expr(),
            string_vector(&self.factors),
            symbol_vector(&self.symbols),
        ));
        script.push_str(&format!(
            "t = select value from t pivot by {REPORT_PERIOD}, symbol, factor_name;\n"
        ));
        if self.fiscal_annotation {
            script.push_str(&format!(
                "update t set {FISCAL_PERIOD} = fiscalPeriodOf({REPORT_PERIOD}), \
{FISCAL_YEAR} = year({REPORT_PERIOD});\n"
            ));
        }
        script.push('t');
        script
    }
}

/// Dates selected by a [`DailyQuery`].
#[derive(Clone, Debug, PartialEq, Eq)]
enum DailySelection {
    Between(String, String),
    On(Vec<String>),
}

/// Query over the daily fact table, pivoted to one column per factor.
#[derive(Clone, Debug)]
pub struct DailyQuery<'a> {
    table: &'a TableRef,
    factors: Vec<String>,
    symbols: Vec<Symbol>,
    selection: DailySelection,
}

impl<'a> DailyQuery<'a> {
    /// Rows whose trading day lies in `[start, end]` (store date literals).
    #[must_use]
    pub fn between<I, S>(
        table: &'a TableRef,
        factors: I,
        symbols: &[Symbol],
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table,
            factors: factors.into_iter().map(Into::into).collect(),
            symbols: symbols.to_vec(),
            selection: DailySelection::Between(start.into(), end.into()),
        }
    }

    /// Rows on exactly the given trading days (store date literals).
    #[must_use]
    pub fn on_dates<I, S>(table: &'a TableRef, factors: I, symbols: &[Symbol], dates: Vec<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table,
            factors: factors.into_iter().map(Into::into).collect(),
            symbols: symbols.to_vec(),
            selection: DailySelection::On(dates),
        }
    }

    /// Renders the script.
    #[must_use]
    pub fn build(&self) -> String {
        let dates = match &self.selection {
            DailySelection::Between(start, end) => format!("{TIMESTAMP} between {start} : {end}"),
            DailySelection::On(dates) => format!("{TIMESTAMP} in [{}]", dates.join(", ")),
        };
        format!(
            "t = select {TIMESTAMP}, symbol, factor_name, value from {} \
where factor_name in {} and symbol in {} and {dates};\n\
t = select value from t pivot by {TIMESTAMP}, symbol, factor_name;\nt",
            self.table.load_expr(),
            string_vector(&self.factors),
            symbol_vector(&self.symbols),
        )
    }
}

/// Query over the dividend detail table.
///
/// The result has columns `symbol`, `record_date`, `dividend_date` and
/// `dividend_per_share_before_tax`. Symbols are derived from entity ids such as
/// `stock_sh_600519`.
#[derive(Clone, Debug)]
pub struct DividendQuery<'a> {
    table: &'a TableRef,
    start: String,
    end: String,
    code: Option<String>,
}

impl<'a> DividendQuery<'a> {
    /// Dividends with a dividend date in `[start, end]` (store date literals).
    #[must_use]
    pub fn new(table: &'a TableRef, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            table,
            start: start.into(),
            end: end.into(),
            code: None,
        }
    }

    /// Restricts to one six-digit security code.
    #[must_use]
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Renders the script.
    #[must_use]
    pub fn build(&self) -> String {
        let code = self
            .code
            .as_ref()
            .map(|c| format!(" and entity_id like {}", quote(&format!("%_{c}"))))
            .unwrap_or_default();
        format!(
            "t = select upper(split(entity_id, \"_\")[1]) + split(entity_id, \"_\")[2] as symbol, \
record_date, dividend_date, dividend_per_share_before_tax from {} \
where dividend_date between {} : {}{code};\nt",
            self.table.load_expr(),
            self.start,
            self.end,
        )
    }
}
