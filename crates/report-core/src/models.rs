use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::formatting::format_currency;
use crate::time_utils::month_name;

/// One transaction line as received, before any field is interpreted.
///
/// Fields are positional: `[date, product_id, quantity, unit_price]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    /// Transaction date in `MM/DD/YY` form.
    pub date: String,
    /// Product identifier; carried through but never interpreted.
    pub product_id: String,
    /// Units sold, as a decimal string.
    pub quantity: String,
    /// Price per unit, as a decimal string.
    pub unit_price: String,
}

impl Row {
    pub fn new(
        date: impl Into<String>,
        product_id: impl Into<String>,
        quantity: impl Into<String>,
        unit_price: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            product_id: product_id.into(),
            quantity: quantity.into(),
            unit_price: unit_price.into(),
        }
    }
}

/// Location of the transactions object to report on.
///
/// Deserialises from the invocation event `{"bucket": "...", "key": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub bucket: String,
    pub key: String,
}

impl ReportRequest {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ReportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

// ── Month grouping ────────────────────────────────────────────────────────────

/// How transaction dates are folded into report months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthGrouping {
    /// Group by calendar month only; the same month of different years merges.
    #[default]
    MonthOnly,
    /// Group by year and month.
    YearAndMonth,
}

/// Grouping key for monthly statistics.
///
/// Ordering is chronological: by year (when present), then month number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: Option<i32>,
    month: u32,
}

impl MonthKey {
    /// Derive the key for `date` under `grouping`.
    pub fn from_date(date: NaiveDate, grouping: MonthGrouping) -> Self {
        let year = match grouping {
            MonthGrouping::MonthOnly => None,
            MonthGrouping::YearAndMonth => Some(date.year()),
        };
        Self {
            year,
            month: date.month(),
        }
    }

    /// Calendar month number, `1..=12`.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The year, when grouping is year-aware.
    pub fn year(&self) -> Option<i32> {
        self.year
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `month` always comes from a NaiveDate, so it is in 1..=12.
        let name = month_name(self.month).unwrap_or("Unknown");
        match self.year {
            Some(year) => write!(f, "{} {}", name, year),
            None => f.write_str(name),
        }
    }
}

// ── Statistics ────────────────────────────────────────────────────────────────

/// Running totals for one month.
///
/// Only constructed through [`MonthStats::first`], so `transaction_count`
/// is never zero and the average is always defined.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthStats {
    transaction_count: u64,
    revenue_sum: f64,
}

impl MonthStats {
    /// Stats holding a single transaction worth `line_revenue`.
    pub fn first(line_revenue: f64) -> Self {
        Self {
            transaction_count: 1,
            revenue_sum: line_revenue,
        }
    }

    /// Fold another transaction into the totals.
    pub fn record(&mut self, line_revenue: f64) {
        self.transaction_count += 1;
        self.revenue_sum += line_revenue;
    }

    pub fn transaction_count(&self) -> u64 {
        self.transaction_count
    }

    pub fn revenue_sum(&self) -> f64 {
        self.revenue_sum
    }

    /// `revenue_sum / transaction_count`.
    pub fn average_transaction_value(&self) -> f64 {
        self.revenue_sum / self.transaction_count as f64
    }
}

/// One month block of a finished report.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    pub key: MonthKey,
    pub stats: MonthStats,
}

// ── Report ────────────────────────────────────────────────────────────────────

/// Finished monthly revenue report.
///
/// Months are held in chronological order; [`Report::render`] (and the
/// `Display` impl) produce the plain-text email body.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    total_revenue: f64,
    months: Vec<MonthSummary>,
}

impl Report {
    /// Build a report. `months` must already be in chronological order.
    pub fn new(total_revenue: f64, months: Vec<MonthSummary>) -> Self {
        Self {
            total_revenue,
            months,
        }
    }

    pub fn total_revenue(&self) -> f64 {
        self.total_revenue
    }

    pub fn months(&self) -> &[MonthSummary] {
        &self.months
    }

    /// Look up the stats for a month by key.
    pub fn month(&self, key: &MonthKey) -> Option<&MonthStats> {
        self.months
            .iter()
            .find(|summary| &summary.key == key)
            .map(|summary| &summary.stats)
    }

    /// Look up the stats for a month by its rendered label, e.g. `"January"`.
    pub fn month_by_label(&self, label: &str) -> Option<&MonthStats> {
        self.months
            .iter()
            .find(|summary| summary.key.to_string() == label)
            .map(|summary| &summary.stats)
    }

    /// Render the plain-text body.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Revenue: {}", format_currency(self.total_revenue))?;
        for summary in &self.months {
            writeln!(
                f,
                "Number of transactions in {}: {}",
                summary.key,
                summary.stats.transaction_count()
            )?;
            writeln!(
                f,
                "Average transaction value in {}: {}",
                summary.key,
                format_currency(summary.stats.average_transaction_value())
            )?;
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
