//! Monthly revenue aggregation over transaction rows.
//!
//! Folds each row's line revenue (`quantity * unit_price`) into a grand total
//! and into per-month counters, then freezes the result into a [`Report`].

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use report_core::error::{NumericField, ParseError};
use report_core::models::{MonthGrouping, MonthKey, MonthStats, MonthSummary, Report, Row};
use report_core::time_utils::parse_row_date;
use tracing::debug;

// ── AggregateState ────────────────────────────────────────────────────────────

/// Mutable accumulator for one input batch.
#[derive(Debug, Default)]
struct AggregateState {
    /// Keyed by [`MonthKey`], whose ordering is chronological.
    months: BTreeMap<MonthKey, MonthStats>,
    total_revenue: f64,
}

impl AggregateState {
    fn add(&mut self, key: MonthKey, line_revenue: f64) {
        self.total_revenue += line_revenue;
        match self.months.entry(key) {
            Entry::Occupied(mut stats) => stats.get_mut().record(line_revenue),
            Entry::Vacant(slot) => {
                slot.insert(MonthStats::first(line_revenue));
            }
        }
    }

    fn into_report(self) -> Report {
        let months = self
            .months
            .into_iter()
            .map(|(key, stats)| MonthSummary { key, stats })
            .collect();
        Report::new(self.total_revenue, months)
    }
}

// ── MonthlyAggregator ─────────────────────────────────────────────────────────

/// Turns a batch of [`Row`]s into a [`Report`].
///
/// Stateless between calls; each call owns its accumulator, so one
/// aggregator can be shared freely across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthlyAggregator {
    grouping: MonthGrouping,
}

impl MonthlyAggregator {
    pub fn new(grouping: MonthGrouping) -> Self {
        Self { grouping }
    }

    pub fn grouping(&self) -> MonthGrouping {
        self.grouping
    }

    /// Aggregate `rows` into a report.
    ///
    /// When `skip_header` is set the first row is dropped without being
    /// looked at. Row indices in errors are positions in `rows` as given,
    /// header included. The first malformed row aborts the whole batch.
    pub fn aggregate(&self, rows: &[Row], skip_header: bool) -> Result<Report, ParseError> {
        let mut state = AggregateState::default();

        for (index, row) in rows.iter().enumerate().skip(usize::from(skip_header)) {
            let date = parse_row_date(row.date.trim())
                .ok_or_else(|| ParseError::invalid_date(index, &row.date))?;
            let quantity = parse_amount(index, NumericField::Quantity, &row.quantity)?;
            let unit_price = parse_amount(index, NumericField::UnitPrice, &row.unit_price)?;

            let line_revenue = quantity * unit_price;
            if !line_revenue.is_finite() || !(state.total_revenue + line_revenue).is_finite() {
                return Err(ParseError::revenue_overflow(
                    index,
                    &row.quantity,
                    &row.unit_price,
                ));
            }

            state.add(MonthKey::from_date(date, self.grouping), line_revenue);
        }

        debug!(
            rows = rows.len(),
            months = state.months.len(),
            total_revenue = state.total_revenue,
            "aggregated transaction rows"
        );

        Ok(state.into_report())
    }
}

/// Aggregate with the default month-only grouping.
pub fn aggregate(rows: &[Row], skip_header: bool) -> Result<Report, ParseError> {
    MonthlyAggregator::default().aggregate(rows, skip_header)
}

// ── Private ───────────────────────────────────────────────────────────────────

/// Parse a finite, non-negative decimal. Negative zero is accepted and
/// normalised to `0.0` so it never renders as `-0.00`.
fn parse_amount(row: usize, field: NumericField, raw: &str) -> Result<f64, ParseError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value.abs()),
        _ => Err(ParseError::invalid_number(row, field, raw)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
