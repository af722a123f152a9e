use std::sync::OnceLock;

use chrono::{Month, NaiveDate};
use regex::Regex;

/// `chrono` format string for transaction dates, e.g. `"01/15/24"`.
pub const ROW_DATE_FORMAT: &str = "%m/%d/%y";

// ── Date parsing ──────────────────────────────────────────────────────────────

/// `%m/%d/%y` alone also accepts single-digit fields, so the exact two-digit
/// shape is checked first.
fn row_date_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| Regex::new(r"^\d{2}/\d{2}/\d{2}$").expect("regex is valid"))
}

/// Parse a transaction date in `MM/DD/YY` form.
///
/// Two-digit years `69..=99` map to the 1900s and `00..=68` to the 2000s.
/// Returns `None` when the shape is wrong or the date does not exist
/// (e.g. `"13/40/24"` or `"02/30/24"`).
pub fn parse_row_date(s: &str) -> Option<NaiveDate> {
    if !row_date_shape().is_match(s) {
        return None;
    }
    NaiveDate::parse_from_str(s, ROW_DATE_FORMAT).ok()
}

// ── Month names ───────────────────────────────────────────────────────────────

/// Full English name for a month number in `1..=12`.
///
/// Returns `None` for anything outside that range.
pub fn month_name(month: u32) -> Option<&'static str> {
    let number = u8::try_from(month).ok()?;
    Month::try_from(number).ok().map(|m| m.name())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
