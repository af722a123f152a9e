/// Number of decimal places used for every monetary value in a report.
pub const MONEY_DECIMALS: usize = 2;

/// Format a floating-point amount with exactly [`MONEY_DECIMALS`] places.
///
/// Rounding is the standard formatter's: the exact binary value is rounded
/// to the nearest representable decimal, and exact ties go to the even digit.
///
/// # Examples
///
/// ```
/// use report_core::formatting::format_amount;
///
/// assert_eq!(format_amount(31.0), "31.00");
/// assert_eq!(format_amount(0.0), "0.00");
/// assert_eq!(format_amount(0.125), "0.12");
/// assert_eq!(format_amount(0.375), "0.38");
/// ```
pub fn format_amount(value: f64) -> String {
    format!("{:.prec$}", value, prec = MONEY_DECIMALS)
}

/// Format a monetary amount as a dollar string, e.g. `"$1234.50"`.
///
/// No thousands separators are inserted; report lines stay machine-greppable.
///
/// # Examples
///
/// ```
/// use report_core::formatting::format_currency;
///
/// assert_eq!(format_currency(1234.5), "$1234.50");
/// assert_eq!(format_currency(0.0), "$0.00");
/// ```
pub fn format_currency(amount: f64) -> String {
    format!("${}", format_amount(amount))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
