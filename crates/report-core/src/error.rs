use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which numeric column of a row failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    Quantity,
    UnitPrice,
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericField::Quantity => f.write_str("quantity"),
            NumericField::UnitPrice => f.write_str("unit price"),
        }
    }
}

/// The reason a row was rejected by the aggregator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The date field is not a real `MM/DD/YY` calendar date.
    #[error("invalid date {value:?} (expected MM/DD/YY)")]
    InvalidDate { value: String },

    /// A quantity or unit price is not a non-negative decimal number.
    #[error("invalid {field} {value:?} (expected a non-negative decimal)")]
    InvalidNumber { field: NumericField, value: String },

    /// Quantity times unit price, or the running total, leaves the finite
    /// `f64` range.
    #[error("revenue {quantity} x {unit_price} overflows")]
    RevenueOverflow { quantity: String, unit_price: String },
}

/// A malformed row, identified by its zero-based position in the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("row {row}: {kind}")]
pub struct ParseError {
    pub row: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn invalid_date(row: usize, value: &str) -> Self {
        Self {
            row,
            kind: ParseErrorKind::InvalidDate {
                value: value.to_string(),
            },
        }
    }

    pub fn invalid_number(row: usize, field: NumericField, value: &str) -> Self {
        Self {
            row,
            kind: ParseErrorKind::InvalidNumber {
                field,
                value: value.to_string(),
            },
        }
    }

    pub fn revenue_overflow(row: usize, quantity: &str, unit_price: &str) -> Self {
        Self {
            row,
            kind: ParseErrorKind::RevenueOverflow {
                quantity: quantity.to_string(),
                unit_price: unit_price.to_string(),
            },
        }
    }
}

/// Invalid or incomplete runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Neither an event file nor a bucket/key pair was supplied.
    #[error("No report request given: pass --event or both --bucket and --key")]
    MissingRequest,

    /// A value required for email delivery is absent.
    #[error("Missing SMTP setting: {0}")]
    MissingSmtpSetting(&'static str),

    /// The event file could not be opened or read.
    #[error("Failed to read event file {path}: {source}")]
    EventRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The event file is not a `{"bucket": .., "key": ..}` JSON document.
    #[error("Failed to parse event file {path}: {source}")]
    EventParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_invalid_date() {
        let err = ParseError::invalid_date(3, "13/40/24");
        assert_eq!(
            err.to_string(),
            "row 3: invalid date \"13/40/24\" (expected MM/DD/YY)"
        );
    }

    #[test]
    fn test_parse_error_display_invalid_number() {
        let err = ParseError::invalid_number(7, NumericField::UnitPrice, "abc");
        let msg = err.to_string();
        assert!(msg.starts_with("row 7:"));
        assert!(msg.contains("unit price"));
        assert!(msg.contains("\"abc\""));
    }

    #[test]
    fn test_parse_error_exposes_kind() {
        let err = ParseError::invalid_number(0, NumericField::Quantity, "-1");
        assert_eq!(
            err.kind,
            ParseErrorKind::InvalidNumber {
                field: NumericField::Quantity,
                value: "-1".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_error_display_revenue_overflow() {
        let err = ParseError::revenue_overflow(2, "1e200", "1e200");
        assert_eq!(err.to_string(), "row 2: revenue 1e200 x 1e200 overflows");
    }

    #[test]
    fn test_config_error_display_missing_request() {
        let msg = ConfigError::MissingRequest.to_string();
        assert!(msg.contains("--bucket"));
    }

    #[test]
    fn test_config_error_display_missing_smtp_setting() {
        let err = ConfigError::MissingSmtpSetting("SMTP_PASSWORD");
        assert_eq!(err.to_string(), "Missing SMTP setting: SMTP_PASSWORD");
    }

    #[test]
    fn test_config_error_display_event_read() {
        let err = ConfigError::EventRead {
            path: PathBuf::from("/missing/event.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/missing/event.json"));
        assert!(msg.contains("no such file"));
    }
}
