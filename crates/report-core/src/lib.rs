//! Core types for the monthly revenue report.
//!
//! Holds the row and report data model, transaction-date handling, money
//! formatting, error types and the command-line settings shared by the
//! data and runtime crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
