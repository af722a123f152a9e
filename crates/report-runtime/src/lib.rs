//! Runtime layer for the monthly revenue report.
//!
//! Delivers finished reports and runs a report request from fetch to send.

pub mod handler;
pub mod notifier;

pub use report_core as core;
pub use report_data as data;
