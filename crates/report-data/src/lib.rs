//! Data layer for the monthly revenue report.
//!
//! Fetches transactions objects, decodes their CSV records into rows and
//! folds those rows into a monthly [`report_core::models::Report`].

pub mod aggregator;
pub mod error;
pub mod loader;
pub mod reader;

pub use report_core as core;
