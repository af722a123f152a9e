//! Request entrypoint: fetch → aggregate → notify.
//!
//! [`ReportHandler::handle`] runs one report request end to end. Each step
//! either succeeds or returns its collaborator's error unchanged inside a
//! [`HandlerError`]; nothing is sent when an earlier step fails.

use report_core::error::ParseError;
use report_core::models::{MonthGrouping, Report, ReportRequest};
use report_data::aggregator::MonthlyAggregator;
use report_data::error::FetchError;
use report_data::loader::SourceLoader;
use thiserror::Error;
use tracing::{error, info};

use crate::notifier::{Notifier, SendError};

// ── HandlerError ──────────────────────────────────────────────────────────────

/// Structured failure of a report request.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Failed to fetch transactions: {0}")]
    Fetch(#[from] FetchError),

    #[error("Malformed transactions: {0}")]
    Parse(#[from] ParseError),

    #[error("Failed to send report: {0}")]
    Send(#[from] SendError),
}

// ── ReportOptions ─────────────────────────────────────────────────────────────

/// Per-deployment knobs for [`ReportHandler`].
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub grouping: MonthGrouping,
    pub skip_header: bool,
    pub subject: String,
    pub recipient: String,
}

impl ReportOptions {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            grouping: MonthGrouping::MonthOnly,
            skip_header: true,
            subject: "Monthly Report".to_string(),
            recipient: recipient.into(),
        }
    }
}

// ── ReportHandler ─────────────────────────────────────────────────────────────

/// Wires a [`SourceLoader`], the aggregator and a [`Notifier`] together.
pub struct ReportHandler {
    loader: Box<dyn SourceLoader>,
    notifier: Box<dyn Notifier>,
    aggregator: MonthlyAggregator,
    options: ReportOptions,
}

impl ReportHandler {
    pub fn new(
        loader: Box<dyn SourceLoader>,
        notifier: Box<dyn Notifier>,
        options: ReportOptions,
    ) -> Self {
        Self {
            loader,
            notifier,
            aggregator: MonthlyAggregator::new(options.grouping),
            options,
        }
    }

    /// Run one request. Returns `Ok(())` once the report has been handed to
    /// the notifier.
    #[tracing::instrument(skip(self, request), fields(bucket = %request.bucket, key = %request.key))]
    pub async fn handle(&self, request: &ReportRequest) -> Result<(), HandlerError> {
        let report = match self.build_report(request).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "report not generated");
                return Err(e);
            }
        };

        let body = report.render();
        if let Err(e) = self
            .notifier
            .send(&self.options.subject, &body, &self.options.recipient)
            .await
        {
            error!(error = %e, "report not delivered");
            return Err(e.into());
        }

        info!(months = report.months().len(), "report delivered");
        Ok(())
    }

    /// Fetch and aggregate without sending.
    pub async fn build_report(&self, request: &ReportRequest) -> Result<Report, HandlerError> {
        let rows = self.loader.fetch_rows(request).await?;
        info!(rows = rows.len(), "transactions loaded");

        let report = self.aggregator.aggregate(&rows, self.options.skip_header)?;
        Ok(report)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
