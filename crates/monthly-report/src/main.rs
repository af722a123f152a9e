mod bootstrap;

use anyhow::{Context, Result};
use report_core::settings::Settings;
use report_runtime::handler::ReportHandler;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("monthly-report v{} starting", env!("CARGO_PKG_VERSION"));

    let request = settings.validate().context("invalid configuration")?;

    let handler = ReportHandler::new(
        bootstrap::build_loader(&settings).await?,
        bootstrap::build_notifier(&settings)?,
        bootstrap::report_options(&settings)?,
    );

    handler
        .handle(&request)
        .await
        .with_context(|| format!("monthly report for {request} failed"))?;

    tracing::info!("done");
    Ok(())
}
