use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use report_core::settings::Settings;
use report_data::loader::{FileSourceLoader, HttpSourceLoader, S3SourceLoader, SourceLoader};
use report_runtime::handler::ReportOptions;
use report_runtime::notifier::{Notifier, SmtpNotifier, StdoutNotifier};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Recipient shown in dry-run output when none is configured.
const DRY_RUN_RECIPIENT: &str = "stdout";

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` name to a tracing filter directive.
///
/// Unrecognised names pass through lowercased; `EnvFilter` then decides.
pub fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        other => other.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Logs go to stderr; when `log_file` is set they are also appended to that
/// file without ANSI colours. Falls back to `"info"` if the level is not a
/// valid filter.
pub fn setup_logging(log_level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(level_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file_layer = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

// ── Collaborator wiring ────────────────────────────────────────────────────────

/// `--source-dir` selects the local mirror, `--object-endpoint` an unsigned
/// HTTP store; otherwise objects come from S3 through the AWS SDK.
pub async fn build_loader(settings: &Settings) -> anyhow::Result<Box<dyn SourceLoader>> {
    if let Some(dir) = &settings.source_dir {
        tracing::info!(dir = %dir.display(), "using local source directory");
        return Ok(Box::new(FileSourceLoader::new(dir)));
    }

    if let Some(endpoint) = &settings.object_endpoint {
        let loader = HttpSourceLoader::new(endpoint, settings.http_timeout())?;
        tracing::info!(%endpoint, "using unsigned HTTP object store");
        return Ok(Box::new(loader));
    }

    tracing::info!(
        region = settings.s3_region.as_deref().unwrap_or("<provider chain>"),
        endpoint = settings.s3_endpoint.as_deref().unwrap_or("<aws>"),
        "using S3"
    );
    let loader = S3SourceLoader::from_env(
        settings.s3_region.clone(),
        settings.s3_endpoint.clone(),
        settings.http_timeout(),
    )
    .await;
    Ok(Box::new(loader))
}

/// `--dry-run` prints the email; otherwise it goes out over SMTP.
pub fn build_notifier(settings: &Settings) -> anyhow::Result<Box<dyn Notifier>> {
    if settings.dry_run {
        tracing::info!("dry run: report will be printed, not emailed");
        return Ok(Box::new(StdoutNotifier::stdout()));
    }
    let config = settings.smtp_config()?;
    tracing::info!(host = %config.host, port = config.port, "using SMTP relay");
    Ok(Box::new(SmtpNotifier::new(&config)?))
}

pub fn report_options(settings: &Settings) -> anyhow::Result<ReportOptions> {
    let recipient = if settings.dry_run {
        settings
            .recipient()
            .unwrap_or_else(|_| DRY_RUN_RECIPIENT.to_string())
    } else {
        settings.recipient()?
    };

    Ok(ReportOptions {
        grouping: settings.grouping(),
        skip_header: settings.skip_header(),
        subject: settings.subject.clone(),
        recipient,
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────────
