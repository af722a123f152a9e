use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::{MonthGrouping, ReportRequest};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Email a monthly revenue report built from a transactions CSV
#[derive(Parser, Debug, Clone)]
#[command(
    name = "monthly-report",
    about = "Email a monthly revenue report built from a transactions CSV",
    version
)]
pub struct Settings {
    /// Invocation event file: JSON object with "bucket" and "key"
    #[arg(long, env = "REPORT_EVENT", conflicts_with_all = ["bucket", "key"])]
    pub event: Option<PathBuf>,

    /// Bucket holding the transactions object
    #[arg(long, env = "REPORT_BUCKET")]
    pub bucket: Option<String>,

    /// Key of the transactions object inside the bucket
    #[arg(long, env = "REPORT_KEY")]
    pub key: Option<String>,

    /// Read objects from a local directory laid out as <dir>/<bucket>/<key>
    #[arg(long, env = "REPORT_SOURCE_DIR")]
    pub source_dir: Option<PathBuf>,

    /// Unsigned HTTP object store; objects are fetched from <endpoint>/<bucket>/<key>
    #[arg(long, env = "REPORT_OBJECT_ENDPOINT", conflicts_with = "s3_endpoint")]
    pub object_endpoint: Option<String>,

    /// S3 region (defaults to the AWS provider chain, e.g. AWS_REGION)
    #[arg(long, env = "REPORT_S3_REGION")]
    pub s3_region: Option<String>,

    /// S3-compatible endpoint for signed requests (path-style addressing)
    #[arg(long, env = "REPORT_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// Object fetch timeout in seconds
    #[arg(long, env = "REPORT_HTTP_TIMEOUT_SECS", default_value = "30")]
    pub http_timeout_secs: u64,

    /// Treat the first CSV line as data instead of a header
    #[arg(long)]
    pub no_header: bool,

    /// Report "January 2024" and "January 2025" separately
    #[arg(long)]
    pub group_by_year: bool,

    /// SMTP relay host
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    /// SMTP relay port (STARTTLS)
    #[arg(long, env = "SMTP_PORT", default_value = "587")]
    pub smtp_port: u16,

    /// SMTP login
    #[arg(long, env = "SMTP_USERNAME")]
    pub smtp_username: Option<String>,

    /// SMTP password
    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// SMTP command timeout in seconds
    #[arg(long, env = "SMTP_TIMEOUT_SECS", default_value = "30")]
    pub smtp_timeout_secs: u64,

    /// From address (defaults to the SMTP login)
    #[arg(long, env = "REPORT_SENDER")]
    pub sender: Option<String>,

    /// To address (defaults to the sender)
    #[arg(long, env = "REPORT_RECIPIENT")]
    pub recipient: Option<String>,

    /// Email subject
    #[arg(long, env = "REPORT_SUBJECT", default_value = "Monthly Report")]
    pub subject: String,

    /// Print the email to stdout instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── SmtpConfig ─────────────────────────────────────────────────────────────────

/// Everything the SMTP notifier needs, resolved up front.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
    pub timeout: Duration,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("sender", &self.sender)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] but from an explicit argument list.
    pub fn try_load_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Settings::try_parse_from(args).map(Self::resolve)
    }

    fn resolve(mut settings: Settings) -> Settings {
        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Check cross-field requirements that clap cannot express and return
    /// the resolved request, so the event file is read only once.
    pub fn validate(&self) -> Result<ReportRequest, ConfigError> {
        let request = self.request()?;
        if !self.dry_run {
            self.smtp_config()?;
            self.recipient()?;
        }
        Ok(request)
    }

    /// The object to report on, from `--event` or `--bucket`/`--key`.
    pub fn request(&self) -> Result<ReportRequest, ConfigError> {
        if let Some(path) = &self.event {
            return load_event(path);
        }
        match (&self.bucket, &self.key) {
            (Some(bucket), Some(key)) => Ok(ReportRequest::new(bucket, key)),
            _ => Err(ConfigError::MissingRequest),
        }
    }

    /// Whether the first CSV line is a header to skip.
    pub fn skip_header(&self) -> bool {
        !self.no_header
    }

    pub fn grouping(&self) -> MonthGrouping {
        if self.group_by_year {
            MonthGrouping::YearAndMonth
        } else {
            MonthGrouping::MonthOnly
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// The From address: `--sender`, falling back to the SMTP login.
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref().or(self.smtp_username.as_deref())
    }

    /// The To address: `--recipient`, falling back to the sender.
    pub fn recipient(&self) -> Result<String, ConfigError> {
        self.recipient
            .as_deref()
            .or(self.sender())
            .map(str::to_string)
            .ok_or(ConfigError::MissingSmtpSetting("REPORT_RECIPIENT"))
    }

    /// Assemble the SMTP configuration, failing on the first missing value.
    pub fn smtp_config(&self) -> Result<SmtpConfig, ConfigError> {
        let username = self
            .smtp_username
            .clone()
            .ok_or(ConfigError::MissingSmtpSetting("SMTP_USERNAME"))?;
        let password = self
            .smtp_password
            .clone()
            .ok_or(ConfigError::MissingSmtpSetting("SMTP_PASSWORD"))?;
        let sender = self.sender().unwrap_or(&username).to_string();

        Ok(SmtpConfig {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username,
            password,
            sender,
            timeout: Duration::from_secs(self.smtp_timeout_secs),
        })
    }
}

/// Read a `{"bucket": .., "key": ..}` event document from disk.
fn load_event(path: &std::path::Path) -> Result<ReportRequest, ConfigError> {
    tracing::debug!(path = %path.display(), "loading invocation event");
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::EventRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::EventParse {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn parse(args: &[&str]) -> Settings {
        let mut full = vec!["monthly-report"];
        full.extend_from_slice(args);
        Settings::try_load_from(full).expect("args should parse")
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_defaults() {
        let s = parse(&["--bucket", "b", "--key", "k", "--dry-run"]);
        assert_eq!(s.subject, "Monthly Report");
        assert_eq!(s.smtp_host, "smtp.gmail.com");
        assert_eq!(s.smtp_port, 587);
        assert_eq!(s.log_level, "INFO");
        assert!(s.skip_header());
        assert_eq!(s.grouping(), MonthGrouping::MonthOnly);
        assert_eq!(s.http_timeout(), Duration::from_secs(30));
        assert!(s.object_endpoint.is_none());
        assert!(s.s3_endpoint.is_none());
    }

    #[test]
    fn test_object_endpoint_conflicts_with_s3_endpoint() {
        let result = Settings::try_load_from([
            "monthly-report",
            "--object-endpoint",
            "http://localhost:8080",
            "--s3-endpoint",
            "http://localhost:9000",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_overrides_log_level() {
        let s = parse(&["--debug", "--log-level", "ERROR"]);
        assert_eq!(s.log_level, "DEBUG");
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let result = Settings::try_load_from(["monthly-report", "--log-level", "TRACE"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags() {
        let s = parse(&["--no-header", "--group-by-year"]);
        assert!(!s.skip_header());
        assert_eq!(s.grouping(), MonthGrouping::YearAndMonth);
    }

    // ── request ───────────────────────────────────────────────────────────────

    #[test]
    fn test_request_from_bucket_and_key() {
        let s = parse(&["--bucket", "sales", "--key", "jan.csv"]);
        assert_eq!(s.request().unwrap(), ReportRequest::new("sales", "jan.csv"));
    }

    #[test]
    fn test_request_missing() {
        let s = parse(&["--bucket", "sales"]);
        assert!(matches!(s.request(), Err(ConfigError::MissingRequest)));
    }

    #[test]
    fn test_request_from_event_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("event.json");
        std::fs::write(&path, r#"{"bucket": "sales", "key": "2024/feb.csv"}"#).unwrap();

        let s = parse(&["--event", path.to_str().unwrap()]);
        assert_eq!(
            s.request().unwrap(),
            ReportRequest::new("sales", "2024/feb.csv")
        );
    }

    #[test]
    fn test_request_event_file_malformed() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("event.json");
        std::fs::write(&path, r#"{"bucket": "sales"}"#).unwrap();

        let s = parse(&["--event", path.to_str().unwrap()]);
        assert!(matches!(s.request(), Err(ConfigError::EventParse { .. })));
    }

    #[test]
    fn test_request_event_file_missing() {
        let s = parse(&["--event", "/definitely/not/here.json"]);
        assert!(matches!(s.request(), Err(ConfigError::EventRead { .. })));
    }

    #[test]
    fn test_event_conflicts_with_bucket() {
        let result = Settings::try_load_from([
            "monthly-report",
            "--event",
            "e.json",
            "--bucket",
            "b",
        ]);
        assert!(result.is_err());
    }

    // ── SMTP ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_smtp_config_defaults_sender_and_recipient_to_username() {
        let s = parse(&[
            "--smtp-username",
            "reports@example.com",
            "--smtp-password",
            "hunter2",
        ]);
        let cfg = s.smtp_config().unwrap();
        assert_eq!(cfg.sender, "reports@example.com");
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(s.recipient().unwrap(), "reports@example.com");
    }

    #[test]
    fn test_smtp_config_explicit_addresses() {
        let s = parse(&[
            "--smtp-username",
            "login",
            "--smtp-password",
            "pw",
            "--sender",
            "from@example.com",
            "--recipient",
            "to@example.com",
        ]);
        assert_eq!(s.smtp_config().unwrap().sender, "from@example.com");
        assert_eq!(s.recipient().unwrap(), "to@example.com");
    }

    #[test]
    fn test_smtp_config_missing_password() {
        let s = parse(&["--smtp-username", "login"]);
        assert!(matches!(
            s.smtp_config(),
            Err(ConfigError::MissingSmtpSetting("SMTP_PASSWORD"))
        ));
    }

    #[test]
    fn test_smtp_config_debug_redacts_password() {
        let s = parse(&["--smtp-username", "login", "--smtp-password", "hunter2"]);
        let rendered = format!("{:?}", s.smtp_config().unwrap());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    // ── validate ──────────────────────────────────────────────────────────────

    #[test]
    fn test_validate_dry_run_needs_no_smtp() {
        let s = parse(&["--bucket", "b", "--key", "k", "--dry-run"]);
        assert_eq!(s.validate().unwrap(), ReportRequest::new("b", "k"));
    }

    #[test]
    fn test_validate_returns_event_request() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("event.json");
        std::fs::write(&path, r#"{"bucket": "sales", "key": "mar.csv"}"#).unwrap();

        let s = parse(&["--event", path.to_str().unwrap(), "--dry-run"]);
        let request = s.validate().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(request, ReportRequest::new("sales", "mar.csv"));
    }

    #[test]
    fn test_validate_send_requires_credentials() {
        let s = parse(&["--bucket", "b", "--key", "k"]);
        assert!(matches!(
            s.validate(),
            Err(ConfigError::MissingSmtpSetting(_))
        ));
    }
}
