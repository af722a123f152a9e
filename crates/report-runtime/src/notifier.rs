//! Report delivery.
//!
//! A [`Notifier`] takes the rendered report text and hands it to a transport.
//! [`SmtpNotifier`] sends a plain-text email through a STARTTLS relay;
//! [`StdoutNotifier`] writes the same message to a local writer for dry runs.

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use report_core::settings::SmtpConfig;
use thiserror::Error;
use tracing::info;

// ── SendError ─────────────────────────────────────────────────────────────────

/// Failures while delivering a report.
#[derive(Error, Debug)]
pub enum SendError {
    /// A sender or recipient is not a valid mailbox.
    #[error("Invalid email address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    /// The message could not be assembled.
    #[error("Failed to build email: {0}")]
    Message(#[from] lettre::error::Error),

    /// The SMTP relay rejected the connection, login or message.
    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// Writing the message to a local sink failed.
    #[error("Failed to write email: {0}")]
    Io(#[from] std::io::Error),
}

// ── Notifier ──────────────────────────────────────────────────────────────────

/// Delivers a finished report.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<(), SendError>;
}

/// Parse `address` as a mailbox (`a@b.c` or `Name <a@b.c>`).
pub fn parse_mailbox(address: &str) -> Result<Mailbox, SendError> {
    address.parse().map_err(|source| SendError::Address {
        address: address.to_string(),
        source,
    })
}

/// Assemble a plain-text email.
pub fn build_message(
    sender: &Mailbox,
    recipient: &str,
    subject: &str,
    body: &str,
) -> Result<Message, SendError> {
    let message = Message::builder()
        .from(sender.clone())
        .to(parse_mailbox(recipient)?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())?;
    Ok(message)
}

// ── SmtpNotifier ──────────────────────────────────────────────────────────────

/// Sends reports through an authenticated STARTTLS SMTP relay.
pub struct SmtpNotifier {
    sender: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    /// Build the transport from `config`. No connection is opened until the
    /// first send.
    pub fn new(config: &SmtpConfig) -> Result<Self, SendError> {
        let sender = parse_mailbox(&config.sender)?;
        let credentials = Credentials::new(config.username.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .timeout(Some(config.timeout))
            .build();

        Ok(Self { sender, transport })
    }

    pub fn sender(&self) -> &Mailbox {
        &self.sender
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<(), SendError> {
        let message = build_message(&self.sender, recipient, subject, body)?;

        info!(recipient, subject, "sending report email");
        let response = self.transport.send(message).await?;
        info!(code = %response.code(), "report email accepted");
        Ok(())
    }
}

// ── StdoutNotifier ────────────────────────────────────────────────────────────

/// Writes the email headers and body to a writer instead of sending it.
pub struct StdoutNotifier<W: Write + Send = std::io::Stdout> {
    writer: Mutex<W>,
}

impl StdoutNotifier<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> StdoutNotifier<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer, e.g. to inspect what was written.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl<W: Write + Send> Notifier for StdoutNotifier<W> {
    async fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<(), SendError> {
        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        write!(writer, "To: {recipient}\nSubject: {subject}\n\n{body}")?;
        writer.flush()?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
