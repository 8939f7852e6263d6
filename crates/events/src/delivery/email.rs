//! Task report delivery via SMTP.
//!
//! [`TaskReportMailer`] wraps the `lettre` async SMTP transport to send the
//! plain-text report for a finished task to its tester. If `SMTP_HOST` is
//! not set, [`EmailConfig::from_env`] returns `None` and no mailer should be
//! constructed.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use webrobot_core::report::{report_body, report_subject, TaskReport};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient, sender or cc address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@webrobot.local";

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    /// Added as Cc on every report, e.g. a QA mailing list.
    pub always_cc: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable         | Required | Default                   |
    /// |------------------|----------|---------------------------|
    /// | `SMTP_HOST`      | yes      | none                      |
    /// | `SMTP_PORT`      | no       | `587`                     |
    /// | `SMTP_FROM`      | no       | `noreply@webrobot.local`  |
    /// | `SMTP_USER`      | no       | none                      |
    /// | `SMTP_PASSWORD`  | no       | none                      |
    /// | `SMTP_ALWAYS_CC` | no       | none                      |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            always_cc: std::env::var("SMTP_ALWAYS_CC")
                .ok()
                .filter(|cc| !cc.trim().is_empty()),
        })
    }
}

// ---------------------------------------------------------------------------
// TaskReportMailer
// ---------------------------------------------------------------------------

/// Sends the report of a finished task to its tester.
pub struct TaskReportMailer {
    config: EmailConfig,
    result_base_url: String,
}

impl TaskReportMailer {
    /// `result_base_url` is the public origin serving `testresult/<id>/log.html`.
    pub fn new(config: EmailConfig, result_base_url: impl Into<String>) -> Self {
        Self {
            config,
            result_base_url: result_base_url.into(),
        }
    }

    /// Assemble the report message without sending it.
    pub fn build_message(&self, to_email: &str, report: &TaskReport) -> Result<Message, EmailError> {
        let mut builder = Message::builder()
            .from(self.config.from_address.parse::<Mailbox>()?)
            .to(to_email.parse::<Mailbox>()?)
            .subject(report_subject(report))
            .header(ContentType::TEXT_PLAIN);

        if let Some(cc) = &self.config.always_cc {
            builder = builder.cc(cc.parse::<Mailbox>()?);
        }

        builder
            .body(report_body(report, &self.result_base_url))
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    pub async fn send_report(&self, to_email: &str, report: &TaskReport) -> Result<(), EmailError> {
        let email = self.build_message(to_email, report)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(
            to = to_email,
            task_id = report.task_id,
            status = %report.status,
            "Task report email sent"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
