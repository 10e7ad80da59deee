use std::fmt;

use courier_logging::{courier_debug, courier_info};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Subject Kindle's personal document service recognises as "convert this".
pub const KINDLE_SUBJECT: &str = "CONVERT";
pub const DEFAULT_RELAY_PORT: u16 = 587;
/// Port on which the relay expects TLS from the first byte.
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// Relay settings as supplied externally. Every field may be missing; the
/// check happens in [`RelayConfig::validate`], before any connection.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address; the username is used when absent.
    pub from: Option<String>,
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("from", &self.from)
            .finish()
    }
}

/// Complete relay settings.
#[derive(Clone, PartialEq, Eq)]
pub struct RelaySettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: Mailbox,
}

impl RelaySettings {
    pub fn implicit_tls(&self) -> bool {
        self.port == IMPLICIT_TLS_PORT
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<RelaySettings, PipelineError> {
        let host = required(&self.host, "SMTP_HOST")?;
        let username = required(&self.username, "SMTP_USER")?;
        let password = required(&self.password, "SMTP_PASSWORD")?;
        let sender = self
            .from
            .as_deref()
            .map(str::trim)
            .filter(|from| !from.is_empty())
            .unwrap_or(&username);
        let from = sender
            .parse::<Mailbox>()
            .map_err(|err| PipelineError::Config(format!("invalid sender address {sender}: {err}")))?;

        Ok(RelaySettings {
            host,
            port: self.port.unwrap_or(DEFAULT_RELAY_PORT),
            username,
            password,
            from,
        })
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String, PipelineError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PipelineError::Config(format!("missing {name}")))
}

/// Sends one rendered document to one mailbox.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Cheap readiness check run before a batch starts; no network access.
    fn ready(&self) -> Result<(), PipelineError> {
        Ok(())
    }

    async fn deliver(
        &self,
        destination: &str,
        document: &[u8],
        filename: &str,
        title: &str,
    ) -> Result<(), PipelineError>;
}

/// SMTP delivery through an authenticated relay. No retries.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    relay: RelayConfig,
}

impl SmtpMailer {
    pub fn new(relay: RelayConfig) -> Self {
        Self { relay }
    }

    fn transport(
        &self,
        settings: &RelaySettings,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, PipelineError> {
        let builder = if settings.implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .map_err(|err| PipelineError::Config(format!("invalid relay host {}: {err}", settings.host)))?;

        Ok(builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build())
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    fn ready(&self) -> Result<(), PipelineError> {
        self.relay.validate().map(|_| ())
    }

    async fn deliver(
        &self,
        destination: &str,
        document: &[u8],
        filename: &str,
        title: &str,
    ) -> Result<(), PipelineError> {
        let settings = self.relay.validate()?;
        let message = build_message(&settings.from, destination, document, filename, title)?;
        let transport = self.transport(&settings)?;

        courier_debug!(
            "Sending {} via {}:{} (implicit tls: {})",
            filename,
            settings.host,
            settings.port,
            settings.implicit_tls()
        );
        transport
            .send(message)
            .await
            .map_err(|err| PipelineError::delivery(destination, err))?;

        courier_info!("Email sent successfully to {}", destination);
        Ok(())
    }
}

/// Builds the Kindle message: fixed subject, a short text/HTML note naming
/// the article and the PDF as the only attachment.
pub fn build_message(
    from: &Mailbox,
    destination: &str,
    document: &[u8],
    filename: &str,
    title: &str,
) -> Result<Message, PipelineError> {
    let to = destination
        .trim()
        .parse::<Mailbox>()
        .map_err(|err| PipelineError::delivery(destination, format!("invalid address: {err}")))?;
    let pdf = ContentType::parse("application/pdf")
        .map_err(|err| PipelineError::delivery(destination, err))?;

    let attachment = Attachment::new(filename.to_string()).body(document.to_vec(), pdf);
    let body = MultiPart::alternative_plain_html(plain_note(title), html_note(title));

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(KINDLE_SUBJECT)
        .multipart(MultiPart::mixed().multipart(body).singlepart(attachment))
        .map_err(|err| PipelineError::delivery(destination, err))
}

pub fn plain_note(title: &str) -> String {
    format!("Blog post: {title}")
}

pub fn html_note(title: &str) -> String {
    format!("<p>Blog post: <strong>{}</strong></p>", escape_html(title))
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
