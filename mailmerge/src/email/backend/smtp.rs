//! SMTP backend for sending emails
//!
//! Uses the `lettre` crate to send emails via SMTP servers.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

use crate::email::{Email, EmailError, EmailSender, DEFAULT_ATTACHMENT_TYPE};

/// Gmail's STARTTLS relay
pub const GMAIL_HOST: &str = "smtp.gmail.com";

/// Submission port used with STARTTLS
pub const DEFAULT_PORT: u16 = 587;

/// Reply codes meaning the server refused the login
const AUTH_FAILURE_CODES: [&str; 3] = ["530", "534", "535"];

/// SMTP email backend configuration
#[derive(Clone)]
pub struct SmtpConfig {
    /// SMTP server hostname
    pub host: String,

    /// SMTP server port (usually 587 for STARTTLS)
    pub port: u16,

    /// SMTP username
    pub username: String,

    /// SMTP password
    pub password: String,

    /// Use STARTTLS (default: true)
    pub use_tls: bool,
}

impl SmtpConfig {
    /// Create a STARTTLS configuration for an arbitrary relay
    #[must_use]
    pub fn new<H, U, P>(host: H, port: u16, username: U, password: P) -> Self
    where
        H: Into<String>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            use_tls: true,
        }
    }

    /// Configuration for Gmail (`smtp.gmail.com:587`, STARTTLS)
    ///
    /// Gmail accounts with two-factor authentication need an app password.
    #[must_use]
    pub fn gmail<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self::new(GMAIL_HOST, DEFAULT_PORT, username, password)
    }

    /// Disable STARTTLS
    #[must_use]
    pub const fn without_tls(mut self) -> Self {
        self.use_tls = false;
        self
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("use_tls", &self.use_tls)
            .finish()
    }
}

/// SMTP email backend
///
/// Sends emails via SMTP using the `lettre` crate. A fresh connection is
/// opened for every message and closed when the send completes or fails.
///
/// # Examples
///
/// ```rust,no_run
/// use mailmerge::email::{Email, EmailSender, SmtpBackend, SmtpConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = SmtpBackend::new(SmtpConfig::gmail("me@gmail.com", "app-password"));
///
/// let email = Email::new()
///     .to("user@example.com")
///     .from("me@gmail.com")
///     .subject("Hello!")
///     .text("Hello, World!");
///
/// backend.send(email).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SmtpBackend {
    config: SmtpConfig,
}

impl SmtpBackend {
    /// Create a new SMTP backend with the given configuration
    #[must_use]
    pub const fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Build lettre Message from Email
    fn build_message(email: &Email) -> Result<Message, EmailError> {
        email.validate()?;

        let from_addr = email.from.as_ref().ok_or(EmailError::NoSender)?;
        let from: Mailbox = from_addr
            .parse()
            .map_err(|_| EmailError::InvalidAddress(from_addr.clone()))?;

        let mut builder = Message::builder().from(from);

        for to_addr in &email.to {
            let to: Mailbox = to_addr
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to_addr.clone()))?;
            builder = builder.to(to);
        }

        let subject = email.subject.as_ref().ok_or(EmailError::NoSubject)?;
        builder = builder.subject(subject);

        if email.attachments.is_empty() {
            return match (&email.html, &email.text) {
                (Some(html), Some(text)) => builder.multipart(MultiPart::alternative_plain_html(
                    text.clone(),
                    html.clone(),
                )),
                (Some(html), None) => builder.header(ContentType::TEXT_HTML).body(html.clone()),
                (None, Some(text)) => builder.header(ContentType::TEXT_PLAIN).body(text.clone()),
                (None, None) => return Err(EmailError::NoContent),
            }
            .map_err(|e| EmailError::smtp(e.to_string()));
        }

        let mut mixed = match (&email.html, &email.text) {
            (Some(html), Some(text)) => MultiPart::mixed()
                .multipart(MultiPart::alternative_plain_html(text.clone(), html.clone())),
            (Some(html), None) => MultiPart::mixed().singlepart(SinglePart::html(html.clone())),
            (None, Some(text)) => MultiPart::mixed().singlepart(SinglePart::plain(text.clone())),
            (None, None) => return Err(EmailError::NoContent),
        };

        for attachment in &email.attachments {
            let content_type = ContentType::parse(&attachment.content_type)
                .or_else(|_| ContentType::parse(DEFAULT_ATTACHMENT_TYPE))
                .map_err(|e| EmailError::smtp(e.to_string()))?;
            mixed = mixed.singlepart(
                MimeAttachment::new(attachment.filename.clone())
                    .body(attachment.data.clone(), content_type),
            );
        }

        builder
            .multipart(mixed)
            .map_err(|e| EmailError::smtp(e.to_string()))
    }

    /// Create SMTP transport from config
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let credentials = Credentials::new(
            self.config.username.clone(),
            self.config.password.clone(),
        );

        let mut transport = if self.config.use_tls {
            let tls_parameters = TlsParameters::new(self.config.host.clone())
                .map_err(|e| EmailError::smtp(format!("TLS parameters error: {e}")))?;

            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
                .map_err(|e| EmailError::smtp(e.to_string()))?
                .credentials(credentials)
                .tls(Tls::Required(tls_parameters))
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.host)
                .credentials(credentials)
        };

        transport = transport.port(self.config.port);

        Ok(transport.build())
    }
}

/// Sort a transport failure into the authentication or generic class
fn classify(err: &lettre::transport::smtp::Error) -> EmailError {
    let rejected_login = err
        .status()
        .is_some_and(|code| is_auth_failure_code(&code.to_string()));

    if rejected_login {
        EmailError::authentication(err.to_string())
    } else {
        EmailError::smtp(err.to_string())
    }
}

fn is_auth_failure_code(code: &str) -> bool {
    AUTH_FAILURE_CODES.contains(&code)
}

#[async_trait]
impl EmailSender for SmtpBackend {
    async fn send(&self, email: Email) -> Result<(), EmailError> {
        let message = Self::build_message(&email)?;
        let transport = self.create_transport()?;

        debug!(
            host = %self.config.host,
            port = self.config.port,
            to = ?email.to,
            attachments = email.attachments.len(),
            "Sending email via SMTP"
        );

        transport.send(message).await.map_err(|e| classify(&e))?;

        Ok(())
    }
}
