//! Email builder with fluent API
//!
//! Provides a convenient builder pattern for constructing emails.

use std::path::Path;

use super::EmailError;

/// Content type used when an attachment does not specify one
pub const DEFAULT_ATTACHMENT_TYPE: &str = "application/octet-stream";

/// A file attached to an email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name shown to the recipient
    pub filename: String,

    /// MIME content type
    pub content_type: String,

    /// File contents
    pub data: Vec<u8>,
}

impl Attachment {
    /// Create an attachment with the default content type
    #[must_use]
    pub fn new<S: Into<String>>(filename: S, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: DEFAULT_ATTACHMENT_TYPE.to_string(),
            data,
        }
    }

    /// Read an attachment from disk, named after the file's base name
    ///
    /// # Errors
    ///
    /// Returns `EmailError::IoError` if the file cannot be read
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, EmailError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map_or_else(|| "attachment".to_string(), |name| name.to_string_lossy().into_owned());
        Ok(Self::new(filename, data))
    }

    /// Set the content type
    #[must_use]
    pub fn content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// An email message
///
/// Use the builder pattern to construct emails:
///
/// ```rust
/// use mailmerge::email::Email;
///
/// let email = Email::new()
///     .to("user@example.com")
///     .from("sender@example.com")
///     .subject("Your documents")
///     .html("<p>Hello Amy</p>");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Email {
    /// Email recipients (To)
    pub to: Vec<String>,

    /// Email sender (From)
    pub from: Option<String>,

    /// Email subject
    pub subject: Option<String>,

    /// Plain text body
    pub text: Option<String>,

    /// HTML body
    pub html: Option<String>,

    /// Attached files
    pub attachments: Vec<Attachment>,
}

impl Email {
    /// Create a new empty email
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a recipient (To)
    #[must_use]
    pub fn to(mut self, address: &str) -> Self {
        self.to.push(address.to_string());
        self
    }

    /// Set the sender (From)
    #[must_use]
    pub fn from(mut self, address: &str) -> Self {
        self.from = Some(address.to_string());
        self
    }

    /// Set the email subject
    #[must_use]
    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    /// Set the plain text body
    #[must_use]
    pub fn text(mut self, body: &str) -> Self {
        self.text = Some(body.to_string());
        self
    }

    /// Set the HTML body
    #[must_use]
    pub fn html(mut self, body: &str) -> Self {
        self.html = Some(body.to_string());
        self
    }

    /// Attach a file
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mailmerge::email::{Attachment, Email};
    ///
    /// let email = Email::new()
    ///     .attach(Attachment::new("7_Amy.docx", vec![0x50, 0x4b]));
    /// assert_eq!(email.attachments.len(), 1);
    /// ```
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Validate the email
    ///
    /// Checks that all required fields are present
    ///
    /// # Errors
    ///
    /// Returns errors if:
    /// - No recipients
    /// - No sender
    /// - No subject
    /// - No content (text or HTML)
    pub fn validate(&self) -> Result<(), EmailError> {
        if self.to.is_empty() {
            return Err(EmailError::NoRecipients);
        }

        if self.from.is_none() {
            return Err(EmailError::NoSender);
        }

        if self.subject.is_none() {
            return Err(EmailError::NoSubject);
        }

        if self.text.is_none() && self.html.is_none() {
            return Err(EmailError::NoContent);
        }

        Ok(())
    }
}
