//! Testing utilities
//!
//! A recording [`EmailSender`] with scriptable failures and helpers for
//! building `.docx` fixtures in memory.
//!
//! # Examples
//!
//! ```rust
//! use mailmerge::email::{Email, EmailSender};
//! use mailmerge::testing::RecordingSender;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sender = RecordingSender::new().fail_transport_for("bounce@example.com");
//!
//! let email = Email::new()
//!     .to("user@example.com")
//!     .from("me@gmail.com")
//!     .subject("Test")
//!     .text("Hello");
//!
//! sender.send(email).await?;
//!
//! assert_eq!(sender.sent_count(), 1);
//! assert!(sender.was_sent_to("user@example.com"));
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::email::{Email, EmailError, EmailSender};

#[derive(Debug, Default)]
struct Recorded {
    sent: Vec<Email>,
    attempts: Vec<String>,
}

/// Email sender that records deliveries in memory
///
/// Recipients registered with [`fail_auth_for`](Self::fail_auth_for) get an
/// authentication error, those registered with
/// [`fail_transport_for`](Self::fail_transport_for) a generic SMTP error.
/// Every call, failed or not, is recorded as an attempt.
#[derive(Debug, Clone, Default)]
pub struct RecordingSender {
    state: Arc<Mutex<Recorded>>,
    auth_failures: HashSet<String>,
    transport_failures: HashSet<String>,
}

impl RecordingSender {
    /// Create a sender that accepts every valid email
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject sends to `address` with an authentication error
    #[must_use]
    pub fn fail_auth_for(mut self, address: &str) -> Self {
        self.auth_failures.insert(address.to_string());
        self
    }

    /// Reject sends to `address` with a transport error
    #[must_use]
    pub fn fail_transport_for(mut self, address: &str) -> Self {
        self.transport_failures.insert(address.to_string());
        self
    }

    /// Get the number of emails delivered
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned (should never happen in tests)
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.state.lock().unwrap().sent.len()
    }

    /// Get all delivered emails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned (should never happen in tests)
    #[must_use]
    pub fn sent_emails(&self) -> Vec<Email> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Recipients of every send call, in call order
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned (should never happen in tests)
    #[must_use]
    pub fn attempts(&self) -> Vec<String> {
        self.state.lock().unwrap().attempts.clone()
    }

    /// Check if an email was delivered to a specific address
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned (should never happen in tests)
    #[must_use]
    pub fn was_sent_to(&self, address: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .any(|email| email.to.iter().any(|to| to == address))
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    #[allow(clippy::significant_drop_tightening)]
    async fn send(&self, email: Email) -> Result<(), EmailError> {
        email.validate()?;

        let recipient = email.to.join(", ");
        let mut state = self.state.lock().unwrap();
        state.attempts.push(recipient.clone());

        if email.to.iter().any(|to| self.auth_failures.contains(to)) {
            return Err(EmailError::authentication(format!(
                "535 5.7.8 Username and Password not accepted ({recipient})"
            )));
        }
        if email.to.iter().any(|to| self.transport_failures.contains(to)) {
            return Err(EmailError::smtp(format!("550 mailbox unavailable: {recipient}")));
        }

        state.sent.push(email);
        Ok(())
    }
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

/// Build a minimal `.docx` archive whose `word/document.xml` is `document_xml`
///
/// # Panics
///
/// Panics if the in-memory archive cannot be written (should never happen)
#[must_use]
pub fn docx_fixture(document_xml: &str) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("word/document.xml", document_xml),
    ] {
        writer.start_file(name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

/// Read one part of a `.docx` archive as text
///
/// Returns `None` if the bytes are not an archive or the part is missing.
#[must_use]
pub fn docx_part(bytes: &[u8], name: &str) -> Option<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).ok()?;
    let mut file = archive.by_name(name).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    Some(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_to(address: &str) -> Email {
        Email::new()
            .to(address)
            .from("me@gmail.com")
            .subject("Test")
            .text("Hello")
    }

    #[tokio::test]
    async fn test_records_successful_sends() {
        let sender = RecordingSender::new();

        for i in 0..3 {
            sender.send(email_to(&format!("user{i}@example.com"))).await.unwrap();
        }

        assert_eq!(sender.sent_count(), 3);
        assert!(sender.was_sent_to("user0@example.com"));
        assert!(sender.was_sent_to("user2@example.com"));
        assert!(!sender.was_sent_to("user3@example.com"));
    }

    #[tokio::test]
    async fn test_scripted_failures_are_attempts_not_sends() {
        let sender = RecordingSender::new()
            .fail_auth_for("locked@example.com")
            .fail_transport_for("bounce@example.com");

        let auth = sender.send(email_to("locked@example.com")).await;
        assert!(matches!(auth, Err(EmailError::Authentication(_))));

        let transport = sender.send(email_to("bounce@example.com")).await;
        assert!(matches!(transport, Err(EmailError::SmtpError(_))));

        assert_eq!(sender.sent_count(), 0);
        assert_eq!(
            sender.attempts(),
            vec!["locked@example.com", "bounce@example.com"]
        );
    }

    #[tokio::test]
    async fn test_clones_share_recordings() {
        let sender = RecordingSender::new();
        let handle = sender.clone();

        sender.send(email_to("a@example.com")).await.unwrap();
        assert_eq!(handle.sent_count(), 1);
    }

    #[test]
    fn test_docx_fixture_round_trip() {
        let bytes = docx_fixture("<w:document/>");
        assert_eq!(docx_part(&bytes, "word/document.xml").as_deref(), Some("<w:document/>"));
        assert!(docx_part(&bytes, "word/missing.xml").is_none());
        assert!(docx_part(b"garbage", "word/document.xml").is_none());
    }
}
