//! Email sender trait abstraction
//!
//! This module defines the core `EmailSender` trait that all delivery backends
//! implement.

use async_trait::async_trait;

use super::{Email, EmailError};

/// Trait for sending emails
///
/// One call is one delivery attempt. The outcome is three-way: `Ok(())`,
/// `Err(EmailError::Authentication(_))` when the credentials were rejected,
/// or any other `Err` for a failure that only concerns this message.
///
/// # Examples
///
/// ```rust,no_run
/// use mailmerge::email::{Email, EmailSender, SmtpBackend, SmtpConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sender = SmtpBackend::new(SmtpConfig::gmail("me@gmail.com", "app-password"));
///
/// let email = Email::new()
///     .to("user@example.com")
///     .from("me@gmail.com")
///     .subject("Hello!")
///     .text("Hello, World!");
///
/// sender.send(email).await?;
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send an email
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the email cannot be sent or is invalid
    async fn send(&self, email: Email) -> Result<(), EmailError>;
}
