//! Email delivery
//!
//! Messages are assembled with the [`Email`] builder and handed to an
//! [`EmailSender`]. Two backends ship with the crate:
//!
//! - [`SmtpBackend`]: STARTTLS relay via `lettre` (Gmail by default)
//! - [`ConsoleBackend`]: prints the message instead of sending it, for dry runs
//!
//! # Examples
//!
//! ```rust,no_run
//! use mailmerge::email::{Attachment, Email, EmailSender, SmtpBackend, SmtpConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SmtpBackend::new(SmtpConfig::gmail("me@gmail.com", "app-password"));
//!
//! let email = Email::new()
//!     .to("amy@example.com")
//!     .from("me@gmail.com")
//!     .subject("Your letter")
//!     .html("<p>Hello Amy, your letter is attached.</p>")
//!     .attach(Attachment::from_path("output/7_Amy.docx")?);
//!
//! backend.send(email).await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod builder;
mod error;
mod sender;

pub use backend::{
    console::ConsoleBackend,
    smtp::{SmtpBackend, SmtpConfig, DEFAULT_PORT, GMAIL_HOST},
};
pub use builder::{Attachment, Email, DEFAULT_ATTACHMENT_TYPE};
pub use error::EmailError;
pub use sender::EmailSender;

#[cfg(test)]
pub use sender::MockEmailSender;
