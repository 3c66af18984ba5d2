//! Console backend for dry runs
//!
//! Prints emails to the console instead of sending them, so a merge can be
//! checked end to end without SMTP credentials.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::email::{Email, EmailError, EmailSender};

const WIDTH: usize = 51;

/// Console email backend
///
/// # Examples
///
/// ```rust
/// use mailmerge::email::{ConsoleBackend, Email, EmailSender};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = ConsoleBackend::new();
///
/// let email = Email::new()
///     .to("user@example.com")
///     .from("me@gmail.com")
///     .subject("Hello!")
///     .text("Hello, World!");
///
/// backend.send(email).await?; // Prints to console
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConsoleBackend {
    /// Whether to print the summary box to stdout
    quiet: bool,
}

impl ConsoleBackend {
    /// Create a new console backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only log through `tracing`; print nothing to stdout
    #[must_use]
    pub const fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }
}

fn truncate(line: &str) -> String {
    if line.chars().count() > WIDTH {
        let head: String = line.chars().take(WIDTH - 3).collect();
        format!("{head}...")
    } else {
        line.to_string()
    }
}

#[async_trait]
impl EmailSender for ConsoleBackend {
    async fn send(&self, email: Email) -> Result<(), EmailError> {
        email.validate()?;

        let from = email.from.as_ref().ok_or(EmailError::NoSender)?;
        let subject = email.subject.as_ref().ok_or(EmailError::NoSubject)?;
        let attachments: Vec<&str> = email
            .attachments
            .iter()
            .map(|attachment| attachment.filename.as_str())
            .collect();

        info!(
            from = %from,
            to = ?email.to,
            subject = %subject,
            attachments = ?attachments,
            "Console email sent"
        );

        if let Some(text) = &email.text {
            debug!(text = %text, "Email text content");
        }
        if let Some(html) = &email.html {
            debug!(html = %html, "Email HTML content");
        }

        if self.quiet {
            return Ok(());
        }

        println!("\n╭─────────────────────────────────────────────────────╮");
        println!("│ Console Email (not sent)                            │");
        println!("├─────────────────────────────────────────────────────┤");
        println!("│ From:    {:<43} │", truncate(from));
        println!("│ To:      {:<43} │", truncate(&email.to.join(", ")));
        println!("│ Subject: {:<43} │", truncate(subject));
        for attachment in &email.attachments {
            let line = format!("{} ({} bytes)", attachment.filename, attachment.data.len());
            println!("│ Attach:  {:<43} │", truncate(&line));
        }
        println!("├─────────────────────────────────────────────────────┤");

        let body = email.text.as_deref().or(email.html.as_deref()).unwrap_or_default();
        for line in body.lines().take(5) {
            println!("│ {:<51} │", truncate(line));
        }
        if body.lines().count() > 5 {
            println!("│ ... (truncated)                                     │");
        }

        println!("╰─────────────────────────────────────────────────────╯\n");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::Attachment;

    #[tokio::test]
    async fn test_console_backend_send() {
        let backend = ConsoleBackend::new();

        let email = Email::new()
            .to("user@example.com")
            .from("me@gmail.com")
            .subject("Test Email")
            .text("This is a test email")
            .attach(Attachment::new("7_Amy.docx", vec![1, 2, 3]));

        assert!(backend.send(email).await.is_ok());
    }

    #[tokio::test]
    async fn test_console_backend_quiet() {
        let backend = ConsoleBackend::new().quiet();

        let email = Email::new()
            .to("user@example.com")
            .from("me@gmail.com")
            .subject("Test Email")
            .html("<h1>This is HTML</h1>");

        assert!(backend.send(email).await.is_ok());
    }

    #[tokio::test]
    async fn test_console_backend_rejects_invalid_email() {
        let backend = ConsoleBackend::new().quiet();
        let email = Email::new().from("me@gmail.com").subject("Test").text("Hi");

        assert!(matches!(
            backend.send(email).await,
            Err(EmailError::NoRecipients)
        ));
    }

    #[test]
    fn test_truncate_long_lines() {
        let long = "x".repeat(80);
        let short = truncate(&long);
        assert_eq!(short.chars().count(), WIDTH);
        assert!(short.ends_with("..."));
        assert_eq!(truncate("short"), "short");
    }
}
