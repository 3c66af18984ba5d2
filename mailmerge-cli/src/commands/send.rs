//! Send a single email

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;
use mailmerge::email::{Attachment, Email};
use tracing::warn;

use crate::prompt;
use crate::session::Session;

/// Send one plain-text email with an optional attachment
#[derive(Debug, Default, Args)]
pub struct SendCommand {
    /// Recipient address
    #[arg(long)]
    pub to: Option<String>,

    /// Subject line
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Message body
    #[arg(short, long)]
    pub body: Option<String>,

    /// File to attach; ignored if it does not exist
    #[arg(short, long)]
    pub attachment: Option<PathBuf>,
}

impl SendCommand {
    /// Execute the command
    ///
    /// # Errors
    ///
    /// Returns an error if a prompt fails, the attachment exists but cannot be
    /// read, or the transport rejects the message
    pub async fn execute(&self, session: &Session) -> Result<()> {
        let mailer = session.mailer()?;
        let to = prompt::text_or_ask(self.to.clone(), "Enter the recipient's email address")?;
        let subject = prompt::text_or_ask(self.subject.clone(), "Enter the email subject")?;
        let body = prompt::text_or_ask(self.body.clone(), "Enter the email body")?;
        let attachment = match &self.attachment {
            Some(path) => Some(path.clone()),
            // Scripted invocations are never prompted for the optional attachment
            None if self.to.is_some() => None,
            None => prompt::optional("Enter the path to the attachment (leave blank if no attachment)")?
                .map(PathBuf::from),
        };

        let mut email = Email::new().to(&to).from(&mailer.from).subject(&subject).text(&body);

        match attachment {
            Some(path) if path.exists() => email = email.attach(Attachment::from_path(&path)?),
            Some(path) => warn!(path = %path.display(), "Attachment not found, sending without it"),
            None => {}
        }

        match mailer.backend().send(email).await {
            Ok(()) => {
                println!(
                    "{} Email sent successfully to {}!",
                    style("✓").green(),
                    style(&to).cyan()
                );
                Ok(())
            }
            Err(err) if err.is_authentication() => {
                anyhow::bail!("Authentication failed. Check your email and password.")
            }
            Err(err) => anyhow::bail!("Failed to send email: {err}"),
        }
    }
}
