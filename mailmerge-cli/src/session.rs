//! Shared state for one CLI invocation

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use mailmerge::config::MailMergeConfig;
use mailmerge::email::{ConsoleBackend, EmailSender, SmtpBackend};
use mailmerge::record::Record;
use mailmerge::source::{RecordSource, SourceFormat};

use crate::prompt;

/// Configuration plus global flags
#[derive(Debug)]
pub struct Session {
    pub config: MailMergeConfig,
    pub dry_run: bool,
}

/// A ready-to-use sender and the address mail is sent from
pub struct Mailer {
    pub from: String,
    backend: Box<dyn EmailSender>,
}

impl Mailer {
    pub fn backend(&self) -> &dyn EmailSender {
        self.backend.as_ref()
    }
}

impl Session {
    pub const fn new(config: MailMergeConfig, dry_run: bool) -> Self {
        Self { config, dry_run }
    }

    /// Resolve credentials from config or prompts and build the sender
    ///
    /// Dry runs only need the sender address.
    pub fn mailer(&self) -> Result<Mailer> {
        let smtp = &self.config.smtp;
        let from = prompt::text_or_ask(smtp.username.clone(), "Enter your email address")?;

        if self.dry_run {
            println!(
                "{} dry run: emails are printed, not sent",
                style("ℹ").cyan()
            );
            return Ok(Mailer {
                from,
                backend: Box::new(ConsoleBackend::new()),
            });
        }

        let password = match &smtp.password {
            Some(password) => password.clone(),
            None => prompt::password("Enter your email password (or app-specific password)")?,
        };

        Ok(Mailer {
            backend: Box::new(SmtpBackend::new(smtp.backend_config(&from, &password))),
            from,
        })
    }
}

/// Load records from a file, or from stdin when `path` is `-`
pub fn load_records(path: &Path, stdin_format: SourceFormat) -> Result<Vec<Record>> {
    if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read records from stdin")?;
        return Ok(RecordSource::load_from_str(&content, stdin_format)?);
    }

    Ok(RecordSource::load(path)?)
}
