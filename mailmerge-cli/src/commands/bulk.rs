//! Bulk email from tabular data

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;
use mailmerge::batch::{AttachmentSource, BodyKind, DeliveryPlan, MergeBatch};
use mailmerge::engine::RecipientPolicy;
use mailmerge::source::{SourceFormat, TabularOptions};
use mailmerge::template::TextTemplate;

use super::{print_summary, result_line};
use crate::prompt;
use crate::session::{load_records, Session};

/// Email every row of a CSV file, personalizing the body with `{{column}}`
/// tokens and attaching the same file to each message
#[derive(Debug, Default, Args)]
pub struct BulkCommand {
    /// Recipient data file (`.csv`, `.tsv`, or `-` for CSV on stdin)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Subject line
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Plain-text body with `{{column}}` tokens
    #[arg(short, long)]
    pub body: Option<String>,

    /// File attached to every email
    #[arg(short, long)]
    pub attachment: Option<PathBuf>,
}

impl BulkCommand {
    /// Execute the command
    ///
    /// # Errors
    ///
    /// Returns an error if the data file or attachment is missing, or a
    /// prompt fails. Per-recipient failures are reported, not returned.
    pub async fn execute(&self, session: &Session) -> Result<()> {
        let mailer = session.mailer()?;

        let data = match &self.data {
            Some(path) => path.clone(),
            None => PathBuf::from(prompt::text_or_ask(
                None,
                "Enter the path to your recipient data file (CSV)",
            )?),
        };
        let records = load_records(&data, SourceFormat::Tabular(TabularOptions::default()))?;

        let subject = prompt::text_or_ask(self.subject.clone(), "Enter the email subject")?;
        let body = prompt::text_or_ask(self.body.clone(), "Enter the email body")?;
        let attachment = match &self.attachment {
            Some(path) => path.clone(),
            None => PathBuf::from(prompt::text_or_ask(
                None,
                "Enter the path to the attachment file",
            )?),
        };
        if !attachment.is_file() {
            anyhow::bail!("Attachment file not found: {}", attachment.display());
        }

        let plan = DeliveryPlan::new(&mailer.from, TextTemplate::new(subject), TextTemplate::new(body))
            .body_kind(BodyKind::Plain)
            .attachment(AttachmentSource::Path(TextTemplate::new(
                attachment.display().to_string(),
            )))
            .recipients(RecipientPolicy::FirstColumnFallback);

        println!(
            "{} {} recipients",
            style("Sending to").green().bold(),
            style(records.len()).cyan()
        );

        let report = MergeBatch::run_text_only(&plan, mailer.backend(), &records).await;
        for result in &report.results {
            println!("{}", result_line(result, true));
        }

        print_summary(&report, true);
        Ok(())
    }
}
