//! Create merge documents and email each one

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;
use mailmerge::batch::{DeliveryPlan, MergeBatch};
use mailmerge::engine::MergeEngine;
use mailmerge::source::SourceFormat;
use mailmerge::template::{Template, TextTemplate};

use super::{print_summary, progress, tick};
use crate::prompt;
use crate::session::{load_records, Session};

/// Render the document template per record and email it as an attachment
/// with a personalized HTML body
#[derive(Debug, Default, Args)]
pub struct MergeSendCommand {
    /// Records file (`.json`, `.csv`, `.tsv`, or `-` for JSON on stdin)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Document template
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// HTML body template with `{{field}}` tokens
    #[arg(long)]
    pub body: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Subject line; may contain `{{field}}` tokens
    #[arg(short, long)]
    pub subject: Option<String>,
}

impl MergeSendCommand {
    /// Execute the command
    ///
    /// # Errors
    ///
    /// Returns an error if the data file or a template is missing or
    /// invalid. Per-record failures are reported, not returned.
    pub async fn execute(&self, session: &Session) -> Result<()> {
        let config = &session.config;
        let data = self.data.as_ref().unwrap_or(&config.data.path);
        let template_path = self.template.as_ref().unwrap_or(&config.templates.document);
        let body_path = self.body.as_ref().unwrap_or(&config.templates.body);
        let output = self.output.as_ref().unwrap_or(&config.output.dir);

        // Fail on missing inputs before asking for credentials.
        let body = TextTemplate::open(body_path)?;
        let template = Template::load(template_path)?;
        let records = load_records(data, SourceFormat::Json)?;

        let mailer = session.mailer()?;
        let subject = prompt::text_or_ask(self.subject.clone(), "Enter the email subject")?;
        let plan = DeliveryPlan::new(&mailer.from, TextTemplate::new(subject), body);

        println!(
            "{} {} records from {}",
            style("Merging and sending").green().bold(),
            style(records.len()).cyan(),
            style(data.display()).cyan()
        );

        let bar = progress(records.len())?;
        let report = MergeBatch::new(MergeEngine::new(output), template)
            .deliver(plan, mailer.backend())
            .run_with(&records, |result| tick(&bar, result, true))
            .await;
        bar.finish_and_clear();

        print_summary(&report, true);
        Ok(())
    }
}
