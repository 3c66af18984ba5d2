//! Create merge documents

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;
use mailmerge::batch::MergeBatch;
use mailmerge::engine::MergeEngine;
use mailmerge::source::SourceFormat;
use mailmerge::template::Template;

use super::{print_summary, progress, tick};
use crate::session::{load_records, Session};

/// Render the document template once per record
#[derive(Debug, Default, Args)]
pub struct DocumentsCommand {
    /// Records file (`.json`, `.csv`, `.tsv`, or `-` for JSON on stdin)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Document template (`.docx`) or text template
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl DocumentsCommand {
    /// Execute the command
    ///
    /// # Errors
    ///
    /// Returns an error if the data file or template is missing or invalid.
    /// Per-record failures are reported, not returned.
    pub async fn execute(&self, session: &Session) -> Result<()> {
        let config = &session.config;
        let data = self.data.as_ref().unwrap_or(&config.data.path);
        let template_path = self.template.as_ref().unwrap_or(&config.templates.document);
        let output = self.output.as_ref().unwrap_or(&config.output.dir);

        println!(
            "{} {} {}",
            style("Merging").green().bold(),
            style(data.display()).cyan(),
            style(format!("into {}", template_path.display())).dim()
        );

        let template = Template::load(template_path)?;
        let records = load_records(data, SourceFormat::Json)?;

        let bar = progress(records.len())?;
        let report = MergeBatch::new(MergeEngine::new(output), template)
            .run_with(&records, |result| tick(&bar, result, false))
            .await;
        bar.finish_and_clear();

        print_summary(&report, false);
        Ok(())
    }
}
