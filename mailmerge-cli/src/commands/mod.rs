//! CLI command implementations

pub mod bulk;
pub mod documents;
pub mod menu;
pub mod merge_send;
pub mod send;

pub use bulk::BulkCommand;
pub use documents::DocumentsCommand;
pub use menu::MenuCommand;
pub use merge_send::MergeSendCommand;
pub use send::SendCommand;

use anyhow::{Context, Result};
use console::{style, Emoji};
use indicatif::{ProgressBar, ProgressStyle};
use mailmerge::batch::{BatchReport, MergeResult, MergeStatus};

static SUCCESS: Emoji = Emoji("✓", "√");
static WARNING: Emoji = Emoji("⚠", "!");
static FAILURE: Emoji = Emoji("✗", "x");

/// Progress bar sized to the record count
fn progress(len: usize) -> Result<ProgressBar> {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .context("Failed to set progress style")?
            .progress_chars("=> "),
    );
    Ok(bar)
}

/// Print one line per record above the progress bar and advance it
fn tick(bar: &ProgressBar, result: &MergeResult, delivering: bool) {
    bar.println(result_line(result, delivering));
    bar.inc(1);
}

fn result_line(result: &MergeResult, delivering: bool) -> String {
    match &result.status {
        MergeStatus::Success => match (&result.recipient, &result.path) {
            (Some(recipient), _) if delivering => {
                format!("{} Email sent to {}", style(SUCCESS).green(), style(recipient).cyan())
            }
            (_, Some(path)) => format!(
                "{} Document '{}' created",
                style(SUCCESS).green(),
                style(path.display()).cyan()
            ),
            _ => format!("{} {}", style(SUCCESS).green(), result.name),
        },
        MergeStatus::SkippedNoRecipient => format!(
            "{} No email found for record {} ({}), skipping",
            style(WARNING).yellow(),
            result.index + 1,
            result.name
        ),
        MergeStatus::Failed(err) => format!(
            "{} Record {} ({}): {}",
            style(FAILURE).red(),
            result.index + 1,
            result.name,
            style(err).red()
        ),
    }
}

fn print_summary(report: &BatchReport, delivering: bool) {
    println!();
    if report.aborted {
        println!(
            "{} {}",
            style(FAILURE).red(),
            style("Authentication failed. Check your email and password.").red().bold()
        );
    }
    if report.failed() > 0 || report.skipped() > 0 {
        println!(
            "  {} failed, {} skipped",
            style(report.failed()).red(),
            style(report.skipped()).yellow()
        );
    }
    if delivering {
        println!(
            "{}",
            style(format!("Total emails sent: {}", report.sent)).green().bold()
        );
    } else {
        println!(
            "{}",
            style(format!("Documents created: {}", report.succeeded())).green().bold()
        );
    }
}
