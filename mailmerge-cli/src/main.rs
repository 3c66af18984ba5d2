//! mailmerge CLI tool

mod commands;
mod prompt;
mod session;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{BulkCommand, DocumentsCommand, MenuCommand, MergeSendCommand, SendCommand};
use mailmerge::config::MailMergeConfig;
use mailmerge::observability;
use session::Session;

#[derive(Parser)]
#[command(name = "mailmerge")]
#[command(version)]
#[command(about = "Create personalized documents from a template and email them", long_about = None)]
struct Cli {
    /// Configuration file (replaces ./mailmerge.toml and the user config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print emails instead of sending them
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create mail merge documents
    Documents(DocumentsCommand),
    /// Send a single email
    Send(SendCommand),
    /// Send bulk emails from CSV data
    Bulk(BulkCommand),
    /// Create mail merge documents and send them via email
    MergeSend(MergeSendCommand),
    /// Interactive menu (default)
    Menu,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MailMergeConfig::load_from(path)?,
        None => MailMergeConfig::load()?,
    };
    observability::init(&config.logging)?;

    let session = Session::new(config, cli.dry_run);

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Documents(cmd) => cmd.execute(&session).await?,
        Commands::Send(cmd) => cmd.execute(&session).await?,
        Commands::Bulk(cmd) => cmd.execute(&session).await?,
        Commands::MergeSend(cmd) => cmd.execute(&session).await?,
        Commands::Menu => MenuCommand.execute(&session).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_menu() {
        let cli = Cli::try_parse_from(["mailmerge"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "mailmerge",
            "merge-send",
            "--subject",
            "Your letter",
            "--dry-run",
            "--config",
            "custom.toml",
        ])
        .unwrap();

        assert!(cli.dry_run);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Some(Commands::MergeSend(cmd)) => assert_eq!(cmd.subject.as_deref(), Some("Your letter")),
            _ => panic!("expected merge-send"),
        }
    }

    #[test]
    fn test_documents_flags() {
        let cli = Cli::try_parse_from([
            "mailmerge", "documents", "-d", "people.csv", "-t", "letter.docx", "-o", "letters",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Documents(cmd)) => {
                assert_eq!(cmd.data, Some(PathBuf::from("people.csv")));
                assert_eq!(cmd.template, Some(PathBuf::from("letter.docx")));
                assert_eq!(cmd.output, Some(PathBuf::from("letters")));
            }
            _ => panic!("expected documents"),
        }
    }
}
