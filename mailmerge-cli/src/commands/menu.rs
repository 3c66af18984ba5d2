//! Interactive menu

use anyhow::Result;
use console::style;
use dialoguer::{theme::ColorfulTheme, Select};

use super::{BulkCommand, DocumentsCommand, MergeSendCommand, SendCommand, FAILURE};
use crate::session::Session;

const ITEMS: [&str; 5] = [
    "Create Mail Merge Document",
    "Send Single Email",
    "Send Bulk Emails",
    "Send Mail Merge Documents via Email",
    "Exit",
];

/// Offer every operation until the user exits
#[derive(Debug, Default)]
pub struct MenuCommand;

impl MenuCommand {
    /// Execute the command
    ///
    /// Errors from an operation are printed and the menu is shown again.
    ///
    /// # Errors
    ///
    /// Returns an error only if the terminal cannot be read
    pub async fn execute(&self, session: &Session) -> Result<()> {
        loop {
            println!();
            println!("{}", style("=".repeat(50)).dim());
            println!("{}", style("       MAIL MERGE & EMAIL APPLICATION").bold());
            println!("{}", style("=".repeat(50)).dim());

            let choice = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("Select an option")
                .items(&ITEMS)
                .default(0)
                .interact()?;

            println!("\n{}", style(format!("--- {} ---", ITEMS[choice])).bold());

            let outcome = match choice {
                0 => DocumentsCommand::default().execute(session).await,
                1 => SendCommand::default().execute(session).await,
                2 => BulkCommand::default().execute(session).await,
                3 => MergeSendCommand::default().execute(session).await,
                _ => {
                    println!("Thank you for using Mail Merge & Email Application. Goodbye!");
                    return Ok(());
                }
            };

            if let Err(err) = outcome {
                println!("{} {}", style(FAILURE).red(), style(format!("{err:#}")).red());
            }
        }
    }
}
