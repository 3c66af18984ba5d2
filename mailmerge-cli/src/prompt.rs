//! Interactive prompts
//!
//! Thin wrappers over `dialoguer` so commands can fall back to asking when a
//! value was not given on the command line.

use std::path::{Path, PathBuf};

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, Password};

/// Use `value` if given, otherwise ask for a non-empty answer
pub fn text_or_ask(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Ok(Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .interact_text()?),
    }
}

/// Ask for an answer that may be left blank
pub fn optional(prompt: &str) -> Result<Option<String>> {
    let answer: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    let answer = answer.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}

/// Use `value` if given, otherwise ask with `default` pre-filled
pub fn path_or_ask(value: Option<PathBuf>, prompt: &str, default: &Path) -> Result<PathBuf> {
    match value {
        Some(path) => Ok(path),
        None => {
            let answer: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .default(default.display().to_string())
                .interact_text()?;
            Ok(PathBuf::from(answer))
        }
    }
}

/// Ask for a password without echoing it
pub fn password(prompt: &str) -> Result<String> {
    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact()?;
    // Copy-pasted app passwords often carry non-breaking spaces.
    Ok(password.replace('\u{a0}', ""))
}
