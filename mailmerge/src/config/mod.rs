//! Configuration management
//!
//! Settings are layered with `figment`, later sources overriding earlier ones:
//!
//! 1. Hardcoded defaults
//! 2. `~/.config/mailmerge/config.toml` (user config, XDG)
//! 3. `./mailmerge.toml` (project config)
//! 4. Environment variables (`MAILMERGE_` prefix, `__` for nesting)
//!
//! An explicit file passed to [`MailMergeConfig::load_from`] replaces layers
//! 2 and 3.
//!
//! # Example Configuration
//!
//! ```toml
//! # mailmerge.toml
//! [data]
//! path = "recipients.csv"
//!
//! [templates]
//! document = "letter.docx"
//! body = "message.html"
//!
//! [output]
//! dir = "letters"
//!
//! [smtp]
//! host = "smtp.gmail.com"
//! port = 587
//! username = "me@gmail.com"
//!
//! [logging]
//! format = "pretty"
//! filter = "warn,mailmerge=debug"
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use mailmerge::config::MailMergeConfig;
//!
//! # fn example() -> mailmerge::error::Result<()> {
//! let config = MailMergeConfig::load()?;
//! let port = config.smtp.port;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::email::SmtpConfig;
use crate::error::{MergeError, Result};

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "MAILMERGE_";

/// Project-local configuration file
pub const LOCAL_CONFIG_FILE: &str = "mailmerge.toml";

/// Data source settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Records file (`.json`, `.csv` or `.tsv`)
    pub path: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data.json"),
        }
    }
}

/// Template locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Document template merged per record
    pub document: PathBuf,

    /// Email body template (HTML) for merge-and-send
    pub body: PathBuf,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            document: PathBuf::from("template.docx"),
            body: PathBuf::from("template.html"),
        }
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory merged documents are written to
    pub dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

/// SMTP connection settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    /// SMTP server hostname
    pub host: String,

    /// SMTP server port
    pub port: u16,

    /// Use STARTTLS
    pub use_tls: bool,

    /// Login, also used as the sender address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password; prompted for when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: crate::email::GMAIL_HOST.to_string(),
            port: crate::email::DEFAULT_PORT,
            use_tls: true,
            username: None,
            password: None,
        }
    }
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_tls", &self.use_tls)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl SmtpSettings {
    /// Backend configuration for the given credentials
    #[must_use]
    pub fn backend_config(&self, username: &str, password: &str) -> SmtpConfig {
        let config = SmtpConfig::new(self.host.clone(), self.port, username, password);
        if self.use_tls {
            config
        } else {
            config.without_tls()
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human-oriented
    Pretty,
    /// Single-line, human-oriented
    #[default]
    Compact,
    /// Newline-delimited JSON
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Output format
    pub format: LogFormat,

    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: "warn,mailmerge=info".to_string(),
        }
    }
}

/// Complete mail merge configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMergeConfig {
    /// Data source settings
    #[serde(default)]
    pub data: DataSettings,

    /// Template settings
    #[serde(default)]
    pub templates: TemplateSettings,

    /// Output settings
    #[serde(default)]
    pub output: OutputSettings,

    /// SMTP settings
    #[serde(default)]
    pub smtp: SmtpSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl MailMergeConfig {
    /// Load configuration from the standard locations
    ///
    /// # Errors
    ///
    /// Returns `MergeError::Config` if a configuration file cannot be parsed
    /// or a value has the wrong type
    pub fn load() -> Result<Self> {
        let mut figment = Self::defaults();

        if let Some(user_config) = Self::recommended_path() {
            if user_config.exists() {
                figment = figment.merge(Toml::file(&user_config));
            }
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        Self::extract(figment.merge(Self::env()))
    }

    /// Load configuration from a specific file plus environment overrides
    ///
    /// # Errors
    ///
    /// Returns `MergeError::Config` if the file does not exist, cannot be
    /// parsed, or a value has the wrong type
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MergeError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        Self::extract(Self::defaults().merge(Toml::file(path)).merge(Self::env()))
    }

    /// Parse configuration from a TOML string over the defaults
    ///
    /// Environment variables are not consulted.
    ///
    /// # Errors
    ///
    /// Returns `MergeError::Config` if the TOML is invalid or a value has the
    /// wrong type
    pub fn from_toml(content: &str) -> Result<Self> {
        Self::extract(Self::defaults().merge(Toml::string(content)))
    }

    /// XDG location of the user configuration file
    ///
    /// ```rust
    /// use mailmerge::config::MailMergeConfig;
    ///
    /// if let Some(path) = MailMergeConfig::recommended_path() {
    ///     assert!(path.ends_with("mailmerge/config.toml"));
    /// }
    /// ```
    #[must_use]
    pub fn recommended_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mailmerge").join("config.toml"))
    }

    fn defaults() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
    }

    fn env() -> Env {
        Env::prefixed(ENV_PREFIX).split("__").lowercase(true)
    }

    fn extract(figment: Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MailMergeConfig::default();
        assert_eq!(config.data.path, PathBuf::from("data.json"));
        assert_eq!(config.templates.document, PathBuf::from("template.docx"));
        assert_eq!(config.templates.body, PathBuf::from("template.html"));
        assert_eq!(config.output.dir, PathBuf::from("output"));
        assert_eq!(config.smtp.host, "smtp.gmail.com");
        assert_eq!(config.smtp.port, 587);
        assert!(config.smtp.use_tls);
        assert!(config.smtp.password.is_none());
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.filter, "warn,mailmerge=info");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = MailMergeConfig::from_toml(
            r#"
[data]
path = "people.csv"

[smtp]
port = 2525
username = "me@example.com"

[logging]
format = "json"
"#,
        )
        .unwrap();

        assert_eq!(config.data.path, PathBuf::from("people.csv"));
        assert_eq!(config.smtp.port, 2525);
        assert_eq!(config.smtp.host, "smtp.gmail.com");
        assert_eq!(config.smtp.username.as_deref(), Some("me@example.com"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.output.dir, PathBuf::from("output"));
    }

    #[test]
    fn test_invalid_value_is_config_error() {
        let result = MailMergeConfig::from_toml("[smtp]\nport = \"not a port\"\n");
        assert!(matches!(result, Err(MergeError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[output]\ndir = \"letters\"\n").unwrap();

        let config = MailMergeConfig::load_from(&path).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("letters"));
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = MailMergeConfig::load_from("/nonexistent/path/mailmerge.toml");
        assert!(matches!(result, Err(MergeError::Config(msg)) if msg.contains("not found")));
    }

    #[test]
    fn test_smtp_debug_hides_password() {
        let settings = SmtpSettings {
            password: Some("hunter2".to_string()),
            ..SmtpSettings::default()
        };
        assert!(!format!("{settings:?}").contains("hunter2"));
    }

    #[test]
    fn test_backend_config_honors_tls_flag() {
        let settings = SmtpSettings {
            host: "localhost".to_string(),
            port: 1025,
            use_tls: false,
            ..SmtpSettings::default()
        };

        let config = settings.backend_config("me", "secret");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 1025);
        assert!(!config.use_tls);
    }
}
