//! Logging
//!
//! Installs a `tracing-subscriber` registry writing to stderr, so stdout stays
//! free for command output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingSettings};
use crate::error::{MergeError, Result};

/// Initialize logging
///
/// `RUST_LOG` takes precedence over the configured filter.
///
/// # Errors
///
/// Returns `MergeError::Config` if the configured filter is not a valid
/// directive or a global subscriber is already installed
///
/// # Example
///
/// ```rust,no_run
/// use mailmerge::config::LoggingSettings;
/// use mailmerge::observability;
///
/// # fn main() -> mailmerge::error::Result<()> {
/// observability::init(&LoggingSettings::default())?;
/// tracing::info!("Mail merge started");
/// # Ok(())
/// # }
/// ```
pub fn init(settings: &LoggingSettings) -> Result<()> {
    let env_filter = build_filter(settings)?;
    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let installed = match settings.format {
        LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
        LogFormat::Compact => registry.with(layer.compact()).try_init(),
        LogFormat::Json => registry.with(layer.json()).try_init(),
    };

    installed.map_err(|e| MergeError::config(format!("failed to install logger: {e}")))
}

fn build_filter(settings: &LoggingSettings) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(&settings.filter)
        .map_err(|e| MergeError::config(format!("invalid log filter '{}': {e}", settings.filter)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(&LoggingSettings::default().filter).is_ok());
    }

    #[test]
    fn test_invalid_filter_is_config_error() {
        let settings = LoggingSettings {
            filter: "mailmerge=notalevel".to_string(),
            ..LoggingSettings::default()
        };

        if std::env::var_os("RUST_LOG").is_none() {
            assert!(matches!(build_filter(&settings), Err(MergeError::Config(_))));
        }
    }
}
