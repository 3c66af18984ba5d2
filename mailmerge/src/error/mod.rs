//! Error types and error handling
//!
//! Errors fall into two groups. Setup errors (`SourceNotFound`,
//! `MalformedData`, `TemplateNotFound`, `Config`) abort an operation before
//! any record is processed. Per-record errors (`Render`, `OutputWrite`,
//! `AttachmentRead`, `DeliveryTransport`) are stored in the record's
//! [`MergeResult`](crate::batch::MergeResult) and the batch moves on.
//! `DeliveryAuth` is observed per record but stops the remaining batch.

use std::path::PathBuf;

use thiserror::Error;

/// Mail merge error type
#[derive(Debug, Error)]
pub enum MergeError {
    /// Data source path does not exist
    #[error("data file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Data source could not be parsed into records
    #[error("malformed data in {source_name}: {message}")]
    MalformedData {
        /// Path or label of the data source
        source_name: String,
        /// Parser diagnostic
        message: String,
    },

    /// Template path does not exist
    #[error("template file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// Structured document template failed to render
    #[error("failed to render document for record {index}: {message}")]
    Render {
        /// Position of the record in the source
        index: usize,
        /// Diagnostic from the document renderer
        message: String,
    },

    /// Artifact could not be written to the output directory
    #[error("failed to write {}: {source}", path.display())]
    OutputWrite {
        /// Target path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Attachment file could not be read
    #[error("failed to read attachment {}: {source}", path.display())]
    AttachmentRead {
        /// Attachment path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Delivery transport rejected the credentials
    #[error("authentication failed: {0}")]
    DeliveryAuth(String),

    /// Delivery failed for this message only
    #[error("failed to send email to {recipient}: {message}")]
    DeliveryTransport {
        /// Address the message was sent to
        recipient: String,
        /// Transport diagnostic
        message: String,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl MergeError {
    /// Create a malformed-data error for the given source
    #[must_use]
    pub fn malformed<S: Into<String>, M: Into<String>>(source_name: S, message: M) -> Self {
        Self::MalformedData {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error from a string message
    #[must_use]
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error must stop the remaining records of a batch
    #[must_use]
    pub const fn is_fatal_to_batch(&self) -> bool {
        matches!(self, Self::DeliveryAuth(_))
    }
}

impl From<figment::Error> for MergeError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T, E = MergeError> = std::result::Result<T, E>;
