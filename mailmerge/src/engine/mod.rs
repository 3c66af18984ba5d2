//! Merge engine
//!
//! Turns one template plus one record into an [`Artifact`], and owns the
//! policies shared by every merge: output naming, recipient resolution and
//! where artifacts are written.
//!
//! # Examples
//!
//! ```rust
//! use mailmerge::engine::MergeEngine;
//! use mailmerge::record::Record;
//! use mailmerge::template::{Template, TextTemplate};
//!
//! # fn example() -> mailmerge::error::Result<()> {
//! let engine = MergeEngine::new("output");
//! let template = Template::from(TextTemplate::new("Hello {{name}}"));
//! let record = Record::new(0).with("id", "7").with("name", "Amy");
//!
//! let artifact = engine.render(&template, &record)?;
//! assert_eq!(artifact.name(), "7_Amy");
//! assert_eq!(artifact.file_name(), "7_Amy.txt");
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{MergeError, Result};
use crate::record::Record;
use crate::template::Template;

/// Literal used for any naming part the record does not provide
pub const DEFAULT_NAME_PART: &str = "output";

/// Field names tried, in order, for the recipient address
pub const RECIPIENT_FIELDS: [&str; 2] = ["email", "Email"];

/// Content of a rendered artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactContent {
    /// Rendered `.docx` bytes
    Document(Vec<u8>),
    /// Substituted text
    Text(String),
}

impl ArtifactContent {
    /// Raw bytes, as written to disk or attached to an email
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Document(bytes) => bytes,
            Self::Text(text) => text.as_bytes(),
        }
    }
}

/// The output of one merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    name: String,
    extension: String,
    content: ArtifactContent,
}

impl Artifact {
    /// Derived identifier (`{id}_{name}`)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name including extension
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }

    /// Rendered content
    #[must_use]
    pub const fn content(&self) -> &ArtifactContent {
        &self.content
    }

    /// Substituted text, for text artifacts
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            ArtifactContent::Text(text) => Some(text),
            ArtifactContent::Document(_) => None,
        }
    }
}

/// How the recipient address is found in a record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecipientPolicy {
    /// `email`, then `Email`; otherwise no recipient
    #[default]
    EmailFields,
    /// As `EmailFields`, then the first field of the record
    FirstColumnFallback,
}

/// Merge engine
#[derive(Debug, Clone)]
pub struct MergeEngine {
    output_dir: PathBuf,
}

impl MergeEngine {
    /// Create an engine writing artifacts under `output_dir`
    #[must_use]
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory artifacts are written to
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render one record through a template
    ///
    /// # Errors
    ///
    /// Returns `MergeError::Render` if a document template references a field
    /// the record does not have. Text templates never fail.
    pub fn render(&self, template: &Template, record: &Record) -> Result<Artifact> {
        let content = match template {
            Template::Document(document) => ArtifactContent::Document(document.render(record)?),
            Template::Text(text) => ArtifactContent::Text(text.substitute(record)),
        };

        Ok(Artifact {
            name: derive_name(record),
            extension: template.extension().to_string(),
            content,
        })
    }

    /// Write an artifact under the output directory
    ///
    /// Creates the directory if needed. An existing file with the same name is
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns `MergeError::OutputWrite` if the directory or file cannot be
    /// written
    pub fn write(&self, artifact: &Artifact) -> Result<PathBuf> {
        self.ensure_output_dir()?;

        let path = self.output_dir.join(artifact.file_name());
        std::fs::write(&path, artifact.content().as_bytes()).map_err(|source| {
            MergeError::OutputWrite {
                path: path.clone(),
                source,
            }
        })?;

        debug!(path = %path.display(), "Wrote artifact");
        Ok(path)
    }

    /// Create the output directory if it does not exist
    ///
    /// # Errors
    ///
    /// Returns `MergeError::OutputWrite` if the directory cannot be created
    pub fn ensure_output_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| MergeError::OutputWrite {
            path: self.output_dir.clone(),
            source,
        })
    }
}

/// Derive the output identifier `{id}_{name}` for a record
///
/// Missing parts become `output`. Names are not unique: records sharing an
/// id and name, or lacking both, map to the same identifier.
///
/// # Examples
///
/// ```rust
/// use mailmerge::engine::derive_name;
/// use mailmerge::record::Record;
///
/// assert_eq!(derive_name(&Record::new(0)), "output_output");
/// assert_eq!(derive_name(&Record::new(0).with("id", "7").with("name", "Amy")), "7_Amy");
/// ```
#[must_use]
pub fn derive_name(record: &Record) -> String {
    let part = |key: &str| {
        record.lookup(&[key]).map_or_else(
            || DEFAULT_NAME_PART.to_string(),
            crate::record::FieldValue::to_display_string,
        )
    };
    format!("{}_{}", part("id"), part("name"))
}

/// Resolve the recipient address of a record
///
/// `email` if present and non-empty, else `Email` if present and non-empty.
/// With [`RecipientPolicy::FirstColumnFallback`] the first field's value is
/// used as a last resort.
#[must_use]
pub fn resolve_recipient(record: &Record, policy: RecipientPolicy) -> Option<String> {
    record.lookup_non_blank(&RECIPIENT_FIELDS).or_else(|| match policy {
        RecipientPolicy::EmailFields => None,
        RecipientPolicy::FirstColumnFallback => record
            .first()
            .filter(|(_, value)| !value.is_blank())
            .map(|(_, value)| value.to_display_string()),
    })
}
