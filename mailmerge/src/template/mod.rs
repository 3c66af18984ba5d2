//! Templates
//!
//! Two kinds of template are supported:
//!
//! - [`TextTemplate`]: text or HTML with literal `{{field}}` tokens. Unknown
//!   tokens are left as-is.
//! - [`DocxTemplate`]: a Word document with `{{ field }}` placeholders.
//!   Unknown placeholders are a render error.
//!
//! The two behave differently on missing fields. Callers that need one policy
//! should check [`TextTemplate::unresolved_tokens`] themselves.

mod document;
mod text;

use std::path::Path;

use crate::error::Result;

pub use document::DocxTemplate;
pub use text::{substitute, TextTemplate};

/// A template applied to every record of a batch
#[derive(Debug)]
pub enum Template {
    /// Structured Word document
    Document(DocxTemplate),
    /// Plain text or HTML with `{{field}}` tokens
    Text(TextTemplate),
}

impl Template {
    /// Load a template, choosing the kind by extension (`.docx` is a document,
    /// anything else is text)
    ///
    /// # Errors
    ///
    /// - `MergeError::TemplateNotFound` if the path does not exist
    /// - `MergeError::MalformedData` if the file cannot be read as a template
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_docx = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"));

        if is_docx {
            DocxTemplate::open(path).map(Self::Document)
        } else {
            TextTemplate::open(path).map(Self::Text)
        }
    }

    /// File extension of artifacts rendered from this template
    #[must_use]
    pub fn extension(&self) -> &str {
        match self {
            Self::Document(_) => "docx",
            Self::Text(text) => text.extension(),
        }
    }
}

impl From<DocxTemplate> for Template {
    fn from(template: DocxTemplate) -> Self {
        Self::Document(template)
    }
}

impl From<TextTemplate> for Template {
    fn from(template: TextTemplate) -> Self {
        Self::Text(template)
    }
}
