//! Structured document (`.docx`) templates
//!
//! A `.docx` file is a zip archive of XML parts. The text-bearing parts under
//! `word/` may contain Jinja placeholders (`{{ name }}`). They are compiled
//! once when the template is opened and rendered per record with strict
//! undefined handling: a placeholder the record has no field for is an error,
//! unlike the lenient text-token path.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use minijinja::{Environment, UndefinedBehavior, Value};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{MergeError, Result};
use crate::record::Record;

/// Parts of a Word document that can carry placeholders
static TEMPLATED_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^word/(document|header\d*|footer\d*|footnotes|endnotes)\.xml$").expect("Invalid regex")
});

/// Markup wedged between the two characters of an opening or closing delimiter
static SPLIT_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(?:<[^>]*>)+([{%#])").expect("Invalid regex")
});
static SPLIT_CLOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([}%#])(?:<[^>]*>)+\}").expect("Invalid regex")
});

/// A placeholder or statement, possibly spanning several Word runs
static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\{\{.*?\}\}|\{%.*?%\}").expect("Invalid regex")
});

/// Run boundary inside a tag: end of one text node up to the start of the next
static RUN_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)</w:t>.*?(?:<w:t>|<w:t [^>]*>)").expect("Invalid regex")
});

#[derive(Debug)]
struct Entry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
    templated: bool,
}

/// A `.docx` template
///
/// # Examples
///
/// ```rust,no_run
/// use mailmerge::record::Record;
/// use mailmerge::template::DocxTemplate;
///
/// # fn example() -> mailmerge::error::Result<()> {
/// let template = DocxTemplate::open("template.docx")?;
/// let record = Record::new(0).with("name", "Amy");
/// let bytes = template.render(&record)?;
/// std::fs::write("output/7_Amy.docx", bytes).ok();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DocxTemplate {
    label: String,
    entries: Vec<Entry>,
    env: Environment<'static>,
}

impl DocxTemplate {
    /// Open a `.docx` template from disk
    ///
    /// # Errors
    ///
    /// - `MergeError::TemplateNotFound` if the path does not exist
    /// - `MergeError::MalformedData` if the file is not a readable `.docx`
    ///   archive or a placeholder has invalid syntax
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MergeError::TemplateNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)
            .map_err(|e| MergeError::malformed(path.display().to_string(), e.to_string()))?;
        Self::from_bytes(path.display().to_string(), &bytes)
    }

    /// Build a template from in-memory `.docx` bytes
    ///
    /// # Errors
    ///
    /// Returns `MergeError::MalformedData` if the bytes are not a readable
    /// archive or a placeholder has invalid syntax
    pub fn from_bytes<S: Into<String>>(label: S, bytes: &[u8]) -> Result<Self> {
        let label = label.into();
        let invalid = |message: String| MergeError::malformed(label.as_str(), message);

        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| invalid(format!("not a valid .docx archive: {e}")))?;

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| invalid(format!("unreadable archive entry: {e}")))?;

            let name = file.name().to_string();
            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|e| invalid(format!("failed to read {name}: {e}")))?;

            let templated = TEMPLATED_PART.is_match(&name);
            if templated {
                let xml = String::from_utf8(data)
                    .map_err(|e| invalid(format!("{name} is not UTF-8: {e}")))?;
                let patched = patch_xml(&xml);
                env.add_template_owned(name.clone(), patched.clone())
                    .map_err(|e| invalid(format!("invalid placeholder in {name}: {e}")))?;
                data = patched.into_bytes();
            }

            entries.push(Entry {
                name,
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
                templated,
            });
        }

        if !entries.iter().any(|entry| entry.name == "word/document.xml") {
            return Err(invalid("archive has no word/document.xml part".to_string()));
        }

        debug!(template = %label, parts = entries.len(), "Opened document template");
        Ok(Self { label, entries, env })
    }

    /// Where the template came from
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Render the document for one record
    ///
    /// # Errors
    ///
    /// Returns `MergeError::Render` if a placeholder references a field the
    /// record does not have, or the archive cannot be written
    pub fn render(&self, record: &Record) -> Result<Vec<u8>> {
        let index = record.index();
        let failed = |message: String| MergeError::Render { index, message };
        let context = Value::from_serialize(record.fields());

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &self.entries {
            let options = SimpleFileOptions::default().compression_method(match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            });

            if entry.is_dir {
                writer
                    .add_directory(entry.name.clone(), options)
                    .map_err(|e| failed(e.to_string()))?;
                continue;
            }

            writer
                .start_file(entry.name.as_str(), options)
                .map_err(|e| failed(e.to_string()))?;

            if entry.templated {
                let rendered = self
                    .env
                    .get_template(&entry.name)
                    .and_then(|template| template.render(&context))
                    .map_err(|e| failed(format!("{}: {}", entry.name, describe(&e))))?;
                writer
                    .write_all(rendered.as_bytes())
                    .map_err(|e| failed(e.to_string()))?;
            } else {
                writer
                    .write_all(&entry.data)
                    .map_err(|e| failed(e.to_string()))?;
            }
        }

        let cursor = writer.finish().map_err(|e| failed(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

/// Remove Word run markup that splits placeholders
///
/// Word freely breaks typed text into several runs, so `{{ name }}` may be
/// stored as `{{ </w:t></w:r><w:r><w:t>name }}`. Markup between the braces of
/// a delimiter and run boundaries inside a tag are dropped; run properties of
/// the first run are kept.
fn patch_xml(xml: &str) -> String {
    let joined = SPLIT_OPEN.replace_all(xml, "{$1");
    let joined = SPLIT_CLOSE.replace_all(&joined, "$1}");
    TAG.replace_all(&joined, |caps: &Captures<'_>| RUN_BREAK.replace_all(&caps[0], "").into_owned())
        .into_owned()
}

/// Error text including the source chain
fn describe(err: &minijinja::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;
    use crate::testing::{docx_fixture, docx_part};

    fn body(text: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:body></w:document>"#
        )
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let template =
            DocxTemplate::from_bytes("test.docx", &docx_fixture(&body("Dear {{ name }} #{{ id }}"))).unwrap();
        let record = Record::new(0).with("name", "Amy").with("id", 7_i64);

        let output = template.render(&record).unwrap();
        let xml = docx_part(&output, "word/document.xml").unwrap();
        assert!(xml.contains("<w:t>Dear Amy #7</w:t>"));
    }

    #[test]
    fn test_missing_field_is_render_error() {
        let template =
            DocxTemplate::from_bytes("test.docx", &docx_fixture(&body("Dear {{ name }}"))).unwrap();
        let record = Record::new(4).with("id", "7");

        match template.render(&record) {
            Err(MergeError::Render { index, message }) => {
                assert_eq!(index, 4);
                assert!(message.contains("word/document.xml"));
            }
            other => panic!("expected render error, got {other:?}"),
        }
    }

    #[test]
    fn test_values_are_xml_escaped() {
        let template =
            DocxTemplate::from_bytes("test.docx", &docx_fixture(&body("{{ company }}"))).unwrap();
        let record = Record::new(0).with("company", "Smith & <Sons>");

        let xml = docx_part(&template.render(&record).unwrap(), "word/document.xml").unwrap();
        assert!(xml.contains("Smith &amp; &lt;Sons&gt;"));
    }

    #[test]
    fn test_null_field_renders_as_none_literal() {
        let template =
            DocxTemplate::from_bytes("test.docx", &docx_fixture(&body("[{{ note }}]"))).unwrap();
        let record = Record::new(0).with("note", FieldValue::Null);

        let xml = docx_part(&template.render(&record).unwrap(), "word/document.xml").unwrap();
        assert!(xml.to_lowercase().contains("<w:t>[none]</w:t>"));
        assert!(!xml.contains("<w:t>[]</w:t>"));
    }

    #[test]
    fn test_split_runs_are_joined() {
        let split = r#"<w:r><w:t>{{ </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>name</w:t></w:r><w:r><w:t> }}</w:t></w:r>"#;
        let patched = patch_xml(split);
        assert_eq!(patched, "<w:r><w:t>{{ name }}</w:t></w:r>");

        let split_brace = "<w:t>{</w:t></w:r><w:r><w:t>{ name }</w:t></w:r><w:r><w:t>}</w:t>";
        assert_eq!(patch_xml(split_brace), "<w:t>{{ name }}</w:t>");
    }

    #[test]
    fn test_other_parts_are_copied_unchanged() {
        let bytes = docx_fixture(&body("{{ name }}"));
        let template = DocxTemplate::from_bytes("test.docx", &bytes).unwrap();
        let output = template.render(&Record::new(0).with("name", "Amy")).unwrap();

        assert_eq!(
            docx_part(&output, "[Content_Types].xml"),
            docx_part(&bytes, "[Content_Types].xml")
        );
    }

    #[test]
    fn test_invalid_archive_is_malformed() {
        let result = DocxTemplate::from_bytes("broken.docx", b"not a zip");
        assert!(matches!(result, Err(MergeError::MalformedData { .. })));
    }

    #[test]
    fn test_open_missing_template() {
        let result = DocxTemplate::open("/no/such/template.docx");
        assert!(matches!(result, Err(MergeError::TemplateNotFound(_))));
    }
}
