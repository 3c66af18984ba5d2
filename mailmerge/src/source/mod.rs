//! Record sources
//!
//! Loads an ordered sequence of [`Record`]s from a JSON array of objects or
//! from delimited tabular data with a header row. The produced order always
//! equals the input order: output names and "record N" diagnostics rely on it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mailmerge::source::RecordSource;
//!
//! # fn example() -> mailmerge::error::Result<()> {
//! let records = RecordSource::load("data.json")?;
//! println!("loaded {} records", records.len());
//! # Ok(())
//! # }
//! ```

mod json;
mod tabular;

use std::path::Path;

use tracing::debug;

use crate::error::{MergeError, Result};
use crate::record::Record;

pub use tabular::TabularOptions;

/// Supported data source formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Top-level JSON array of flat objects
    Json,
    /// Header row followed by data rows
    Tabular(TabularOptions),
}

impl SourceFormat {
    /// Infer the format from a file extension
    ///
    /// # Errors
    ///
    /// Returns `MergeError::MalformedData` for unknown or missing extensions
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Tabular(TabularOptions::default())),
            Some("tsv") => Ok(Self::Tabular(TabularOptions::default().with_delimiter(b'\t'))),
            Some(other) => Err(MergeError::malformed(
                path.display().to_string(),
                format!("unsupported data file extension '.{other}' (expected .json, .csv or .tsv)"),
            )),
            None => Err(MergeError::malformed(
                path.display().to_string(),
                "data file has no extension (expected .json, .csv or .tsv)",
            )),
        }
    }
}

/// Loader for record sequences
pub struct RecordSource;

impl RecordSource {
    /// Load records from a file, choosing the format by extension
    ///
    /// # Errors
    ///
    /// - `MergeError::SourceNotFound` if the path does not exist
    /// - `MergeError::MalformedData` if the extension is unsupported or the
    ///   content cannot be parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MergeError::SourceNotFound(path.to_path_buf()));
        }
        let format = SourceFormat::from_path(path)?;
        Self::load_as(path, format)
    }

    /// Load records from a file with an explicit format
    ///
    /// # Errors
    ///
    /// - `MergeError::SourceNotFound` if the path does not exist
    /// - `MergeError::MalformedData` if the content cannot be parsed
    pub fn load_as<P: AsRef<Path>>(path: P, format: SourceFormat) -> Result<Vec<Record>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MergeError::SourceNotFound(path.to_path_buf())
            } else {
                MergeError::malformed(path.display().to_string(), e.to_string())
            }
        })?;

        let records = Self::parse(&path.display().to_string(), &content, format)?;
        debug!(path = %path.display(), count = records.len(), "Loaded records");
        Ok(records)
    }

    /// Parse records from in-memory content
    ///
    /// # Errors
    ///
    /// Returns `MergeError::MalformedData` if the content cannot be parsed
    pub fn load_from_str(content: &str, format: SourceFormat) -> Result<Vec<Record>> {
        Self::parse("<memory>", content, format)
    }

    fn parse(source_name: &str, content: &str, format: SourceFormat) -> Result<Vec<Record>> {
        match format {
            SourceFormat::Json => json::parse(source_name, content),
            SourceFormat::Tabular(options) => tabular::parse(source_name, content, options),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_is_source_not_found() {
        let result = RecordSource::load("/definitely/not/here/data.json");
        assert!(matches!(result, Err(MergeError::SourceNotFound(_))));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("people.JSON")).unwrap(),
            SourceFormat::Json
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("people.tsv")).unwrap(),
            SourceFormat::Tabular(TabularOptions::default().with_delimiter(b'\t'))
        );
        assert!(matches!(
            SourceFormat::from_path(Path::new("people.xlsx")),
            Err(MergeError::MalformedData { .. })
        ));
    }

    #[test]
    fn test_load_json_file() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(file, r#"[{{"id": 1, "name": "Amy"}}, {{"id": 2, "name": "Bob"}}]"#).unwrap();

        let records = RecordSource::load(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].label(), "Bob");
        assert_eq!(records[1].index(), 1);
    }

    #[test]
    fn test_load_csv_file() {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "email,name").unwrap();
        writeln!(file, "amy@example.com,Amy").unwrap();

        let records = RecordSource::load(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].get("email").map(ToString::to_string).as_deref(),
            Some("amy@example.com")
        );
    }
}
