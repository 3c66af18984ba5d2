//! Delimited tabular record parsing (CSV/TSV)

use csv::{ReaderBuilder, Trim};

use crate::error::{MergeError, Result};
use crate::record::Record;

/// Tabular parser settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabularOptions {
    /// Delimiter character (default: comma)
    pub delimiter: u8,

    /// Whether to trim whitespace from headers and values (default: off,
    /// cells are kept as written)
    pub trim: bool,
}

impl Default for TabularOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: false,
        }
    }
}

impl TabularOptions {
    /// Set custom delimiter
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether to trim whitespace
    #[must_use]
    pub const fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }
}

/// Parse header + rows into records
///
/// Rows shorter than the header get the missing trailing fields as empty
/// strings; cells beyond the header are dropped.
pub(super) fn parse(source_name: &str, content: &str, options: TabularOptions) -> Result<Vec<Record>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .trim(if options.trim { Trim::All } else { Trim::None })
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| MergeError::malformed(source_name, format!("failed to read header row: {e}")))?
        .clone();

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|e| {
            MergeError::malformed(source_name, format!("failed to parse row {}: {e}", index + 1))
        })?;

        let mut record = Record::new(index);
        for (column, header) in headers.iter().enumerate() {
            record.insert(header, row.get(column).unwrap_or(""));
        }
        records.push(record);
    }

    Ok(records)
}
