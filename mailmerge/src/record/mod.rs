//! Records: one recipient's flat field/value data
//!
//! A [`Record`] keeps its fields in source order and remembers its position in
//! the data source so diagnostics can name "record N".

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

/// A scalar field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// String value
    Text(String),
    /// Numeric value, kept in its parsed form
    Number(serde_json::Number),
    /// Boolean value
    Bool(bool),
    /// Explicit null
    Null,
}

impl FieldValue {
    /// Render the value for substitution into text
    ///
    /// Strings pass through, numbers use their shortest stable decimal form
    /// (`7`, `2.5`), booleans become `true`/`false` and null becomes the empty
    /// string.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mailmerge::record::FieldValue;
    ///
    /// assert_eq!(FieldValue::Null.to_display_string(), "");
    /// assert_eq!(FieldValue::from(42_i64).to_display_string(), "42");
    /// ```
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(number) => number.to_string(),
            Self::Bool(flag) => flag.to_string(),
            Self::Null => String::new(),
        }
    }

    /// Whether the value renders to an empty string
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Null => true,
            Self::Number(_) | Self::Bool(_) => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// One recipient's data
///
/// Field names are unique; inserting an existing name replaces its value but
/// keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    index: usize,
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    /// Create an empty record at the given source position
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field insertion
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mailmerge::record::Record;
    ///
    /// let record = Record::new(0).with("id", "7").with("name", "Amy");
    /// assert_eq!(record.len(), 2);
    /// ```
    #[must_use]
    pub fn with<K: Into<String>, V: Into<FieldValue>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a field
    pub fn insert<K: Into<String>, V: Into<FieldValue>>(&mut self, key: K, value: V) {
        self.fields.insert(key.into(), value.into());
    }

    /// Position of this record in its data source (0-based)
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Look up a single field
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Try each key in order and return the first field that is present
    #[must_use]
    pub fn lookup(&self, keys: &[&str]) -> Option<&FieldValue> {
        keys.iter().find_map(|key| self.fields.get(*key))
    }

    /// Try each key in order and return the first non-blank value as a string
    #[must_use]
    pub fn lookup_non_blank(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.fields.get(*key))
            .find(|value| !value.is_blank())
            .map(FieldValue::to_display_string)
    }

    /// First field in source order
    #[must_use]
    pub fn first(&self) -> Option<(&str, &FieldValue)> {
        self.fields.first().map(|(key, value)| (key.as_str(), value))
    }

    /// Iterate over fields in source order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// The field map, for handing to serializers
    #[must_use]
    pub const fn fields(&self) -> &IndexMap<String, FieldValue> {
        &self.fields
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Human label used in warnings: the `name` field or `unknown`
    #[must_use]
    pub fn label(&self) -> String {
        self.get("name")
            .map_or_else(|| "unknown".to_string(), FieldValue::to_display_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_string_rules() {
        assert_eq!(FieldValue::from("Bob").to_display_string(), "Bob");
        assert_eq!(FieldValue::from(7_i64).to_display_string(), "7");
        assert_eq!(FieldValue::from(true).to_display_string(), "true");
        assert_eq!(FieldValue::Null.to_display_string(), "");

        let float: serde_json::Number = serde_json::from_str("2.5").unwrap();
        assert_eq!(FieldValue::Number(float).to_display_string(), "2.5");
    }

    #[test]
    fn test_lookup_tries_keys_in_order() {
        let record = Record::new(0).with("Email", "upper@example.com");
        assert_eq!(
            record.lookup(&["email", "Email"]),
            Some(&FieldValue::from("upper@example.com"))
        );
        assert!(record.lookup(&["mail"]).is_none());
    }

    #[test]
    fn test_lookup_non_blank_skips_empty_values() {
        let record = Record::new(0)
            .with("email", "")
            .with("Email", "fallback@example.com");
        assert_eq!(
            record.lookup_non_blank(&["email", "Email"]).as_deref(),
            Some("fallback@example.com")
        );

        let record = Record::new(0).with("email", FieldValue::Null);
        assert!(record.lookup_non_blank(&["email", "Email"]).is_none());
    }

    #[test]
    fn test_insert_replaces_and_keeps_position() {
        let mut record = Record::new(3).with("a", "1").with("b", "2");
        record.insert("a", "3");

        let keys: Vec<_> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(record.get("a"), Some(&FieldValue::from("3")));
        assert_eq!(record.index(), 3);
    }

    #[test]
    fn test_label_falls_back_to_unknown() {
        assert_eq!(Record::new(0).label(), "unknown");
        assert_eq!(Record::new(0).with("name", "Amy").label(), "Amy");
    }
}
