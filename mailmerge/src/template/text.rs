//! Literal `{{field}}` token substitution for text and HTML templates

use std::path::Path;

use crate::error::{MergeError, Result};
use crate::record::Record;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A text or HTML template with `{{field}}` tokens
///
/// Tokens are matched literally: the text between the delimiters is the field
/// name, with no trimming. Unknown tokens are left in the output untouched, so
/// templates may contain `{{` that was never meant as a placeholder.
///
/// # Examples
///
/// ```rust
/// use mailmerge::record::Record;
/// use mailmerge::template::TextTemplate;
///
/// let template = TextTemplate::new("Hi {{name}}, see {{missing}}");
/// let record = Record::new(0).with("name", "Bob");
///
/// assert_eq!(template.substitute(&record), "Hi Bob, see {{missing}}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTemplate {
    content: String,
    extension: String,
}

impl TextTemplate {
    /// Create a template from a string (artifacts get the `txt` extension)
    #[must_use]
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            extension: "txt".to_string(),
        }
    }

    /// Read a template from disk, keeping the file's extension for artifacts
    ///
    /// # Errors
    ///
    /// - `MergeError::TemplateNotFound` if the path does not exist
    /// - `MergeError::MalformedData` if the file is not valid UTF-8 text
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MergeError::TemplateNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| MergeError::malformed(path.display().to_string(), e.to_string()))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("txt")
            .to_string();

        Ok(Self { content, extension })
    }

    /// Override the artifact file extension
    #[must_use]
    pub fn with_extension<S: Into<String>>(mut self, extension: S) -> Self {
        self.extension = extension.into();
        self
    }

    /// Raw template content
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Extension used for artifacts rendered from this template
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Replace every known token with the record's value
    #[must_use]
    pub fn substitute(&self, record: &Record) -> String {
        substitute(&self.content, record)
    }

    /// Token names in order of appearance (duplicates kept)
    #[must_use]
    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens = Vec::new();
        scan(&self.content, |segment| {
            if let Segment::Token(token) = segment {
                tokens.push(token);
            }
        });
        tokens
    }

    /// Tokens the record has no field for
    #[must_use]
    pub fn unresolved_tokens(&self, record: &Record) -> Vec<&str> {
        self.tokens()
            .into_iter()
            .filter(|token| record.get(token).is_none())
            .collect()
    }
}

/// Substitute `{{field}}` tokens in `template` with values from `record`
///
/// Single pass, left to right. A token is the text between a `}}` and the
/// closest `{{` before it, so tokens never contain either delimiter.
/// Replacement values are appended to the output and never scanned again.
#[must_use]
pub fn substitute(template: &str, record: &Record) -> String {
    let mut output = String::with_capacity(template.len());
    scan(template, |segment| match segment {
        Segment::Literal(text) => output.push_str(text),
        Segment::Token(token) => match record.get(token) {
            Some(value) => output.push_str(&value.to_display_string()),
            None => {
                output.push_str(OPEN);
                output.push_str(token);
                output.push_str(CLOSE);
            }
        },
    });
    output
}

enum Segment<'a> {
    Literal(&'a str),
    Token(&'a str),
}

fn scan<'a, F: FnMut(Segment<'a>)>(template: &'a str, mut emit: F) {
    let mut rest = template;
    while let Some(close) = rest.find(CLOSE) {
        let (head, tail) = rest.split_at(close);
        let after = &tail[CLOSE.len()..];
        match head.rfind(OPEN) {
            Some(open) => {
                let (literal, opened) = head.split_at(open);
                if !literal.is_empty() {
                    emit(Segment::Literal(literal));
                }
                emit(Segment::Token(&opened[OPEN.len()..]));
            }
            None => {
                emit(Segment::Literal(head));
                emit(Segment::Literal(CLOSE));
            }
        }
        rest = after;
    }
    if !rest.is_empty() {
        emit(Segment::Literal(rest));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;
    use proptest::prelude::*;

    fn amy() -> Record {
        Record::new(0)
            .with("id", 7_i64)
            .with("name", "Amy")
            .with("note", FieldValue::Null)
    }

    #[test]
    fn test_known_tokens_are_replaced() {
        let out = substitute("<p>Dear {{name}} (#{{id}})</p>", &amy());
        assert_eq!(out, "<p>Dear Amy (#7)</p>");
    }

    #[test]
    fn test_unknown_token_is_left_verbatim() {
        let record = Record::new(0).with("name", "Bob");
        assert_eq!(substitute("Hi {{missing}}", &record), "Hi {{missing}}");
    }

    #[test]
    fn test_null_becomes_empty_string() {
        assert_eq!(substitute("[{{note}}]", &amy()), "[]");
    }

    #[test]
    fn test_token_is_not_trimmed() {
        assert_eq!(substitute("{{ name }}", &amy()), "{{ name }}");
    }

    #[test]
    fn test_replacement_is_not_rescanned() {
        let record = Record::new(0)
            .with("a", "{{b}}")
            .with("b", "boom");
        assert_eq!(substitute("{{a}}", &record), "{{b}}");
    }

    #[test]
    fn test_unclosed_and_stray_delimiters_are_literal() {
        assert_eq!(substitute("{{name", &amy()), "{{name");
        assert_eq!(substitute("name}} and {{name}}", &amy()), "name}} and Amy");
        assert_eq!(substitute("{{a {{name}}", &amy()), "{{a Amy");
        assert_eq!(substitute("{{{name}}}", &amy()), "{Amy}");
    }

    #[test]
    fn test_repeated_tokens() {
        assert_eq!(substitute("{{name}}{{name}}", &amy()), "AmyAmy");
    }

    #[test]
    fn test_tokens_and_unresolved() {
        let template = TextTemplate::new("{{name}} {{id}} {{city}} {{name}}");
        assert_eq!(template.tokens(), vec!["name", "id", "city", "name"]);
        assert_eq!(template.unresolved_tokens(&amy()), vec!["city"]);
    }

    #[test]
    fn test_open_missing_template() {
        let result = TextTemplate::open("/no/such/template.html");
        assert!(matches!(result, Err(MergeError::TemplateNotFound(_))));
    }

    #[test]
    fn test_open_keeps_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.html");
        std::fs::write(&path, "<b>{{name}}</b>").unwrap();

        let template = TextTemplate::open(&path).unwrap();
        assert_eq!(template.extension(), "html");
        assert_eq!(template.substitute(&amy()), "<b>Amy</b>");
    }

    fn piece() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z ]{0,8}",
            "(name|id|city|zip)".prop_map(|key| format!("{{{{{key}}}}}")),
        ]
    }

    proptest! {
        #[test]
        fn prop_no_known_token_survives(pieces in prop::collection::vec(piece(), 0..12), name in "[A-Za-z]{0,10}") {
            let template = pieces.concat();
            let record = Record::new(0).with("name", name).with("id", "42");
            let out = substitute(&template, &record);
            prop_assert!(!out.contains("{{name}}"));
            prop_assert!(!out.contains("{{id}}"));
        }

        #[test]
        fn prop_substitution_is_idempotent(pieces in prop::collection::vec(piece(), 0..12), name in "[A-Za-z]{0,10}") {
            let template = pieces.concat();
            let record = Record::new(0).with("name", name).with("id", "42");
            let once = substitute(&template, &record);
            let twice = substitute(&once, &record);
            prop_assert_eq!(once, twice);
        }
    }
}
