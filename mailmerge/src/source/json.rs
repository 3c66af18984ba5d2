//! JSON record parsing

use serde_json::Value;

use crate::error::{MergeError, Result};
use crate::record::{FieldValue, Record};

/// Parse a top-level array of flat objects
pub(super) fn parse(source_name: &str, content: &str) -> Result<Vec<Record>> {
    let root: Value = serde_json::from_str(content)
        .map_err(|e| MergeError::malformed(source_name, e.to_string()))?;

    let Value::Array(elements) = root else {
        return Err(MergeError::malformed(
            source_name,
            format!("expected a top-level array of objects, found {}", kind(&root)),
        ));
    };

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| to_record(source_name, index, element))
        .collect()
}

fn to_record(source_name: &str, index: usize, element: Value) -> Result<Record> {
    let Value::Object(object) = element else {
        return Err(MergeError::malformed(
            source_name,
            format!("record {} is {}, expected an object", index + 1, kind(&element)),
        ));
    };

    let mut record = Record::new(index);
    for (key, value) in object {
        let field = match value {
            Value::String(text) => FieldValue::Text(text),
            Value::Number(number) => FieldValue::Number(number),
            Value::Bool(flag) => FieldValue::Bool(flag),
            Value::Null => FieldValue::Null,
            Value::Array(_) | Value::Object(_) => {
                return Err(MergeError::malformed(
                    source_name,
                    format!(
                        "field '{key}' of record {} is {}, expected a scalar",
                        index + 1,
                        kind(&value)
                    ),
                ));
            }
        };
        record.insert(key, field);
    }

    Ok(record)
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_order_and_types() {
        let records = parse(
            "test",
            r#"[
                {"name": "Amy", "id": 7, "vip": true, "note": null},
                {"name": "Bob"}
            ]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        let keys: Vec<_> = records[0].iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["name", "id", "vip", "note"]);
        assert_eq!(records[0].get("id"), Some(&FieldValue::from(7_i64)));
        assert_eq!(records[0].get("vip"), Some(&FieldValue::Bool(true)));
        assert_eq!(records[0].get("note"), Some(&FieldValue::Null));
        assert_eq!(records[1].index(), 1);
    }

    #[test]
    fn test_root_must_be_array() {
        let err = parse("data.json", r#"{"name": "Amy"}"#).unwrap_err();
        assert!(matches!(err, MergeError::MalformedData { .. }));
        assert!(err.to_string().contains("top-level array"));
    }

    #[test]
    fn test_elements_must_be_objects() {
        let err = parse("data.json", r#"[{"name": "Amy"}, 3]"#).unwrap_err();
        assert!(err.to_string().contains("record 2 is a number"));
    }

    #[test]
    fn test_nested_values_are_rejected() {
        let err = parse("data.json", r#"[{"tags": ["a", "b"]}]"#).unwrap_err();
        assert!(err.to_string().contains("field 'tags' of record 1"));
    }

    #[test]
    fn test_syntax_error_carries_parser_diagnostic() {
        let err = parse("data.json", "[{").unwrap_err();
        match err {
            MergeError::MalformedData { source_name, message } => {
                assert_eq!(source_name, "data.json");
                assert!(message.contains("EOF"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_array_yields_no_records() {
        assert!(parse("data.json", "[]").unwrap().is_empty());
    }
}
