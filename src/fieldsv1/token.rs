//! Keys of a FieldsV1 tree.

use crate::value::{Field, FieldList, Value};

/// Key of a node that marks the enclosing field itself as owned.
pub const MARKER: &str = ".";

/// FieldsToken is one decoded key of a FieldsV1 tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldsToken {
    /// `f:<name>`: a named field.
    Field(String),
    /// `k:<json>`: the list element selected by a key/value predicate.
    Key(FieldList),
    /// `.`: the enclosing field itself.
    Marker,
    /// Any other key: `v:`/`i:` set members, malformed `k:` literals, and
    /// prefixes unknown today. Callers ignore these.
    Unknown,
}

/// Decodes a FieldsV1 key.
///
/// Decoding never fails: a key that cannot be understood is reported as
/// [`FieldsToken::Unknown`] so the walk over the rest of the tree continues.
pub fn parse_token(key: &str) -> FieldsToken {
    if key == MARKER {
        return FieldsToken::Marker;
    }
    if let Some(name) = key.strip_prefix("f:") {
        return FieldsToken::Field(name.to_string());
    }
    if let Some(literal) = key.strip_prefix("k:") {
        return match parse_key_literal(literal) {
            Some(predicate) => FieldsToken::Key(predicate),
            None => {
                tracing::debug!(key, "ignoring malformed merge key literal");
                FieldsToken::Unknown
            }
        };
    }
    FieldsToken::Unknown
}

/// Parses the JSON object embedded in a `k:` key into a sorted predicate.
///
/// Returns `None` for anything other than a non-empty JSON object.
pub fn parse_key_literal(literal: &str) -> Option<FieldList> {
    let parsed: serde_json::Value = serde_json::from_str(literal).ok()?;
    let serde_json::Value::Object(obj) = parsed else {
        return None;
    };
    if obj.is_empty() {
        return None;
    }
    let fields = obj
        .into_iter()
        .map(|(name, value)| Field {
            name,
            value: Value::from(value),
        })
        .collect();
    Some(FieldList::with_fields(fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_and_marker() {
        assert_eq!(parse_token("f:spec"), FieldsToken::Field("spec".into()));
        assert_eq!(parse_token("f:"), FieldsToken::Field(String::new()));
        assert_eq!(parse_token("."), FieldsToken::Marker);
    }

    #[test]
    fn test_key_literal() {
        let token = parse_token(r#"k:{"protocol":"TCP","containerPort":80}"#);
        let FieldsToken::Key(predicate) = token else {
            panic!("expected key token, got {:?}", token);
        };
        assert_eq!(predicate.fields[0].name, "containerPort");
        assert_eq!(predicate.fields[0].value, Value::Int(80));
        assert_eq!(predicate.fields[1].value, Value::String("TCP".into()));
    }

    #[test]
    fn test_unknown_and_malformed_keys() {
        for key in [
            r#"v:"finalizer.example.com""#,
            "i:3",
            "r:future",
            "spec",
            "k:not-json",
            "k:[1,2]",
            "k:{}",
        ] {
            assert_eq!(parse_token(key), FieldsToken::Unknown, "key {:?}", key);
        }
    }
}
