//! `metadata.managedFields` entries.

use super::FieldsError;
use crate::value::{Map, Value};
use serde::{Deserialize, Deserializer};

/// The only fieldset encoding Kubernetes defines.
pub const FIELDS_V1: &str = "FieldsV1";

/// Operation is the kind of request that produced a managedFields entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Operation {
    Apply,
    Update,
}

/// ManagedFieldsEntry records the fields one manager set through one
/// operation, as stored in `metadata.managedFields`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedFieldsEntry {
    pub manager: String,
    pub operation: Operation,
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default = "default_fields_type")]
    pub fields_type: String,
    #[serde(default)]
    pub subresource: Option<String>,
    /// The raw FieldsV1 JSON document. Decoded lazily so that one bad
    /// document only loses its own entry.
    #[serde(rename = "fieldsV1", default, deserialize_with = "raw_fields")]
    pub fields_v1: Option<String>,
}

fn default_fields_type() -> String {
    FIELDS_V1.to_string()
}

/// Accepts FieldsV1 either inline (as the API server returns it) or as an
/// already-encoded JSON string.
fn raw_fields<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(raw)) => Some(raw),
        Some(inline) => Some(inline.to_string()),
    })
}

impl ManagedFieldsEntry {
    /// Creates an entry from its raw FieldsV1 JSON.
    pub fn new(
        manager: impl Into<String>,
        operation: Operation,
        api_version: impl Into<String>,
        fields_v1: impl Into<String>,
    ) -> Self {
        ManagedFieldsEntry {
            manager: manager.into(),
            operation,
            api_version: api_version.into(),
            time: None,
            fields_type: default_fields_type(),
            subresource: None,
            fields_v1: Some(fields_v1.into()),
        }
    }

    /// Decodes the FieldsV1 tree of this entry.
    ///
    /// An entry without a fieldset owns nothing and yields an empty tree.
    pub fn fields_tree(&self) -> Result<Value, FieldsError> {
        if self.fields_type != FIELDS_V1 {
            return Err(FieldsError::UnsupportedFieldsType(self.fields_type.clone()));
        }
        let Some(raw) = &self.fields_v1 else {
            return Ok(Value::Map(Map::new()));
        };
        let tree: Value = serde_json::from_str(raw).map_err(|source| FieldsError::InvalidJson {
            manager: self.manager.clone(),
            source,
        })?;
        if !tree.is_map() {
            return Err(FieldsError::NotAnObject {
                manager: self.manager.clone(),
            });
        }
        Ok(tree)
    }
}

/// Decodes `metadata.managedFields` of a live object.
///
/// Entries are decoded one by one; an entry that does not decode is logged
/// and dropped without affecting the others. An object without managed
/// fields yields no entries.
pub fn entries_from_object(object: &Value) -> Vec<ManagedFieldsEntry> {
    let Some(items) = object
        .get("metadata")
        .and_then(|m| m.get("managedFields"))
        .and_then(Value::as_list)
    else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(position, item)| {
            match serde_json::from_value::<ManagedFieldsEntry>(serde_json::Value::from(item)) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!(position, error = %err, "dropping undecodable managedFields entry");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn live(managed_fields: serde_json::Value) -> Value {
        Value::from(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "web", "managedFields": managed_fields},
        }))
    }

    #[test]
    fn test_decode_inline_fields() {
        let object = live(json!([{
            "manager": "kubectl",
            "operation": "Apply",
            "apiVersion": "apps/v1",
            "time": "2024-01-01T00:00:00Z",
            "fieldsType": "FieldsV1",
            "fieldsV1": {"f:spec": {"f:replicas": {}}},
        }]));

        let entries = entries_from_object(&object);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].manager, "kubectl");
        assert_eq!(entries[0].operation, Operation::Apply);
        assert_eq!(entries[0].time.as_deref(), Some("2024-01-01T00:00:00Z"));

        let tree = entries[0].fields_tree().unwrap();
        assert_eq!(tree, Value::from(json!({"f:spec": {"f:replicas": {}}})));
    }

    #[test]
    fn test_decode_string_fields_and_defaults() {
        let object = live(json!([{
            "manager": "controller",
            "operation": "Update",
            "fieldsV1": "{\"f:status\":{}}",
            "subresource": "status",
        }]));

        let entries = entries_from_object(&object);
        assert_eq!(entries[0].fields_type, FIELDS_V1);
        assert_eq!(entries[0].subresource.as_deref(), Some("status"));
        assert!(entries[0].fields_tree().unwrap().get("f:status").is_some());
    }

    #[test]
    fn test_undecodable_entries_are_dropped_individually() {
        let object = live(json!([
            {"operation": "Apply"},
            {"manager": "a", "operation": "Patch"},
            {"manager": "b", "operation": "Update", "fieldsV1": {}},
        ]));

        let entries = entries_from_object(&object);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].manager, "b");
    }

    #[test]
    fn test_fields_tree_errors() {
        let bad_json = ManagedFieldsEntry::new("m", Operation::Apply, "v1", "{not json");
        assert!(matches!(bad_json.fields_tree(), Err(FieldsError::InvalidJson { .. })));

        let not_object = ManagedFieldsEntry::new("m", Operation::Apply, "v1", "[1]");
        assert!(matches!(not_object.fields_tree(), Err(FieldsError::NotAnObject { .. })));

        let mut other_type = ManagedFieldsEntry::new("m", Operation::Apply, "v1", "{}");
        other_type.fields_type = "FieldsV2".into();
        assert!(matches!(
            other_type.fields_tree(),
            Err(FieldsError::UnsupportedFieldsType(_))
        ));

        let mut empty = ManagedFieldsEntry::new("m", Operation::Update, "v1", "");
        empty.fields_v1 = None;
        assert_eq!(empty.fields_tree().unwrap(), Value::Map(Map::new()));
    }

    #[test]
    fn test_object_without_managed_fields() {
        assert!(entries_from_object(&Value::from(json!({"metadata": {}}))).is_empty());
        assert!(entries_from_object(&Value::Null).is_empty());
    }
}
