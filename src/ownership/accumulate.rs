//! Accumulation of one manager's ownership across all of its entries.

use super::extract::extract_paths;
use super::manifest::manifest_paths;
use crate::fieldpath::{FieldPath, OwnershipMap, Segment};
use crate::fieldsv1::{entries_from_object, ManagedFieldsEntry};
use crate::schema::ArrayPolicy;
use crate::value::Value;
use std::collections::BTreeMap;

/// Paths every manager owns on every object.
pub const IDENTITY_FIELDS: [&[&str]; 4] = [
    &["apiVersion"],
    &["kind"],
    &["metadata", "name"],
    &["metadata", "namespace"],
];

/// Returns the identity paths as a set.
pub fn identity_fields() -> OwnershipMap {
    IDENTITY_FIELDS
        .iter()
        .map(|fields| fields.iter().map(|name| Segment::from(*name)).collect::<FieldPath>())
        .collect()
}

/// OwnershipAccumulator computes the set of paths one field manager owns.
#[derive(Debug, Clone)]
pub struct OwnershipAccumulator {
    manager: String,
    policy: ArrayPolicy,
}

impl OwnershipAccumulator {
    /// Creates an accumulator for `manager` using the standard array policy.
    pub fn new(manager: impl Into<String>) -> Self {
        OwnershipAccumulator {
            manager: manager.into(),
            policy: ArrayPolicy::default(),
        }
    }

    /// Sets the array policy used for the manifest fallback.
    pub fn with_policy(mut self, policy: ArrayPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the manager this accumulator is for.
    pub fn manager(&self) -> &str {
        &self.manager
    }

    /// Computes ownership from explicit managedFields entries.
    ///
    /// `reference` is the live object the entries belong to; `manifest` is
    /// the user-authored object, consulted only when the manager has no
    /// usable entry yet (first apply).
    pub fn accumulate(&self, entries: &[ManagedFieldsEntry], reference: &Value, manifest: &Value) -> OwnershipMap {
        let owned = match self.merged_tree(entries) {
            Some(tree) => extract_paths(&tree, reference),
            None => {
                tracing::debug!(manager = %self.manager, "no recorded ownership, using manifest paths");
                manifest_paths(manifest, reference, &self.policy)
            }
        };
        owned.union(&identity_fields())
    }

    /// Computes ownership from the `metadata.managedFields` of `live`.
    pub fn accumulate_object(&self, live: &Value, manifest: &Value) -> OwnershipMap {
        self.accumulate(&entries_from_object(live), live, manifest)
    }

    /// Deep-merges every decodable FieldsV1 tree of this manager.
    ///
    /// Returns `None` when the manager has no decodable entry at all.
    pub fn merged_tree(&self, entries: &[ManagedFieldsEntry]) -> Option<Value> {
        let mut groups = group_by_manager(entries);
        let mut merged: Option<Value> = None;
        for entry in groups.remove(self.manager.as_str()).unwrap_or_default() {
            let tree = match entry.fields_tree() {
                Ok(tree) => tree,
                Err(err) => {
                    tracing::warn!(
                        manager = %self.manager,
                        operation = ?entry.operation,
                        error = %err,
                        "skipping managedFields entry"
                    );
                    continue;
                }
            };
            merged = Some(match merged {
                Some(left) => merge_trees(left, tree),
                None => tree,
            });
        }
        merged
    }
}

/// Deep-merges two trees: maps merge key by key, anything else is replaced
/// by the right-hand side.
pub fn merge_trees(left: Value, right: Value) -> Value {
    match (left, right) {
        (Value::Map(mut left), Value::Map(right)) => {
            for (key, value) in right.fields {
                let merged = match left.delete(&key) {
                    Some(existing) => merge_trees(existing, value),
                    None => value,
                };
                left.set(key, merged);
            }
            Value::Map(left)
        }
        (_, right) => right,
    }
}

/// Groups entries by manager name.
pub fn group_by_manager(entries: &[ManagedFieldsEntry]) -> BTreeMap<&str, Vec<&ManagedFieldsEntry>> {
    let mut groups: BTreeMap<&str, Vec<&ManagedFieldsEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.manager.as_str()).or_default().push(entry);
    }
    groups
}

/// Returns the distinct manager names, sorted.
pub fn managers(entries: &[ManagedFieldsEntry]) -> Vec<String> {
    group_by_manager(entries).into_keys().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fieldsv1::Operation;
    use crate::value::Map;
    use serde_json::json;

    fn entry(manager: &str, operation: Operation, fields: serde_json::Value) -> ManagedFieldsEntry {
        ManagedFieldsEntry::new(manager, operation, "apps/v1", fields.to_string())
    }

    #[test]
    fn test_merge_trees() {
        let left = Value::from(json!({"f:spec": {"f:replicas": {}}, "f:x": 1}));
        let right = Value::from(json!({"f:spec": {"f:paused": {}}, "f:x": {"f:y": {}}}));
        assert_eq!(
            merge_trees(left, right),
            Value::from(json!({"f:spec": {"f:paused": {}, "f:replicas": {}}, "f:x": {"f:y": {}}}))
        );
        assert_eq!(merge_trees(Value::Map(Map::new()), Value::Int(1)), Value::Int(1));
    }

    #[test]
    fn test_entries_of_one_manager_are_unioned() {
        let entries = vec![
            entry("ctl", Operation::Apply, json!({"f:spec": {"f:replicas": {}}})),
            entry("other", Operation::Apply, json!({"f:spec": {"f:paused": {}}})),
            entry("ctl", Operation::Update, json!({"f:spec": {"f:minReadySeconds": {}}})),
        ];
        let owned = OwnershipAccumulator::new("ctl").accumulate(&entries, &Value::Null, &Value::Null);
        assert_eq!(
            owned.to_strings(),
            vec![
                "apiVersion",
                "kind",
                "metadata.name",
                "metadata.namespace",
                "spec.minReadySeconds",
                "spec.replicas",
            ]
        );
    }

    #[test]
    fn test_malformed_entry_is_isolated() {
        let entries = vec![
            ManagedFieldsEntry::new("ctl", Operation::Update, "v1", "{broken"),
            entry("ctl", Operation::Apply, json!({"f:data": {"f:key": {}}})),
        ];
        let owned = OwnershipAccumulator::new("ctl").accumulate(&entries, &Value::Null, &Value::Null);
        assert!(owned.has(&"data.key".parse().unwrap()));
    }

    #[test]
    fn test_only_malformed_entries_fall_back_to_manifest() {
        let entries = vec![ManagedFieldsEntry::new("ctl", Operation::Apply, "v1", "[]")];
        let manifest = Value::from(json!({"data": {"key": "value"}}));
        let owned = OwnershipAccumulator::new("ctl").accumulate(&entries, &Value::Null, &manifest);
        assert!(owned.has(&"data.key".parse().unwrap()));
    }

    #[test]
    fn test_managers() {
        let entries = vec![
            entry("b", Operation::Apply, json!({})),
            entry("a", Operation::Update, json!({})),
            entry("b", Operation::Update, json!({})),
        ];
        assert_eq!(managers(&entries), vec!["a", "b"]);
        assert_eq!(group_by_manager(&entries)["b"].len(), 2);
    }
}
