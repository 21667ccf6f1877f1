//! Extraction of owned paths from a single FieldsV1 tree.

use super::matcher;
use crate::fieldpath::{FieldPath, FieldSet, Segment};
use crate::fieldsv1::{parse_token, FieldsToken, MARKER};
use crate::value::{Map, Value};
use crate::MAX_DEPTH;

/// Extracts the flat set of paths owned under `tree`.
///
/// `reference` is the object the tree describes. It is only consulted to
/// resolve `k:` keys to list indices; `f:` keys are followed without it.
/// Branches that cannot be followed (a `k:` key without a matching element,
/// a node that is not an object, a reference of the wrong shape) are skipped
/// and the walk continues.
pub fn extract_paths(tree: &Value, reference: &Value) -> FieldSet {
    let mut extractor = Extractor { owned: FieldSet::new() };
    if let Some(node) = tree.as_map() {
        extractor.walk(node, Some(reference), &mut FieldPath::new());
    }
    extractor.owned
}

struct Extractor {
    owned: FieldSet,
}

impl Extractor {
    /// Walks one node; returns true if at least one path was emitted below it.
    fn walk(&mut self, node: &Map, reference: Option<&Value>, path: &mut FieldPath) -> bool {
        if path.len() >= MAX_DEPTH {
            tracing::warn!(path = %path, limit = MAX_DEPTH, "ownership tree too deep, skipping branch");
            return false;
        }

        let mut emitted = false;
        for (key, child) in node.iter() {
            let (segment, child_reference) = match parse_token(key) {
                FieldsToken::Field(name) => {
                    let child_reference = reference.and_then(|r| r.get(&name));
                    (Segment::Field(name), child_reference)
                }
                FieldsToken::Key(predicate) => {
                    let Some(items) = reference.and_then(Value::as_list) else {
                        tracing::debug!(path = %path, key = %key, "merge key without a list to resolve against");
                        continue;
                    };
                    let Some(index) = matcher::find_index(items, &predicate) else {
                        tracing::debug!(path = %path, key = %key, "merge key matches no element");
                        continue;
                    };
                    (Segment::Index(index), items.get(index))
                }
                FieldsToken::Marker | FieldsToken::Unknown => continue,
            };

            let Some(child) = child.as_map() else {
                tracing::debug!(path = %path, key = %key, "fieldset node is not an object");
                continue;
            };

            path.push(segment);
            emitted |= self.visit(child, child_reference, path);
            path.pop();
        }
        emitted
    }

    /// Handles the subtree of a field or list element whose path is `path`.
    fn visit(&mut self, node: &Map, reference: Option<&Value>, path: &mut FieldPath) -> bool {
        if is_leaf(node) {
            self.owned.insert(path);
            return true;
        }

        let emitted = self.walk(node, reference, path);
        if !emitted && node.has(MARKER) && !has_addressable_children(node) {
            // The node owns itself but nothing below it can be addressed,
            // e.g. a set list whose members are `v:` keys. Stale `f:`/`k:`
            // children do not count: they own nothing.
            self.owned.insert(path);
            return true;
        }
        emitted
    }
}

fn has_addressable_children(node: &Map) -> bool {
    node.iter()
        .any(|(key, _)| matches!(parse_token(key), FieldsToken::Field(_) | FieldsToken::Key(_)))
}

/// A leaf is written either as `{}` or as `{".": {}}`.
fn is_leaf(node: &Map) -> bool {
    node.is_empty() || (node.len() == 1 && node.has(MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(tree: serde_json::Value, reference: serde_json::Value) -> Vec<String> {
        extract_paths(&Value::from(tree), &Value::from(reference)).to_strings()
    }

    #[test]
    fn test_leaf_forms() {
        let paths = extract(
            json!({"f:spec": {"f:replicas": {}, "f:paused": {".": {}}}}),
            json!({}),
        );
        assert_eq!(paths, vec!["spec.paused", "spec.replicas"]);
    }

    #[test]
    fn test_marker_with_children_emits_children_only() {
        let paths = extract(
            json!({"f:metadata": {"f:labels": {".": {}, "f:app": {}, "f:tier": {}}}}),
            json!({}),
        );
        assert_eq!(paths, vec!["metadata.labels.app", "metadata.labels.tier"]);
    }

    #[test]
    fn test_set_list_members_fall_back_to_the_list() {
        let paths = extract(
            json!({"f:metadata": {"f:finalizers": {".": {}, "v:\"example.com/cleanup\"": {}}}}),
            json!({"metadata": {"finalizers": ["example.com/cleanup"]}}),
        );
        assert_eq!(paths, vec!["metadata.finalizers"]);
    }

    #[test]
    fn test_stale_key_under_marked_list_owns_nothing() {
        let paths = extract(
            json!({"f:env": {".": {}, "k:{\"name\":\"OLD\"}": {".": {}, "f:name": {}, "f:value": {}}}}),
            json!({"env": [{"name": "OTHER", "value": "x"}]}),
        );
        assert!(paths.is_empty());

        let paths = extract(
            json!({"f:spec": {"f:ports": {
                ".": {},
                "k:{\"containerPort\":8080}": {".": {}, "f:containerPort": {}},
            }}}),
            json!({"spec": {"ports": [{"containerPort": 80}]}}),
        );
        assert!(paths.is_empty());
    }

    #[test]
    fn test_marked_node_with_stale_field_child_owns_nothing() {
        let paths = extract(
            json!({"f:spec": {"f:template": {".": {}, "f:spec": {"k:{\"name\":\"x\"}": {"f:image": {}}}}}}),
            json!({"spec": {"template": {"spec": {}}}}),
        );
        assert!(paths.is_empty());
    }

    #[test]
    fn test_richer_subtree_without_marker_and_without_children() {
        let paths = extract(json!({"f:spec": {"i:0": {}}}), json!({}));
        assert!(paths.is_empty());
    }

    #[test]
    fn test_keyed_elements_resolve_against_reference() {
        let paths = extract(
            json!({"f:spec": {"f:containers": {
                "k:{\"name\":\"app\"}": {".": {}, "f:image": {}, "f:name": {}},
                "k:{\"name\":\"gone\"}": {".": {}, "f:image": {}},
            }}}),
            json!({"spec": {"containers": [
                {"name": "sidecar", "image": "envoy"},
                {"name": "app", "image": "app:v2"},
            ]}}),
        );
        assert_eq!(paths, vec!["spec.containers[1].image", "spec.containers[1].name"]);
    }

    #[test]
    fn test_key_against_non_list_is_skipped() {
        let paths = extract(
            json!({"f:spec": {
                "f:containers": {"k:{\"name\":\"app\"}": {"f:image": {}}},
                "f:replicas": {},
            }}),
            json!({"spec": {"containers": {"name": "app"}}}),
        );
        assert_eq!(paths, vec!["spec.replicas"]);
    }

    #[test]
    fn test_non_object_nodes_and_unknown_keys_are_ignored() {
        let paths = extract(
            json!({"f:a": 1, "f:b": {}, "x:c": {}, "f:d": {"f:e": []}}),
            json!({}),
        );
        assert_eq!(paths, vec!["b"]);
    }

    #[test]
    fn test_depth_bound() {
        let mut tree = json!({});
        for _ in 0..(MAX_DEPTH + 10) {
            tree = json!({ "f:x": tree });
        }
        // The innermost leaf lies beyond the bound and is not reported.
        assert!(extract(tree, json!({})).is_empty());

        let mut tree = json!({});
        for _ in 0..10 {
            tree = json!({ "f:x": tree });
        }
        assert_eq!(extract(tree, json!({})).len(), 1);
    }
}
