//! Paths of a user-authored manifest, used when no ownership is recorded yet.

use super::matcher;
use crate::fieldpath::{FieldPath, FieldSet};
use crate::schema::{ArrayPolicy, ListAddressing};
use crate::value::Value;
use crate::MAX_DEPTH;

/// Returns every leaf path present in `manifest`.
///
/// Scalars, nulls and empty maps/lists are leaves. Opaque lists are a single
/// leaf; elements of positional and keyed lists are visited one by one, and
/// null elements are empty slots that own nothing.
///
/// List indices are positions in `reference`, the live object. A keyed
/// element is placed at the index of the live element with the same merge
/// key and left out if the live list has no such element. Where the live
/// object has no list at all, manifest positions are kept.
pub fn manifest_paths(manifest: &Value, reference: &Value, policy: &ArrayPolicy) -> FieldSet {
    let mut paths = FieldSet::new();
    if manifest.is_map() {
        let mut walk = ManifestWalk { policy, paths: &mut paths };
        walk.collect(manifest, Some(reference), None, &mut FieldPath::new());
    }
    paths
}

struct ManifestWalk<'a> {
    policy: &'a ArrayPolicy,
    paths: &'a mut FieldSet,
}

impl ManifestWalk<'_> {
    fn collect(&mut self, value: &Value, reference: Option<&Value>, field: Option<&str>, path: &mut FieldPath) {
        if path.len() >= MAX_DEPTH {
            tracing::warn!(path = %path, limit = MAX_DEPTH, "manifest too deep, owning the branch whole");
            self.paths.insert(path);
            return;
        }

        match value {
            Value::Map(map) if !map.is_empty() => {
                for (name, child) in map.iter() {
                    path.push(name.as_str().into());
                    self.collect(child, reference.and_then(|r| r.get(name)), Some(name.as_str()), path);
                    path.pop();
                }
            }
            Value::List(items) if !items.is_empty() => {
                let addressing = self.policy.addressing(field);
                if addressing == ListAddressing::Opaque {
                    self.paths.insert(path);
                    return;
                }
                let live = reference.and_then(Value::as_list);
                for (position, item) in items.iter().enumerate() {
                    if item.is_null() {
                        continue;
                    }
                    let Some(index) = live_index(addressing, item, position, live) else {
                        tracing::debug!(path = %path, position, "manifest element not in the live list, skipping");
                        continue;
                    };
                    path.push(index.into());
                    self.collect(item, live.and_then(|l| l.get(index)), None, path);
                    path.pop();
                }
            }
            _ => self.paths.insert(path),
        }
    }
}

/// Maps a manifest element to its index in the live list.
fn live_index(addressing: ListAddressing<'_>, item: &Value, position: usize, live: Option<&Vec<Value>>) -> Option<usize> {
    match (addressing, live) {
        (ListAddressing::Keyed { merge_key }, Some(live)) => match item.get(merge_key) {
            Some(key) => matcher::find_by_key(live, merge_key, key),
            None => Some(position),
        },
        _ => Some(position),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(manifest: serde_json::Value) -> Vec<String> {
        manifest_paths(&Value::from(manifest), &Value::Null, ArrayPolicy::standard()).to_strings()
    }

    #[test]
    fn test_scalars_and_empty_containers_are_leaves() {
        let got = paths(json!({
            "kind": "ConfigMap",
            "metadata": {"name": "cfg", "labels": {}},
            "data": {"a": "", "b": null},
            "immutable": false,
        }));
        assert_eq!(
            got,
            vec!["data.a", "data.b", "immutable", "kind", "metadata.labels", "metadata.name"]
        );
    }

    #[test]
    fn test_list_addressing() {
        let got = paths(json!({"spec": {
            "containers": [{"name": "app", "image": "app:v1", "args": ["--port", "80"]}],
            "ports": [{"port": 80}, {"port": 443}],
            "tolerations": [],
        }}));
        assert_eq!(
            got,
            vec![
                "spec.containers[0].args[0]",
                "spec.containers[0].args[1]",
                "spec.containers[0].image",
                "spec.containers[0].name",
                "spec.ports",
                "spec.tolerations",
            ]
        );
    }

    #[test]
    fn test_null_list_slots_are_skipped() {
        let got = paths(json!({"containers": [null, null, {"image": "app:v2"}], "data": {"key": null}}));
        assert_eq!(got, vec!["containers[2].image", "data.key"]);
    }

    #[test]
    fn test_dotted_label_keys_survive_string_form() {
        let got = paths(json!({"metadata": {"labels": {"app.kubernetes.io/name": "web"}}}));
        assert_eq!(got, vec![r#"metadata.labels["app.kubernetes.io/name"]"#]);

        let reparsed = FieldSet::parse_all(got.iter().map(String::as_str)).unwrap();
        assert!(reparsed.has(&FieldPath::from_segments(vec![
            "metadata".into(),
            "labels".into(),
            "app.kubernetes.io/name".into(),
        ])));
    }

    #[test]
    fn test_non_map_manifest_has_no_paths() {
        assert!(paths(json!(["a"])).is_empty());
        assert!(paths(json!("scalar")).is_empty());
    }

    fn paths_against(manifest: serde_json::Value, live: serde_json::Value) -> Vec<String> {
        manifest_paths(&Value::from(manifest), &Value::from(live), ArrayPolicy::standard()).to_strings()
    }

    #[test]
    fn test_keyed_elements_take_live_indices() {
        let got = paths_against(
            json!({"spec": {"containers": [
                {"name": "app", "image": "app:v1", "args": ["--v=2"]},
                {"name": "new", "image": "new:v1"},
            ]}}),
            json!({"spec": {"containers": [
                {"name": "istio-proxy", "image": "proxy:1"},
                {"name": "app", "image": "app:v1", "args": ["--v=1"]},
            ]}}),
        );
        assert_eq!(
            got,
            vec!["spec.containers[1].args[0]", "spec.containers[1].image", "spec.containers[1].name"]
        );
    }

    #[test]
    fn test_manifest_positions_without_live_list() {
        let manifest = json!({"spec": {"containers": [{"name": "a"}, {"name": "b"}]}});
        let got = paths_against(manifest, json!({"spec": {}}));
        assert_eq!(got, vec!["spec.containers[0].name", "spec.containers[1].name"]);
    }
}
