//! Drift between a desired object and the live object over owned paths.

use super::FieldProjector;
use crate::fieldpath::FieldSet;
use crate::value::Value;
use std::fmt;

/// Comparison holds the result of comparing the owned paths of two objects.
///
/// No path appears in more than one of the three sets. If all of them are
/// empty, the objects agree on every owned path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    /// Paths set on the live object but missing from the desired one.
    pub removed: FieldSet,
    /// Paths set on both with different values.
    pub modified: FieldSet,
    /// Paths set on the desired object but missing from the live one.
    pub added: FieldSet,
}

impl Comparison {
    /// Creates a new empty Comparison.
    pub fn new() -> Self {
        Comparison::default()
    }

    /// Returns true if there are no changes.
    pub fn is_same(&self) -> bool {
        self.removed.is_empty() && self.modified.is_empty() && self.added.is_empty()
    }

    /// Drops the given paths from every set.
    pub fn exclude_fields(&mut self, fields: &FieldSet) {
        self.removed = self.removed.difference(fields);
        self.modified = self.modified.difference(fields);
        self.added = self.added.difference(fields);
    }

    pub fn has_removed(&self) -> bool {
        !self.removed.is_empty()
    }

    pub fn has_modified(&self) -> bool {
        !self.modified.is_empty()
    }

    pub fn has_added(&self) -> bool {
        !self.added.is_empty()
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = [
            ("Modified", &self.modified),
            ("Added", &self.added),
            ("Removed", &self.removed),
        ];
        let mut first = true;
        for (title, set) in sections {
            if set.is_empty() {
                continue;
            }
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "- {} Fields:", title)?;
            for path in set.paths() {
                write!(f, "\n  {}", path)?;
            }
        }
        Ok(())
    }
}

/// Compares `desired` against `live` on the paths in `owned`.
///
/// List indices in `owned` are positions in `live`; keyed list elements of
/// `desired` are found by the merge key of the live element.
pub fn compare_owned(desired: &Value, live: &Value, owned: &FieldSet) -> Comparison {
    compare_owned_with(&FieldProjector::new(), desired, live, owned)
}

/// Like [`compare_owned`], resolving paths with the given projector's policy.
pub fn compare_owned_with(projector: &FieldProjector, desired: &Value, live: &Value, owned: &FieldSet) -> Comparison {
    let mut comparison = Comparison::new();
    for path in owned.paths() {
        let want = projector.resolve(desired, live, &path);
        let have = projector.resolve(live, live, &path);
        match (want, have) {
            (Some(want), Some(have)) if !same_value(want, have) => comparison.modified.insert(&path),
            (Some(_), None) => comparison.added.insert(&path),
            (None, Some(_)) => comparison.removed.insert(&path),
            _ => {}
        }
    }
    tracing::debug!(
        modified = comparison.modified.len(),
        added = comparison.added.len(),
        removed = comparison.removed.len(),
        "compared owned paths"
    );
    comparison
}

/// Structural equality where integers and floats compare by numeric value.
pub fn same_value(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => *i as f64 == *f,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| same_value(a, b))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, value)| b.get(key).is_some_and(|other| same_value(value, other)))
        }
        _ => left == right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn paths(paths: &[&str]) -> FieldSet {
        FieldSet::parse_all(paths.iter().copied()).unwrap()
    }

    #[test]
    fn test_comparison_is_same() {
        let comp = Comparison::new();
        assert!(comp.is_same());
        assert_eq!(comp.to_string(), "");
    }

    #[test]
    fn test_compare_owned_reports_each_kind() {
        let live = Value::from(json!({
            "spec": {"replicas": 3, "paused": true},
            "metadata": {"labels": {"app": "web"}},
        }));
        let desired = Value::from(json!({
            "spec": {"replicas": 5, "minReadySeconds": 10},
            "metadata": {"labels": {"app": "web"}},
        }));
        let owned = paths(&["spec.replicas", "spec.paused", "spec.minReadySeconds", "metadata.labels.app", "spec.gone"]);

        let comp = compare_owned(&desired, &live, &owned);
        assert_eq!(comp.modified.to_strings(), vec!["spec.replicas"]);
        assert_eq!(comp.added.to_strings(), vec!["spec.minReadySeconds"]);
        assert_eq!(comp.removed.to_strings(), vec!["spec.paused"]);
        assert!(!comp.is_same());
        assert_eq!(
            comp.to_string(),
            "- Modified Fields:\n  spec.replicas\n- Added Fields:\n  spec.minReadySeconds\n- Removed Fields:\n  spec.paused"
        );
    }

    #[test]
    fn test_compare_owned_follows_keyed_lists() {
        let live = Value::from(json!({"containers": [
            {"name": "sidecar", "image": "proxy:1"},
            {"name": "app", "image": "app:v1"},
        ]}));
        let desired = Value::from(json!({"containers": [{"name": "app", "image": "app:v2"}]}));

        let comp = compare_owned(&desired, &live, &paths(&["containers[1].image"]));
        assert_eq!(comp.modified.to_strings(), vec!["containers[1].image"]);
        assert!(!comp.has_added() && !comp.has_removed());
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert!(same_value(&Value::Int(80), &Value::Float(80.0)));
        assert!(!same_value(&Value::Int(80), &Value::Float(80.5)));
        assert!(same_value(
            &Value::from(json!({"ports": [80, {"x": 1.0}]})),
            &Value::from(json!({"ports": [80.0, {"x": 1}]}))
        ));
        assert!(!same_value(&Value::String("80".into()), &Value::Int(80)));
    }

    #[test]
    fn test_exclude_fields() {
        let live = Value::from(json!({"a": 1, "b": 1}));
        let desired = Value::from(json!({"a": 2, "b": 2}));
        let mut comp = compare_owned(&desired, &live, &paths(&["a", "b"]));
        comp.exclude_fields(&paths(&["a"]));
        assert_eq!(comp.modified.to_strings(), vec!["b"]);
    }
}
