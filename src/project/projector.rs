//! Projection of a path set out of an object.

use super::ProjectionError;
use crate::fieldpath::{FieldPath, FieldSet, Segment};
use crate::ownership::matcher;
use crate::schema::{ArrayPolicy, ArraySelector};
use crate::value::{Map, Value};
use crate::MAX_DEPTH;

/// Mismatch selects what happens when a path disagrees with the shape of
/// the projection being built (a field under a list, an index under a map,
/// anything under a scalar).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mismatch {
    /// Fail the whole projection.
    #[default]
    Fail,
    /// Drop the offending path and keep going.
    Skip,
}

/// FieldProjector rebuilds the minimal object containing a set of paths.
///
/// Paths absent from the source are skipped silently. List slots keep their
/// position: writing `[2]` into an empty list produces `[null, null, x]`.
#[derive(Debug, Clone, Default)]
pub struct FieldProjector {
    policy: ArrayPolicy,
    mismatch: Mismatch,
}

impl FieldProjector {
    /// Creates a projector with the standard array policy that fails on
    /// shape mismatches.
    pub fn new() -> Self {
        FieldProjector::default()
    }

    /// Sets the array policy.
    pub fn with_policy(mut self, policy: ArrayPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the mismatch behavior.
    pub fn on_mismatch(mut self, mismatch: Mismatch) -> Self {
        self.mismatch = mismatch;
        self
    }

    /// Projects `paths` out of `source`.
    pub fn project(&self, paths: &FieldSet, source: &Value) -> Result<Value, ProjectionError> {
        self.project_against(paths, source, source)
    }

    /// Projects `paths` out of `source`, where the list indices in `paths`
    /// were taken from `reference`.
    ///
    /// Elements of keyed lists are looked up in `source` by the merge key of
    /// the reference element at that index, so the source may order its
    /// keyed lists differently or lack some of their elements. The element is
    /// written at the index the path names.
    pub fn project_against(&self, paths: &FieldSet, source: &Value, reference: &Value) -> Result<Value, ProjectionError> {
        let mut out = Value::Map(Map::new());
        self.project_into(&mut out, paths, source, reference)?;
        Ok(out)
    }

    /// Writes the projection of `paths` into an existing value.
    pub fn project_into(
        &self,
        target: &mut Value,
        paths: &FieldSet,
        source: &Value,
        reference: &Value,
    ) -> Result<(), ProjectionError> {
        for path in paths.paths() {
            let Some(value) = self.resolve(source, reference, &path) else {
                continue;
            };
            if let Err(err) = write(target, &path, value.clone()) {
                match self.mismatch {
                    Mismatch::Fail => return Err(err),
                    Mismatch::Skip => tracing::debug!(path = %path, error = %err, "skipping path"),
                }
            }
        }
        Ok(())
    }

    /// Returns the value at `path` in `source`, or `None` if any segment is
    /// missing or addresses the wrong shape.
    pub fn resolve<'v>(&self, source: &'v Value, reference: &Value, path: &FieldPath) -> Option<&'v Value> {
        let mut current = source;
        let mut reference = Some(reference);
        let mut field: Option<&str> = None;

        for segment in path {
            match segment {
                Segment::Field(name) => {
                    current = current.get(name)?;
                    reference = reference.and_then(|r| r.get(name));
                    field = Some(name.as_str());
                }
                Segment::Index(index) => {
                    let items = current.as_list()?;
                    let reference_items = reference.and_then(Value::as_list);
                    let position = match self.policy.selector(field, *index, reference_items.map(Vec::as_slice)) {
                        ArraySelector::Keyed { field, value } => matcher::find_by_key(items, &field, &value)?,
                        ArraySelector::Positional(i) => i,
                        ArraySelector::Empty => *index,
                    };
                    current = items.get(position)?;
                    reference = reference_items.and_then(|r| r.get(*index));
                    field = None;
                }
            }
        }
        Some(current)
    }
}

/// Returns the value at `path` in `object`, addressing lists by position.
pub fn lookup<'v>(object: &'v Value, path: &FieldPath) -> Option<&'v Value> {
    let mut current = object;
    for segment in path {
        current = match segment {
            Segment::Field(name) => current.get(name)?,
            Segment::Index(index) => current.as_list()?.get(*index)?,
        };
    }
    Some(current)
}

/// Writes `value` at `path`, creating maps and lists on the way. A null
/// slot is absent and can be replaced by a container.
fn write(target: &mut Value, path: &FieldPath, value: Value) -> Result<(), ProjectionError> {
    if path.len() > MAX_DEPTH {
        return Err(ProjectionError::DepthExceeded {
            path: path.to_string(),
            limit: MAX_DEPTH,
        });
    }

    let mut current = target;
    for (depth, segment) in path.iter().enumerate() {
        current = slot_for(current, segment, path, depth)?;
    }
    *current = value;
    Ok(())
}

/// Steps from `current` into the slot addressed by `segment`, creating it
/// as null if it does not exist yet.
fn slot_for<'v>(
    current: &'v mut Value,
    segment: &Segment,
    path: &FieldPath,
    depth: usize,
) -> Result<&'v mut Value, ProjectionError> {
    let found = current.kind();
    match segment {
        Segment::Field(name) => {
            if current.is_null() {
                *current = Value::Map(Map::new());
            }
            let map = current
                .as_map_mut()
                .ok_or_else(|| mismatch(path, depth, "map", found))?;
            Ok(map.entry_or_insert_with(name, || Value::Null))
        }
        Segment::Index(index) => {
            if current.is_null() {
                *current = Value::List(Vec::new());
            }
            let items = current
                .as_list_mut()
                .ok_or_else(|| mismatch(path, depth, "list", found))?;
            if items.len() <= *index {
                items.resize(index + 1, Value::Null);
            }
            Ok(&mut items[*index])
        }
    }
}

fn mismatch(path: &FieldPath, depth: usize, expected: &str, found: &str) -> ProjectionError {
    let at: FieldPath = path.iter().take(depth).cloned().collect();
    ProjectionError::type_mismatch(path.to_string(), at.to_string(), expected, found)
}
