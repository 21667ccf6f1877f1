//! Merge key matching: locating a keyed list element by its identity.
//!
//! Values are compared by their Go `%v` rendering rather than structurally,
//! which is how the API server's own key literals compare against decoded
//! objects (`80` matches whether it decoded as an integer or a float).

use crate::fieldsv1::parse_key_literal;
use crate::value::{FieldList, Value};

/// Returns true if `element` satisfies every key/value pair of `predicate`.
///
/// A missing field renders as `<nil>`, the same as an explicit null.
pub fn matches(element: &Value, predicate: &FieldList) -> bool {
    let Some(map) = element.as_map() else {
        return false;
    };
    !predicate.is_empty()
        && predicate.iter().all(|field| {
            let actual = map.get(&field.name).unwrap_or(&Value::Null);
            same_rendering(actual, &field.value)
        })
}

/// Returns the index of the first element of `items` matching `predicate`.
pub fn find_index(items: &[Value], predicate: &FieldList) -> Option<usize> {
    items.iter().position(|item| matches(item, predicate))
}

/// Returns the index of the first element whose `field` renders as `value`.
pub fn find_by_key(items: &[Value], field: &str, value: &Value) -> Option<usize> {
    items.iter().position(|item| {
        item.get(field)
            .is_some_and(|actual| same_rendering(actual, value))
    })
}

/// Resolves the JSON literal of a `k:` key against `items`.
pub fn resolve(literal: &str, items: &[Value]) -> Option<usize> {
    find_index(items, &parse_key_literal(literal)?)
}

fn same_rendering(a: &Value, b: &Value) -> bool {
    a == b || a.to_string() == b.to_string()
}
