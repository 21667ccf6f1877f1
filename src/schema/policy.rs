//! Array addressing policy: how the elements of a list field are identified.

use crate::value::Value;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Lists whose elements are identified by their `name` field
/// (strategic-merge lists of the core workload types).
const KEYED_BY_NAME: &[&str] = &["containers", "volumes", "env", "volumeMounts", "initContainers"];

/// Lists whose elements are identified by position.
const POSITIONAL: &[&str] = &["args", "command"];

static STANDARD: Lazy<ArrayPolicy> = Lazy::new(|| ArrayPolicy {
    keyed: KEYED_BY_NAME
        .iter()
        .map(|field| (field.to_string(), "name".to_string()))
        .collect(),
    positional: POSITIONAL.iter().map(|field| field.to_string()).collect(),
});

/// ListAddressing describes how the elements of one list field are addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListAddressing<'a> {
    /// Elements are identified by the value of their merge key field.
    Keyed { merge_key: &'a str },
    /// Elements are identified by their index.
    Positional,
    /// The list is one unit; its elements have no identity of their own.
    Opaque,
}

/// ArraySelector describes how a single path segment addresses a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArraySelector {
    /// The list is addressed as a whole.
    Empty,
    /// The element at this index.
    Positional(usize),
    /// The element whose `field` equals `value`.
    Keyed { field: String, value: Value },
}

/// ArrayPolicy classifies list fields by name.
///
/// Only explicitly listed field names get per-element identity; every other
/// list is opaque. The policy never infers merge keys from the data, since
/// guessing identity wrong for an unknown kind produces silently wrong diffs.
///
/// When deserialized, a missing table keeps its standard contents and a
/// present table replaces them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrayPolicy {
    /// Field name to merge key.
    keyed: BTreeMap<String, String>,
    positional: BTreeSet<String>,
}

impl Default for ArrayPolicy {
    fn default() -> Self {
        ArrayPolicy::clone(&STANDARD)
    }
}

impl ArrayPolicy {
    /// Returns the shared, immutable standard policy.
    pub fn standard() -> &'static ArrayPolicy {
        &STANDARD
    }

    /// Creates a policy in which every list is opaque.
    pub fn opaque() -> Self {
        ArrayPolicy {
            keyed: BTreeMap::new(),
            positional: BTreeSet::new(),
        }
    }

    /// Returns a copy of this policy with `field` keyed by `merge_key`.
    pub fn with_keyed(mut self, field: impl Into<String>, merge_key: impl Into<String>) -> Self {
        let field = field.into();
        self.positional.remove(&field);
        self.keyed.insert(field, merge_key.into());
        self
    }

    /// Returns a copy of this policy with `field` addressed by index.
    pub fn with_positional(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.keyed.remove(&field);
        self.positional.insert(field);
        self
    }

    /// Classifies the list stored under `field`.
    ///
    /// Lists without a field name of their own (nested lists) are opaque.
    pub fn addressing(&self, field: Option<&str>) -> ListAddressing<'_> {
        let Some(field) = field else {
            return ListAddressing::Opaque;
        };
        if let Some(merge_key) = self.keyed.get(field) {
            ListAddressing::Keyed { merge_key }
        } else if self.positional.contains(field) {
            ListAddressing::Positional
        } else {
            ListAddressing::Opaque
        }
    }

    /// Chooses the selector for element `index` of the list under `field`.
    ///
    /// `reference` is the list the index was taken from. Keyed lists address
    /// the element by its merge key when the reference element carries one,
    /// and fall back to its position otherwise. Opaque lists yield
    /// [`ArraySelector::Empty`]: the slot is reached by raw index but the
    /// element has no identity.
    pub fn selector(&self, field: Option<&str>, index: usize, reference: Option<&[Value]>) -> ArraySelector {
        match self.addressing(field) {
            ListAddressing::Opaque => ArraySelector::Empty,
            ListAddressing::Positional => ArraySelector::Positional(index),
            ListAddressing::Keyed { merge_key } => {
                match reference.and_then(|items| items.get(index)).and_then(|e| e.get(merge_key)) {
                    Some(value) => ArraySelector::Keyed {
                        field: merge_key.to_string(),
                        value: value.clone(),
                    },
                    None => ArraySelector::Positional(index),
                }
            }
        }
    }
}
