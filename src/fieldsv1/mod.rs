//! FieldsV1 module - Kubernetes's ownership encoding.
//!
//! Each `metadata.managedFields` entry carries a FieldsV1 tree whose keys
//! are `f:<name>` for fields, `k:<json>` for keyed list elements and `.` for
//! "this field itself". This module decodes entries and keys; walking the
//! tree is the job of [`crate::ownership`].

mod entry;
mod token;

pub use entry::*;
pub use token::*;

use thiserror::Error;

/// FieldsError is returned when a managedFields entry cannot be decoded.
#[derive(Debug, Error)]
pub enum FieldsError {
    #[error("fieldsV1 of manager {manager:?} is not valid JSON: {source}")]
    InvalidJson {
        manager: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("fieldsV1 of manager {manager:?} is not a JSON object")]
    NotAnObject { manager: String },

    #[error("unsupported fieldsType {0:?}")]
    UnsupportedFieldsType(String),
}
