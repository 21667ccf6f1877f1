//! Project module - Rebuilding the part of an object covered by a path set.
//!
//! A projection keeps exactly the values found at the requested paths and
//! the maps and lists needed to hold them. It is what a manager sends back
//! when it only wants to re-apply the fields it owns.

mod comparison;
mod projector;


pub use comparison::*;
pub use projector::*;

use crate::fieldpath::{FieldSet, PathError};
use crate::value::Value;
use thiserror::Error;

/// ProjectionError is returned when a projection cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    /// A path needs a container of one shape where the projection already
    /// holds another.
    #[error("{path}: expected {expected} at {at:?}, found {found}")]
    TypeMismatch {
        path: String,
        at: String,
        expected: String,
        found: String,
    },

    #[error("{path}: deeper than {limit} segments")]
    DepthExceeded { path: String, limit: usize },

    #[error(transparent)]
    Path(#[from] PathError),
}

impl ProjectionError {
    /// Creates a type mismatch error.
    pub fn type_mismatch(
        path: impl Into<String>,
        at: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        ProjectionError::TypeMismatch {
            path: path.into(),
            at: at.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Projects the fields named by `paths` out of `object`.
///
/// The paths are dotted/bracketed strings such as `status.conditions[0].type`.
/// Paths that are missing from the object or that disagree with its shape are
/// left out; only a malformed path is an error.
pub fn extract_fields(object: &Value, paths: &[&str]) -> Result<Value, ProjectionError> {
    let set = FieldSet::parse_all(paths.iter().copied())?;
    FieldProjector::new()
        .on_mismatch(Mismatch::Skip)
        .project(&set, object)
}
