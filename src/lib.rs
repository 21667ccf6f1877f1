//! # Field Ownership
//!
//! Field ownership extraction and projection for Kubernetes Server-Side Apply.
//!
//! Given the `managedFields` of a live object, this library computes the set
//! of paths one field manager owns, and rebuilds the minimal object holding
//! just those paths. A controller uses the pair to re-apply only its own
//! fields without touching the ones other managers own.
//!
//! ## Modules
//!
//! - [`value`] - In-memory representation of YAML/JSON objects
//! - [`fieldpath`] - Field paths and sets of paths
//! - [`fieldsv1`] - Decoding of managedFields entries and FieldsV1 keys
//! - [`schema`] - How lists are addressed (keyed, positional or opaque)
//! - [`ownership`] - Which paths a manager owns
//! - [`project`] - Projection of a path set out of an object, and drift

pub mod fieldpath;
pub mod fieldsv1;
pub mod ownership;
pub mod project;
pub mod schema;
pub mod value;

/// Maximum path length followed when walking trees or building projections.
pub const MAX_DEPTH: usize = 128;

pub use fieldpath::{FieldPath, FieldSet, OwnershipMap, PathError, Segment};
pub use fieldsv1::{FieldsError, ManagedFieldsEntry, Operation};
pub use ownership::{extract_paths, manifest_paths, OwnershipAccumulator};
pub use project::{compare_owned, extract_fields, Comparison, FieldProjector, Mismatch, ProjectionError};
pub use schema::{ArrayPolicy, ArraySelector};
pub use value::Value;
