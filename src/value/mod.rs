//! Value module - In-memory representation of Kubernetes objects.
//!
//! Live objects, user manifests, FieldsV1 trees and projections all share
//! this representation.

mod value;

pub use value::*;
