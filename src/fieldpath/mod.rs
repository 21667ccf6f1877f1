//! Field path module - Addresses values inside nested objects.
//!
//! A [`FieldPath`] is the unit of ownership: an [`OwnershipMap`] is the set
//! of paths one field manager owns on one object.

mod path;
mod set;

pub use path::*;
pub use set::*;

/// The set of paths a single field manager owns on one object.
pub type OwnershipMap = FieldSet;
