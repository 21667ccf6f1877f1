//! Ownership module - Which fields one field manager owns on an object.
//!
//! The manager's `managedFields` entries are merged into one FieldsV1 tree
//! and walked together with the live object, which is needed to turn `k:`
//! keys into list indices. A manager that has never written the object owns
//! everything in its manifest.

mod accumulate;
mod extract;
mod manifest;
pub mod matcher;


pub use accumulate::*;
pub use extract::*;
pub use manifest::*;
