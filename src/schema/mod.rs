//! Schema module - Schema-less knowledge about list identity.
//!
//! Objects handled here carry no OpenAPI schema, so the only structural
//! knowledge is a small table of list field names and how their elements are
//! identified.

mod policy;

pub use policy::*;
