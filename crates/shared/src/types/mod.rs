//! Common types used across the application.

pub mod field;
pub mod id;

pub use field::{FieldMap, FieldValue};
pub use id::*;
