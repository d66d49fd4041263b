//! Document shredding and reconstruction.

mod converter;
mod shredder;


pub use converter::JsonConverter;
pub use shredder::JsonShredder;

/// String value stored for an empty array.
pub const EMPTY_ARRAY_MARKER: &str = "AAEMPTY_ARRAYAA";

/// String value stored for an empty object.
pub const EMPTY_OBJECT_MARKER: &str = "AAEMPTY_OBJECTAA";
