//! Storage-side value model: typed values, predicates and query descriptors.

mod predicate;
mod query;
mod value;


pub use predicate::{BuiltCondition, Predicate};
pub use query::{Consistency, Query, Select};
pub use value::CqlValue;
