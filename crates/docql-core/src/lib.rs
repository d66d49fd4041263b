//! # `DocQL` Core
//!
//! Filter and vector-search query compiler for JSON documents stored as
//! shredded rows in a wide-column store.
//!
//! Every scalar leaf of a document is one row carrying the document key, the
//! materialized path over `p0..pN`, the leaf name and exactly one typed value
//! column. This crate turns JSON filters into path-aware queries over that
//! layout, decides per condition whether the store can evaluate it or whether
//! it must run in memory, and builds ANN queries over the vector column.
//!
//! ## Features
//!
//! - **Filter operations**: `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`,
//!   `$like`, `$contains`, `$containsKey`, `$exists`, and `$not`
//! - **Path-aware containment**: `$contains` only matches direct array
//!   elements of the filtered field
//! - **Vector search**: dimension-checked ANN queries with filter pre-selection
//! - **Vector rewriting**: inlines bound ANN vectors for drivers that reject them
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docql_core::{DocqlConfig, filter::FilterParser, search::DocumentSearchPlanner};
//!
//! let config = DocqlConfig::load()?;
//! let props = config.table_properties();
//! let expressions = FilterParser::new(&props).parse_str(r#"{"tags": {"$contains": "web"}}"#)?;
//!
//! let planner = DocumentSearchPlanner::new(&props, "docql", "articles", config.queries.read_consistency);
//! for expression in &expressions {
//!     println!("{}", planner.plan(expression)?.query());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]

pub mod config;
pub mod cql;
pub mod error;
#[cfg(test)]
mod error_tests;
pub mod filter;
pub mod row;
pub mod search;
pub mod shred;
pub mod similarity;
#[cfg(test)]
mod similarity_tests;
pub mod storage;

pub use config::DocqlConfig;
pub use error::{Error, Result};
pub use filter::{Condition, FilterExpression, FilterOpCode, FilterParser, FilterPath};
pub use row::{ShreddedRow, TableProperties};
pub use search::{VectorQueryRewriter, VectorSearchQueryBuilder, VectorSearchService};
pub use similarity::SimilarityFunction;
pub use storage::{MemoryTable, QueryExecutor};
