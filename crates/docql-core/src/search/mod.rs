//! Query construction and execution over shredded documents.
//!
//! - [`builder`]: path-aware WHERE clauses for one filter expression
//! - [`vector`]: `ORDER BY … ANN OF ?` queries
//! - [`rewriter`]: inlines bound ANN vectors for drivers that reject them
//! - [`planner`]: push-down or in-memory resolution of whole filters
//! - [`service`]: validated vector search with optional filters

pub mod builder;
mod context;
pub mod planner;
pub mod rewriter;
pub mod service;
pub mod vector;


pub use builder::{
    ContainsFilterExpressionSearchQueryBuilder, FilterExpressionSearchQueryBuilder,
    SearchQueryBuilder,
};
pub use context::{ExecutionContext, ExecutionProfile, QueryTrace};
pub use planner::{DocumentSearch, DocumentSearchPlanner, SearchPlan};
pub use rewriter::{
    decode_float_vector, format_vector_literal, Statement, VectorLayout, VectorQueryRewriter,
};
pub use service::{
    validate_vector_dimension, VectorSearchHit, VectorSearchPlan, VectorSearchRequest,
    VectorSearchService,
};
pub use vector::VectorSearchQueryBuilder;
