//! Storage collaborator seam.
//!
//! Compiled queries are handed to a [`QueryExecutor`], which owns execution,
//! retries and decoding. [`MemoryTable`] executes them in process.

mod memory;


pub use memory::MemoryTable;

use crate::cql::Query;
use crate::error::Result;
use crate::row::ShreddedRow;

/// Executes compiled queries and decodes the returned rows.
pub trait QueryExecutor: Send + Sync {
    /// Runs `query` and returns the selected rows.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Execution`] if the store rejects the query.
    fn execute(&self, query: &Query) -> Result<Vec<ShreddedRow>>;
}
