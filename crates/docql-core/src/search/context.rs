//! Per-request execution tracing.

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;

/// One executed query and the number of rows it returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryTrace {
    /// Rendered query text.
    pub query: String,
    /// Rows returned.
    pub result_count: usize,
}

/// Collects query traces for a single request.
///
/// Recording never fails and never affects control flow. A disabled
/// context drops every trace.
#[derive(Debug)]
pub struct ExecutionContext {
    name: String,
    enabled: bool,
    traces: Mutex<Vec<QueryTrace>>,
}

impl ExecutionContext {
    /// Creates a recording context.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            traces: Mutex::new(Vec::new()),
        }
    }

    /// Creates a context that records nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            name: String::new(),
            enabled: false,
            traces: Mutex::new(Vec::new()),
        }
    }

    /// Returns true if traces are kept.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records that `query` returned `result_count` rows.
    pub fn trace_query(&self, query: &str, result_count: usize) {
        tracing::trace!(query, result_count, "Executed query");
        if self.enabled {
            self.traces.lock().push(QueryTrace {
                query: query.to_string(),
                result_count,
            });
        }
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn profile(&self) -> ExecutionProfile {
        let queries = self.traces.lock().clone();
        ExecutionProfile {
            name: self.name.clone(),
            total_rows: queries.iter().map(|t| t.result_count).sum(),
            queries,
        }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Rendered trace of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionProfile {
    /// Name the context was created with.
    pub name: String,
    /// Executed queries, in execution order.
    pub queries: Vec<QueryTrace>,
    /// Sum of all result counts.
    pub total_rows: usize,
}

impl fmt::Display for ExecutionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} queries, {} rows",
            self.name,
            self.queries.len(),
            self.total_rows
        )?;
        for trace in &self.queries {
            writeln!(f, "  [{}] {}", trace.result_count, trace.query)?;
        }
        Ok(())
    }
}
