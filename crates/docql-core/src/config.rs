//! `DocQL` Configuration Module
//!
//! Provides configuration file support via `docql.toml`, environment variables,
//! and runtime overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Runtime overrides (CLI flags)
//! 2. Environment variables (`DOCQL_*`, sections separated by `__`)
//! 3. Configuration file (`docql.toml`)
//! 4. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::cql::Consistency;
use crate::row::TableProperties;
use crate::similarity::SimilarityFunction;

/// Deepest path the shredded table can address.
pub const MAX_SUPPORTED_DEPTH: usize = 64;

/// Largest vector dimension accepted by the vector column.
pub const MAX_VECTOR_DIMENSION: usize = 8192;

/// Largest result limit a vector search may request.
pub const MAX_SEARCH_LIMIT: usize = 1000;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// Document shape configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Number of path columns (`p0..p{max_depth-1}`).
    pub max_depth: usize,
    /// Dimension of the stored embedding.
    pub vector_dimension: usize,
    /// Top-level field holding the embedding.
    pub vector_field: String,
    /// Similarity function of the vector index.
    pub similarity: SimilarityFunction,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_SUPPORTED_DEPTH,
            vector_dimension: 1536,
            vector_field: "embedding".to_string(),
            similarity: SimilarityFunction::Cosine,
        }
    }
}

/// Column naming of the shredded table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Keyspace holding the collection tables.
    pub keyspace: String,
    /// Partition key column (document id).
    pub key_column: String,
    /// Prefix of the path columns.
    pub path_prefix: String,
    /// Leaf column (last path segment).
    pub leaf_column: String,
    /// String value column.
    pub text_value_column: String,
    /// Double value column.
    pub dbl_value_column: String,
    /// Boolean value column.
    pub bool_value_column: String,
    /// Vector value column.
    pub vector_value_column: String,
    /// Write timestamp column.
    pub write_time_column: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            keyspace: "docql".to_string(),
            key_column: "key".to_string(),
            path_prefix: "p".to_string(),
            leaf_column: "leaf".to_string(),
            text_value_column: "text_value".to_string(),
            dbl_value_column: "dbl_value".to_string(),
            bool_value_column: "bool_value".to_string(),
            vector_value_column: "vector_value".to_string(),
            write_time_column: "writetime".to_string(),
        }
    }
}

/// Consistency level attached to compiled queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueriesConfig {
    /// Consistency of read queries.
    pub read_consistency: Consistency,
}

/// Vector search configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Limit used when a request does not name one.
    pub default_limit: usize,
    /// Largest accepted limit.
    pub max_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 1000,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: String,
    /// Log format (text, json).
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Main `DocQL` configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocqlConfig {
    /// Document shape.
    pub document: DocumentConfig,
    /// Table column names.
    pub table: TableConfig,
    /// Query consistency.
    pub queries: QueriesConfig,
    /// Vector search limits.
    pub search: SearchConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

impl DocqlConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("docql.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("DOCQL_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let depth = self.document.max_depth;
        if !(1..=MAX_SUPPORTED_DEPTH).contains(&depth) {
            return Err(ConfigError::InvalidValue {
                key: "document.max_depth".to_string(),
                message: format!("value {depth} is out of range [1, {MAX_SUPPORTED_DEPTH}]"),
            });
        }

        let dim = self.document.vector_dimension;
        if !(1..=MAX_VECTOR_DIMENSION).contains(&dim) {
            return Err(ConfigError::InvalidValue {
                key: "document.vector_dimension".to_string(),
                message: format!("value {dim} is out of range [1, {MAX_VECTOR_DIMENSION}]"),
            });
        }

        if self.document.vector_field.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "document.vector_field".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        let columns = [
            ("table.keyspace", &self.table.keyspace),
            ("table.key_column", &self.table.key_column),
            ("table.path_prefix", &self.table.path_prefix),
            ("table.leaf_column", &self.table.leaf_column),
            ("table.text_value_column", &self.table.text_value_column),
            ("table.dbl_value_column", &self.table.dbl_value_column),
            ("table.bool_value_column", &self.table.bool_value_column),
            ("table.vector_value_column", &self.table.vector_value_column),
            ("table.write_time_column", &self.table.write_time_column),
        ];
        for (key, name) in columns {
            if !is_identifier(name) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("'{name}' is not a valid column identifier"),
                });
            }
        }

        if self.search.max_limit == 0 || self.search.max_limit > MAX_SEARCH_LIMIT {
            return Err(ConfigError::InvalidValue {
                key: "search.max_limit".to_string(),
                message: format!(
                    "value {} is out of range [1, {MAX_SEARCH_LIMIT}]",
                    self.search.max_limit
                ),
            });
        }

        if self.search.default_limit == 0 || self.search.default_limit > self.search.max_limit {
            return Err(ConfigError::InvalidValue {
                key: "search.default_limit".to_string(),
                message: format!(
                    "value {} is out of range [1, {}]",
                    self.search.default_limit, self.search.max_limit
                ),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        Ok(())
    }

    /// Builds the table layout described by this configuration.
    #[must_use]
    pub fn table_properties(&self) -> TableProperties {
        TableProperties {
            keyspace: self.table.keyspace.clone(),
            key_column: self.table.key_column.clone(),
            path_prefix: self.table.path_prefix.clone(),
            max_depth: self.document.max_depth,
            leaf_column: self.table.leaf_column.clone(),
            text_value_column: self.table.text_value_column.clone(),
            dbl_value_column: self.table.dbl_value_column.clone(),
            bool_value_column: self.table.bool_value_column.clone(),
            vector_value_column: self.table.vector_value_column.clone(),
            write_time_column: self.table.write_time_column.clone(),
        }
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
