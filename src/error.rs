//! Error types for catalog loading

use thiserror::Error;

use crate::catalog::{FilterType, TimeGrain};

/// Errors that can occur while loading a catalog document
#[derive(Debug, Error)]
pub enum ParseError {
    /// IO error reading file
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// YAML deserialization error
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Document parsed but violates a catalog invariant
    #[error("Invalid catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// Catalog lookup and validation failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("Unknown table '{0}'")]
    UnknownTable(String),

    #[error("Table '{0}' is declared more than once")]
    DuplicateTable(String),

    #[error("Alias '{alias}' maps to both '{first}' and '{second}'")]
    AliasConflict {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Table '{0}' declares no metrics")]
    NoMetrics(String),

    #[error("Metric '{metric}' on '{table}' has no expressions")]
    EmptyMetric { table: String, metric: String },

    #[error("Attribute dimension '{dimension}' on '{table}' must declare exactly one expression")]
    AttributeExpression { table: String, dimension: String },

    #[error("Time dimension '{dimension}' on '{table}' has no expression for grain '{grain}'")]
    MissingGrain {
        table: String,
        dimension: String,
        grain: TimeGrain,
    },

    #[error("Filter '{field}' on '{table}' declares no operators")]
    NoOperators { table: String, field: String },

    #[error("Filter '{field}' on '{table}' allows 'between' but has type {filter_type:?}")]
    BetweenOnUnordered {
        table: String,
        field: String,
        filter_type: FilterType,
    },
}
