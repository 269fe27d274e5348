//! Resolver errors

use thiserror::Error;

/// Errors raised while resolving measures and dimensions against a table
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("Dimension '{dimension}' not found on '{table}'")]
    UnknownDimension { table: String, dimension: String },

    #[error("Dimension expression '{0}' is not allowed")]
    RejectedExpression(String),

    #[error("Dimension '{dimension}' on '{table}' has no expression")]
    MissingExpression { table: String, dimension: String },

    #[error("Table '{0}' has no default metric")]
    NoMetrics(String),

    #[error("Invalid allow-pattern: {0}")]
    Pattern(String),
}
