//! Planner errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// The resolved measure has no SQL
    #[error("Table '{0}' resolved to an empty measure")]
    EmptyMeasure(String),

    /// The resolved dimension has no label expression
    #[error("Table '{0}' resolved to an empty dimension")]
    EmptyDimension(String),
}
