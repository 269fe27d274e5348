//! Filter engine errors

use thiserror::Error;

use crate::catalog::FilterOperator;

/// Why a filter rule could not be compiled
///
/// Under the permissive policy these are collected as dropped rules; under
/// the strict policy the first one aborts the request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("Filter field '{field}' is not declared on '{table}'")]
    UnknownField { table: String, field: String },

    #[error("Unknown operator '{op}' for filter '{field}'")]
    UnknownOperator { field: String, op: String },

    #[error("Operator '{op}' is not allowed for filter '{field}'")]
    UnsupportedOperator { field: String, op: FilterOperator },

    #[error("Filter '{field}' is set from the request context, not by rules")]
    ReservedField { field: String },

    #[error("Invalid value for filter '{field}' ({op}): {reason}")]
    InvalidPayload {
        field: String,
        op: FilterOperator,
        reason: String,
    },
}
