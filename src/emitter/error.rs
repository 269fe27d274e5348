//! Emitter errors

use thiserror::Error;

/// A malformed statement tree; these indicate a planner bug, not bad input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmitError {
    #[error("Statement selects no columns")]
    EmptySelect,

    #[error("Placeholder ${index} has no bound value ({bound} bound)")]
    ParamOutOfRange { index: usize, bound: usize },

    #[error("IN list on '{0}' is empty")]
    EmptyInList(String),

    #[error("GROUP BY ordinal {ordinal} outside select list of {columns}")]
    InvalidGroupOrdinal { ordinal: usize, columns: usize },
}
