//! Chart session errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// The endpoint answered with an error envelope
    #[error("Query failed: {0}")]
    Rejected(String),

    /// The request was superseded or aborted
    #[error("Request cancelled")]
    Cancelled,

    #[error("Transport error: {0}")]
    Io(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("Chart has no data query model")]
    MissingModel,

    #[error(transparent)]
    Transport(#[from] TransportError),
}
