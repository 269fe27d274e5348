//! Engine errors
//!
//! Everything that can go wrong while serving a request. All of it is
//! reported to the caller as a 400 `{success: false, message}` envelope.

use std::time::Duration;
use thiserror::Error;

use crate::emitter::EmitError;
use crate::error::{CatalogError, ParseError};
use crate::filter::FilterError;
use crate::planner::PlanError;
use crate::resolver::ResolveError;

/// Failures at the database boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunnerError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    #[error("Query cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unknown module '{0}'")]
    UnknownModule(String),

    #[error("Table '{table}' does not belong to module '{module}'")]
    ModuleMismatch { table: String, module: String },

    #[error("Failed to load catalog: {0}")]
    CatalogLoad(#[from] ParseError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("Invalid request body: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// HTTP status reported for this error
    pub fn status_code(&self) -> u16 {
        400
    }
}
