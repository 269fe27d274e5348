//! Query planner (verb module)
//!
//! Resolved measure + dimension + compiled filters → SelectQuery.

mod build;
mod error;
mod limit;

pub use build::{build_query, KEY_COLUMN, LABEL_COLUMN, TOTAL_COLUMN};
pub use error::PlanError;
pub use limit::{clamp_limit, DEFAULT_LIMIT, MAX_LIMIT, MIN_LIMIT};
