//! Query engine (verb module)
//!
//! Endpoint bodies → compiled SQL → QueryRunner → shaped JSON responses.

mod compiler;
mod convert;
#[allow(clippy::module_inception)]
mod engine;
mod error;
mod runner;

pub use compiler::{CompiledQuery, QueryCompiler};
pub use convert::{rules_from_filter_map, tenant_from_filter_map};
pub use engine::Engine;
pub use error::{EngineError, RunnerError};
pub use runner::{run_with_deadline, QueryRunner};
