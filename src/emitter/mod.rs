//! SQL emitter (verb module)
//!
//! Renders a SelectQuery into SQL text and its positional parameters.

mod error;
mod sql;

pub use error::EmitError;
pub use sql::{emit_sql, RenderedQuery};
