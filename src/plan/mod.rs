//! Query plan types (noun module)
//!
//! A small SELECT tree that the emitter renders to SQL text exactly once.

mod param;
mod query;

pub use param::{ParamList, ParamRef};
pub use query::{CompareOp, JoinClause, JoinType, Predicate, SelectItem, SelectQuery, TableRef};
