//! Filter engine (verb module)
//!
//! WhereRules + catalog filter definitions → predicates and bound parameters.

mod compile;
mod error;
mod policy;

pub use compile::{compile, is_tenant_field, CompiledFilters, DateRange, FilterContext};
pub use error::FilterError;
pub use policy::{FilterPolicy, ParsePolicyError};
