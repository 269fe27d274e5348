//! Name resolver (verb module)
//!
//! Maps request vocabulary (table names, measures, dimensions) onto catalog
//! definitions and the SQL fragments they stand for.

mod dimension;
mod error;
mod measure;
mod names;
mod patterns;

pub use dimension::{find_dimension, resolve_dimension, resolve_dimension_expr, ResolvedDimension};
pub use error::ResolveError;
pub use measure::{resolve_measure, MeasureSource, ResolvedMeasure};
pub use names::{normalize_id, normalize_name};
pub use patterns::{expression_key, is_column_ref, ALLOWED_DATE_FORMATS};
