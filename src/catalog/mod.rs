//! Catalog types (nouns)
//!
//! These types describe every queryable table: its metric, dimension and
//! filter vocabulary plus the fixed join graph used to reach their columns.

mod builtin;
mod dimension;
mod filter;
mod metric;
mod schema;
mod table;
mod types;

pub use builtin::{builtin, BUILTIN_CATALOG_YAML};
pub use dimension::DimensionDefinition;
pub use filter::FilterDefinition;
pub use metric::MetricDefinition;
pub use schema::Catalog;
pub use table::{
    DefaultStatus, JoinKind, JoinSpec, Module, ParseModuleError, ParseTableNameError, SourceTable,
    TableCatalogEntry, TableName,
};
pub use types::{
    DimensionKind, FilterOperator, FilterType, MetricFormat, ParseGrainError, ParseOperatorError,
    TimeGrain,
};
