//! bizquery - Catalog-driven analytical queries compiled to parameterized SQL
//!
//! This library provides:
//! - A catalog of queryable tables (metrics, dimensions, filters, joins)
//! - Catalog parsing from YAML, plus a builtin catalog
//! - Name resolution of measures and dimensions against the catalog
//! - Filter compilation to bound predicates
//! - SQL planning and emission (values never inlined)
//! - Result shaping into `{label, total}` rows
//! - Drill-down and cross-filter state for charts
//!
//! # Architecture
//!
//! **Noun modules** (data structures):
//! - `catalog/` - table catalog (TableCatalogEntry, MetricDefinition, ...)
//! - `query/` - endpoint request and response bodies
//! - `plan/` - SELECT tree with positional parameters
//!
//! **Verb modules** (transformations):
//! - `parser/` - YAML → Catalog
//! - `resolver/` - request vocabulary → SQL fragments
//! - `filter/` - WhereRules → predicates + params
//! - `planner/` - measure + dimension + predicates → SelectQuery
//! - `emitter/` - SelectQuery → SQL text
//! - `shaper/` - driver rows → response rows
//! - `engine/` - endpoint bodies → responses, via a QueryRunner
//! - `drill/` - chart clicks → next module query
//!
//! # Example
//!
//! ```ignore
//! use bizquery::{catalog, Engine, EngineConfig};
//!
//! let engine = Engine::new(catalog::builtin()?, runner, EngineConfig::default());
//! let response = engine
//!     .handle_module_query("financeiro", serde_json::json!({
//!         "dataQuery": {"model": "financeiro.contas_pagar", "measure": "SUM(cp.valor_liquido)"}
//!     }))
//!     .await;
//! ```

pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod drill;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod filter;
pub mod parser;
pub mod plan;
pub mod planner;
pub mod query;
pub mod resolver;
pub mod shaper;

// Re-export commonly used types
pub use catalog::{Catalog, Module, TableCatalogEntry, TableName};
pub use config::{ConfigError, EngineConfig};
pub use drill::{ChartConfig, ChartSession, ClickedItem, DrillController, FilterStore, QueryTransport};
pub use emitter::{emit_sql, EmitError, RenderedQuery};
pub use engine::{Engine, EngineError, QueryCompiler, QueryRunner, RunnerError};
pub use error::ParseError;
pub use filter::{FilterError, FilterPolicy};
pub use plan::SelectQuery;
pub use planner::{build_query, PlanError};
pub use query::{AnalyticsRequest, AnalyticsResponse, DataQuery, EndpointResponse, ModuleQueryResponse};
pub use resolver::ResolveError;
