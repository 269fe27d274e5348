//! Request → SQL, without touching a database
//!
//! Runs the whole pipeline (lookup, resolution, filter compilation, planning,
//! emission) for both endpoint shapes.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use super::convert::{rules_from_filter_map, tenant_from_filter_map};
use super::error::EngineError;
use crate::catalog::{Catalog, Module, TableCatalogEntry, TableName};
use crate::config::EngineConfig;
use crate::emitter::{emit_sql, RenderedQuery};
use crate::filter::{compile, DateRange, FilterContext, FilterError};
use crate::planner::{build_query, clamp_limit};
use crate::query::{AnalyticsRequest, DataQuery, ModuleQueryBody, Ordering, WhereRule};
use crate::resolver::{
    is_column_ref, resolve_dimension, resolve_dimension_expr, resolve_measure, ResolvedDimension,
    ResolvedMeasure,
};

/// A statement ready to run, plus what went into it
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub table: TableName,
    pub rendered: RenderedQuery,
    pub measure: ResolvedMeasure,
    pub dimension: Option<ResolvedDimension>,
    pub date_range: Option<DateRange>,
    pub ordering: Ordering,
    pub limit: u32,
    /// Filter rules skipped under the permissive policy
    pub dropped: Vec<FilterError>,
}

impl CompiledQuery {
    pub fn has_dimension(&self) -> bool {
        self.dimension.is_some()
    }

    /// JSON summary printed by `bizquery compile`
    pub fn describe(&self) -> Value {
        json!({
            "table": self.table,
            "sql": self.rendered.sql,
            "params": self.rendered.params,
            "measure": self.measure.expr,
            "label_expr": self.dimension.as_ref().map(|d| &d.label_expr),
            "order": self.ordering.to_string(),
            "limit": self.limit,
            "dropped": self.dropped.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        })
    }
}

/// Catalog + config; cheap to clone
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    catalog: Arc<Catalog>,
    config: EngineConfig,
}

/// Shared request parts, whichever endpoint they came from
struct QueryParts<'a> {
    measure: Option<&'a str>,
    dimension: Option<&'a str>,
    dimension_expr: Option<&'a str>,
    grain: Option<&'a str>,
    rules: Vec<WhereRule>,
    ctx: FilterContext,
    ordering: Ordering,
    limit: u32,
}

impl QueryCompiler {
    pub fn new(catalog: Arc<Catalog>, config: EngineConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The catalog entry a module endpoint serves for `model`
    pub fn module_entry(&self, module: &str, model: &str) -> Result<&TableCatalogEntry, EngineError> {
        let module: Module = module
            .parse()
            .map_err(|_| EngineError::UnknownModule(module.trim().to_string()))?;
        if model.trim().is_empty() {
            return Err(EngineError::BadRequest("dataQuery.model is required".to_string()));
        }

        // Accept both `financeiro.contas_pagar` and the bare `contas_pagar`
        let entry = match self.catalog.lookup(model) {
            Ok(entry) => entry,
            Err(err) => self
                .catalog
                .lookup(&format!("{}.{}", module, model.trim()))
                .map_err(|_| err)?,
        };
        if entry.module() != module {
            return Err(EngineError::ModuleMismatch {
                table: entry.table.to_string(),
                module: module.to_string(),
            });
        }
        Ok(entry)
    }

    /// Compile a module-endpoint data query; the table must belong to `module`
    pub fn compile_module_query(&self, module: &str, query: &DataQuery) -> Result<CompiledQuery, EngineError> {
        let entry = self.module_entry(module, &query.model)?;

        let parts = QueryParts {
            measure: query.measure.as_deref(),
            dimension: query.dimension.as_deref(),
            dimension_expr: query.dimension_expr.as_deref(),
            grain: query.grain.as_deref(),
            rules: rules_from_filter_map(entry, &query.filters),
            ctx: FilterContext {
                tenant_id: tenant_from_filter_map(&query.filters),
                date_range: None,
            },
            ordering: query.order_by.as_ref().map(|o| o.ordering()).unwrap_or_default(),
            limit: clamp_limit(query.limit.as_ref(), self.config.default_limit),
        };
        self.compile_parts(entry, parts)
    }

    /// Compile a raw endpoint body: a module query body when `module` is
    /// given, an analytics request otherwise
    pub fn compile_body(&self, module: Option<&str>, body: Value) -> Result<CompiledQuery, EngineError> {
        match module {
            Some(module) => {
                let body: ModuleQueryBody = serde_json::from_value(body)?;
                self.compile_module_query(module, &body.data_query)
            }
            None => {
                let request: AnalyticsRequest = serde_json::from_value(body)?;
                self.compile_analytics(&request)
            }
        }
    }

    /// Compile an analytics request
    pub fn compile_analytics(&self, request: &AnalyticsRequest) -> Result<CompiledQuery, EngineError> {
        if request.source.trim().is_empty() {
            return Err(EngineError::BadRequest("source is required".to_string()));
        }
        let entry = self.catalog.lookup(&request.source)?;

        let parts = QueryParts {
            measure: request.measure.as_deref(),
            dimension: request.dimension.as_deref(),
            dimension_expr: request.dimension_expr.as_deref(),
            grain: request.grain.as_deref(),
            rules: request.where_rules.clone(),
            ctx: FilterContext {
                tenant_id: request.tenant_id.clone(),
                date_range: date_range(entry, request),
            },
            ordering: request.order.as_ref().map(|o| o.ordering()).unwrap_or_default(),
            limit: clamp_limit(request.limit.as_ref(), self.config.default_limit),
        };
        self.compile_parts(entry, parts)
    }

    fn compile_parts(&self, entry: &TableCatalogEntry, parts: QueryParts<'_>) -> Result<CompiledQuery, EngineError> {
        let policy = self.config.filter_policy;
        let measure = resolve_measure(entry, parts.measure)?;

        let requested_expr = parts.dimension_expr.map(str::trim).filter(|s| !s.is_empty());
        let requested_dim = parts.dimension.map(str::trim).filter(|s| !s.is_empty());
        let resolved = match (requested_expr, requested_dim) {
            (Some(expr), _) => Some(resolve_dimension_expr(entry, expr)),
            (None, Some(id)) => Some(resolve_dimension(entry, id, parts.grain)),
            (None, None) => None,
        };
        let dimension = match resolved {
            None => None,
            Some(Ok(dim)) => Some(dim),
            Some(Err(err)) if policy.is_strict() => return Err(err.into()),
            Some(Err(err)) => {
                warn!(table = %entry.table, error = %err, "Invalid dimension; falling back to aggregate-only");
                None
            }
        };

        let date_range = parts.ctx.date_range.clone();
        let filters = compile(entry, &parts.rules, &parts.ctx, policy)?;
        let dropped = filters.dropped.clone();

        let select = build_query(entry, &measure, dimension.as_ref(), filters, parts.ordering, parts.limit)?;
        let rendered = emit_sql(&select)?;
        debug!(table = %entry.table, sql = %rendered.sql, params = rendered.params.len(), "Compiled query");

        Ok(CompiledQuery {
            table: entry.table,
            rendered,
            measure,
            dimension,
            date_range,
            ordering: parts.ordering,
            limit: parts.limit,
            dropped,
        })
    }
}

/// Date window for an analytics request
///
/// A requested `dateColumn` must be a plain column reference; anything else
/// falls back to the table's default time field.
fn date_range(entry: &TableCatalogEntry, request: &AnalyticsRequest) -> Option<DateRange> {
    let from = request.from.clone().filter(|s| !s.trim().is_empty());
    let to = request.to.clone().filter(|s| !s.trim().is_empty());

    let requested = request.date_column.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let column = match requested {
        Some(col) if is_column_ref(col).unwrap_or(false) => Some(entry.qualify(col)),
        Some(col) => {
            warn!(table = %entry.table, column = col, "Rejected dateColumn; using default time field");
            entry.default_date_column()
        }
        None => entry.default_date_column(),
    }?;

    Some(DateRange { column, from, to })
}
