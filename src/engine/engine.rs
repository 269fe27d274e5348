//! Endpoint handlers
//!
//! One round trip per request: compile, run under the configured timeout,
//! shape. Failures never escape; they become the 400 error envelope.

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::compiler::{CompiledQuery, QueryCompiler};
use super::error::EngineError;
use super::runner::{run_with_deadline, QueryRunner};
use crate::catalog::{builtin, Catalog};
use crate::config::EngineConfig;
use crate::query::{
    AnalyticsMeta, AnalyticsRequest, AnalyticsResponse, AnalyticsRow, EndpointResponse, ModuleQueryBody,
    ModuleQueryResponse, ModuleRow,
};
use crate::resolver::normalize_id;
use crate::shaper::{shape, Shaped};

pub struct Engine {
    compiler: QueryCompiler,
    runner: Arc<dyn QueryRunner>,
}

impl Engine {
    pub fn new(catalog: Arc<Catalog>, runner: Arc<dyn QueryRunner>, config: EngineConfig) -> Self {
        Self {
            compiler: QueryCompiler::new(catalog, config),
            runner,
        }
    }

    /// Engine over the catalog named by `config.catalog_path`, or the
    /// built-in one
    pub fn from_config(runner: Arc<dyn QueryRunner>, config: EngineConfig) -> Result<Self, EngineError> {
        let catalog = load_catalog(&config)?;
        Ok(Self::new(catalog, runner, config))
    }

    pub fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    pub fn catalog(&self) -> &Catalog {
        self.compiler.catalog()
    }

    // ------------------------------------------------------------------------
    // Module query endpoint
    // ------------------------------------------------------------------------

    /// `POST /api/modulos/{module}/query`
    pub async fn handle_module_query(&self, module: &str, body: Value) -> EndpointResponse {
        self.handle_module_query_with(module, body, CancellationToken::new())
            .await
    }

    pub async fn handle_module_query_with(
        &self,
        module: &str,
        body: Value,
        cancel: CancellationToken,
    ) -> EndpointResponse {
        match self.module_query(module, body, &cancel).await {
            Ok(response) => EndpointResponse::ok(&response),
            Err(e) => error_response("module query", e),
        }
    }

    /// Typed form of the module query endpoint
    pub async fn module_query(
        &self,
        module: &str,
        body: Value,
        cancel: &CancellationToken,
    ) -> Result<ModuleQueryResponse, EngineError> {
        let body: ModuleQueryBody = serde_json::from_value(body)?;
        let compiled = self.compiler.compile_module_query(module, &body.data_query)?;
        let shaped = self.execute(&compiled, cancel).await?;

        let rows = match shaped {
            Shaped::Grouped(rows) => rows
                .into_iter()
                .map(|r| ModuleRow::Grouped {
                    key: r.key,
                    label: r.label,
                    value: r.total,
                })
                .collect(),
            Shaped::Total { total } => vec![ModuleRow::Total { total }],
        };

        Ok(ModuleQueryResponse {
            success: true,
            rows,
            sql_query: compiled.rendered.sql,
            sql_params: compiled.rendered.params,
        })
    }

    // ------------------------------------------------------------------------
    // Analytics endpoint
    // ------------------------------------------------------------------------

    /// `POST /api/analytics`
    pub async fn handle_analytics(&self, body: Value) -> EndpointResponse {
        self.handle_analytics_with(body, CancellationToken::new()).await
    }

    pub async fn handle_analytics_with(&self, body: Value, cancel: CancellationToken) -> EndpointResponse {
        match self.analytics(body, &cancel).await {
            Ok(response) => EndpointResponse::ok(&response),
            Err(e) => error_response("analytics", e),
        }
    }

    /// Typed form of the analytics endpoint
    pub async fn analytics(&self, body: Value, cancel: &CancellationToken) -> Result<AnalyticsResponse, EngineError> {
        let request: AnalyticsRequest = serde_json::from_value(body)?;
        let compiled = self.compiler.compile_analytics(&request)?;
        let shaped = self.execute(&compiled, cancel).await?;

        let rows = shaped
            .into_rows()
            .into_iter()
            .map(|r| AnalyticsRow {
                label: r.label,
                total: r.total,
            })
            .collect();

        let meta = AnalyticsMeta {
            sql: compiled.rendered.sql.clone(),
            params: compiled.rendered.params.clone(),
            measure: compiled.measure.expr.clone(),
            dimension: requested_dimension(&request),
            date_column: compiled.date_range.as_ref().map(|r| r.column.clone()),
            from: compiled.date_range.as_ref().and_then(|r| r.from.clone()),
            to: compiled.date_range.as_ref().and_then(|r| r.to.clone()),
            limit: compiled.limit,
            order: compiled.ordering.to_string(),
        };

        Ok(AnalyticsResponse {
            success: true,
            source: request.source.trim().to_string(),
            rows,
            meta,
        })
    }

    async fn execute(&self, compiled: &CompiledQuery, cancel: &CancellationToken) -> Result<Shaped, EngineError> {
        let started = Instant::now();
        let rows = run_with_deadline(
            self.runner.as_ref(),
            &compiled.rendered.sql,
            &compiled.rendered.params,
            self.compiler.config().query_timeout(),
            cancel,
        )
        .await?;

        info!(
            table = %compiled.table,
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Executed query"
        );
        Ok(shape(&rows, compiled.has_dimension()))
    }
}

/// The requested dimension id as echoed in `meta`, resolvable or not
fn requested_dimension(request: &AnalyticsRequest) -> Option<String> {
    request
        .dimension
        .as_deref()
        .map(normalize_id)
        .filter(|id| !id.is_empty())
}

fn load_catalog(config: &EngineConfig) -> Result<Arc<Catalog>, EngineError> {
    let catalog = match &config.catalog_path {
        Some(path) => Arc::new(Catalog::from_file(path)?),
        None => builtin()?,
    };
    Ok(catalog)
}

fn error_response(endpoint: &str, e: EngineError) -> EndpointResponse {
    error!(endpoint, error = %e, "Request failed");
    EndpointResponse::error(e.status_code(), e.to_string())
}
