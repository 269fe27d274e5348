//! Measure resolution

use serde::Serialize;
use tracing::{debug, warn};

use super::error::ResolveError;
use super::patterns::{expression_key, free_form_measure};
use crate::catalog::TableCatalogEntry;

/// How a requested measure was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureSource {
    /// Matched a metric id
    Metric,
    /// Matched one of a metric's expressions (canonical or legacy spelling)
    Expression,
    /// Passed the free-form allow-pattern
    FreeForm,
    /// Nothing matched; the table's first metric was used
    Default,
}

/// A measure ready to be wrapped in `COALESCE(expr, 0)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMeasure {
    pub expr: String,
    pub metric_id: Option<String>,
    pub source: MeasureSource,
}

/// Resolve a requested measure (metric id, metric expression, or free-form
/// aggregate) to the SQL emitted for it
pub fn resolve_measure(
    entry: &TableCatalogEntry,
    requested: Option<&str>,
) -> Result<ResolvedMeasure, ResolveError> {
    let requested = requested.map(str::trim).filter(|s| !s.is_empty());
    let Some(requested) = requested else {
        return default_measure(entry);
    };

    // 1. Metric id
    if let Some(metric) = entry.get_metric(requested) {
        if let Some(expr) = metric.canonical_expr() {
            return Ok(ResolvedMeasure {
                expr: expr.to_string(),
                metric_id: Some(metric.id.clone()),
                source: MeasureSource::Metric,
            });
        }
    }

    // 2. Any declared spelling of a metric
    let key = expression_key(requested)?;
    for metric in &entry.metrics {
        for expr in &metric.expressions {
            if expression_key(expr)? == key {
                if let Some(canonical) = metric.canonical_expr() {
                    debug!(table = %entry.table, requested, metric = %metric.id, "measure matched metric expression");
                    return Ok(ResolvedMeasure {
                        expr: canonical.to_string(),
                        metric_id: Some(metric.id.clone()),
                        source: MeasureSource::Expression,
                    });
                }
            }
        }
    }

    // 3. Free-form aggregate over this table's columns
    if let Some(expr) = free_form_measure(requested, entry.alias())? {
        debug!(table = %entry.table, requested, expr = %expr, "free-form measure accepted");
        return Ok(ResolvedMeasure {
            expr,
            metric_id: None,
            source: MeasureSource::FreeForm,
        });
    }

    warn!(table = %entry.table, requested, "measure not recognised, using default metric");
    default_measure(entry)
}

fn default_measure(entry: &TableCatalogEntry) -> Result<ResolvedMeasure, ResolveError> {
    let metric = entry
        .default_metric()
        .ok_or_else(|| ResolveError::NoMetrics(entry.table.to_string()))?;
    let expr = metric
        .canonical_expr()
        .ok_or_else(|| ResolveError::NoMetrics(entry.table.to_string()))?;
    Ok(ResolvedMeasure {
        expr: expr.to_string(),
        metric_id: Some(metric.id.clone()),
        source: MeasureSource::Default,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{builtin, TableName};

    fn resolve(table: TableName, requested: Option<&str>) -> ResolvedMeasure {
        let catalog = builtin().unwrap();
        let entry = catalog.get(table).unwrap();
        resolve_measure(entry, requested).unwrap()
    }

    #[test]
    fn test_metric_id() {
        let m = resolve(TableName::FinanceiroContasPagar, Some("valor_total"));
        assert_eq!(m.expr, "SUM(cp.valor_liquido)");
        assert_eq!(m.metric_id.as_deref(), Some("valor_total"));
        assert_eq!(m.source, MeasureSource::Metric);
    }

    #[test]
    fn test_legacy_spellings() {
        let m = resolve(TableName::VendasPedidos, Some("sum(itens.subtotal)"));
        assert_eq!(m.expr, "SUM(i.subtotal)");
        assert_eq!(m.source, MeasureSource::Expression);

        let m = resolve(TableName::VendasPedidos, Some("COUNT()"));
        assert_eq!(m.expr, "COUNT(DISTINCT p.id)");
        assert_eq!(m.metric_id.as_deref(), Some("pedidos"));

        let m = resolve(TableName::VendasPedidos, Some("COUNT_DISTINCT(pedido_id)"));
        assert_eq!(m.expr, "COUNT(DISTINCT p.id)");
    }

    #[test]
    fn test_free_form() {
        let m = resolve(TableName::FinanceiroContasPagar, Some("MAX(valor_liquido)"));
        assert_eq!(m.expr, "MAX(cp.valor_liquido)");
        assert_eq!(m.metric_id, None);
        assert_eq!(m.source, MeasureSource::FreeForm);
    }

    #[test]
    fn test_fallback_to_default_metric() {
        for requested in [None, Some(""), Some("   "), Some("DROP TABLE x"), Some("nope()")] {
            let m = resolve(TableName::CrmOportunidades, requested);
            assert_eq!(m.expr, "SUM(o.valor_estimado)", "{:?}", requested);
            assert_eq!(m.source, MeasureSource::Default);
        }
    }
}
