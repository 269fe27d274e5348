//! Dimension resolution

use serde::Serialize;
use tracing::debug;

use super::error::ResolveError;
use super::names::normalize_id;
use super::patterns::{expression_key, free_form_dimension};
use crate::catalog::{DimensionDefinition, TableCatalogEntry, TimeGrain};

/// A grouping axis ready for the select list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDimension {
    /// Catalog id, when the dimension came from the catalog
    pub id: Option<String>,
    pub label_expr: String,
    pub key_expr: Option<String>,
    /// Grain used for time dimensions
    pub grain: Option<TimeGrain>,
}

impl ResolvedDimension {
    fn from_definition(
        entry: &TableCatalogEntry,
        dim: &DimensionDefinition,
        grain: TimeGrain,
    ) -> Result<Self, ResolveError> {
        let label_expr = dim
            .label_expr(grain)
            .ok_or_else(|| ResolveError::MissingExpression {
                table: entry.table.to_string(),
                dimension: dim.id.clone(),
            })?;
        Ok(ResolvedDimension {
            id: Some(dim.id.clone()),
            label_expr,
            key_expr: dim.distinct_key_expr().map(str::to_string),
            grain: dim.is_time().then_some(grain),
        })
    }
}

/// Find a dimension by id or alias (`Centros-Custo` finds `centro_custo`)
pub fn find_dimension<'a>(entry: &'a TableCatalogEntry, id: &str) -> Option<&'a DimensionDefinition> {
    let key = normalize_id(id);
    entry
        .dimensions
        .iter()
        .find(|d| d.id == key || d.aliases.iter().any(|a| normalize_id(a) == key))
}

/// Resolve a dimension id at an optional grain
///
/// Unknown grains bucket by month.
pub fn resolve_dimension(
    entry: &TableCatalogEntry,
    id: &str,
    grain: Option<&str>,
) -> Result<ResolvedDimension, ResolveError> {
    let dim = find_dimension(entry, id).ok_or_else(|| ResolveError::UnknownDimension {
        table: entry.table.to_string(),
        dimension: id.trim().to_string(),
    })?;

    let parsed = TimeGrain::parse_or_default(grain);
    if dim.is_time() {
        debug!(table = %entry.table, dimension = %dim.id, grain = %parsed, "time dimension");
    }
    ResolvedDimension::from_definition(entry, dim, parsed)
}

/// Resolve a raw dimension expression
///
/// Accepted when it equals a declared expression of this table (compared
/// without whitespace or case) or matches the date-bucket allow-pattern.
pub fn resolve_dimension_expr(
    entry: &TableCatalogEntry,
    expr: &str,
) -> Result<ResolvedDimension, ResolveError> {
    let key = expression_key(expr)?;

    for dim in &entry.dimensions {
        if let Some(label) = &dim.expr {
            if expression_key(label)? == key {
                return ResolvedDimension::from_definition(entry, dim, TimeGrain::default());
            }
        }
        if dim.is_time() {
            for grain in TimeGrain::ALL {
                if let Some(grain_expr) = dim.expr_for_grain(grain) {
                    if expression_key(&grain_expr)? == key {
                        return ResolvedDimension::from_definition(entry, dim, grain);
                    }
                }
            }
        }
        for declared in dim.declared_exprs() {
            if expression_key(&declared)? == key {
                return Ok(ResolvedDimension {
                    id: Some(dim.id.clone()),
                    label_expr: declared,
                    key_expr: None,
                    grain: None,
                });
            }
        }
    }

    match free_form_dimension(expr, entry.alias())? {
        Some((label_expr, grain)) => {
            debug!(table = %entry.table, expr = %label_expr, "free-form dimension accepted");
            Ok(ResolvedDimension {
                id: None,
                label_expr,
                key_expr: None,
                grain,
            })
        }
        None => Err(ResolveError::RejectedExpression(expr.trim().to_string())),
    }
}
