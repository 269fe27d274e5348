//! Statement assembly
//!
//! Turns resolved parts into a [`SelectQuery`]:
//!
//! ```text
//! SELECT <label> AS label, COALESCE(<measure>, 0) AS total [, <key> AS key]
//! FROM <source> [JOIN ...]
//! [WHERE ...]
//! GROUP BY 1[, 3] ORDER BY ... LIMIT n
//! ```
//!
//! Without a dimension only the `total` column is selected and there is no
//! GROUP BY, ORDER BY or LIMIT.

use tracing::debug;

use super::error::PlanError;
use crate::catalog::{JoinKind, TableCatalogEntry};
use crate::filter::CompiledFilters;
use crate::plan::{JoinClause, JoinType, SelectItem, SelectQuery, TableRef};
use crate::query::Ordering;
use crate::resolver::{ResolvedDimension, ResolvedMeasure};

pub const LABEL_COLUMN: &str = "label";
pub const TOTAL_COLUMN: &str = "total";
pub const KEY_COLUMN: &str = "key";

/// Build the statement for one table
///
/// `ordering` and `limit` only apply when a dimension is present.
pub fn build_query(
    entry: &TableCatalogEntry,
    measure: &ResolvedMeasure,
    dimension: Option<&ResolvedDimension>,
    filters: CompiledFilters,
    ordering: Ordering,
    limit: u32,
) -> Result<SelectQuery, PlanError> {
    if measure.expr.trim().is_empty() {
        return Err(PlanError::EmptyMeasure(entry.table.to_string()));
    }
    let total = SelectItem::new(format!("COALESCE({}, 0)", measure.expr), TOTAL_COLUMN);

    let mut query = SelectQuery {
        select: Vec::new(),
        from: TableRef {
            table: entry.source.table.clone(),
            alias: entry.source.alias.clone(),
        },
        joins: plan_joins(entry),
        predicates: filters.predicates,
        group_by: Vec::new(),
        order_by: None,
        limit: None,
        params: filters.params,
    };

    match dimension {
        None => query.select.push(total),
        Some(dim) => {
            if dim.label_expr.trim().is_empty() {
                return Err(PlanError::EmptyDimension(entry.table.to_string()));
            }
            query.select.push(SelectItem::new(dim.label_expr.clone(), LABEL_COLUMN));
            query.select.push(total);
            query.group_by.push(1);
            if let Some(key) = &dim.key_expr {
                query.select.push(SelectItem::new(key.clone(), KEY_COLUMN));
                query.group_by.push(3);
            }
            query.order_by = Some(ordering);
            query.limit = Some(limit);
        }
    }

    debug!(
        table = %entry.table,
        grouped = query.is_grouped(),
        joins = query.joins.len(),
        predicates = query.predicates.len(),
        "Planned query"
    );
    Ok(query)
}

fn plan_joins(entry: &TableCatalogEntry) -> Vec<JoinClause> {
    entry
        .joins
        .iter()
        .map(|j| JoinClause {
            join_type: match j.kind {
                JoinKind::Inner => JoinType::Inner,
                JoinKind::Left => JoinType::Left,
            },
            table: TableRef {
                table: j.table.clone(),
                alias: j.alias.clone(),
            },
            on: j.on.clone(),
        })
        .collect()
}
