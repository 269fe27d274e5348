//! SQL emitter
//!
//! Renders a [`SelectQuery`] into single-line PostgreSQL with `$n`
//! placeholders, returning the text together with its bound values.

use serde::Serialize;
use serde_json::Value;

use super::error::EmitError;
use crate::plan::{JoinClause, JoinType, ParamList, ParamRef, Predicate, SelectItem, SelectQuery, TableRef};
use crate::query::{OrderKey, Ordering, SortDirection};

/// SQL text plus the values for `$1..$n`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Render a statement
pub fn emit_sql(query: &SelectQuery) -> Result<RenderedQuery, EmitError> {
    if query.select.is_empty() {
        return Err(EmitError::EmptySelect);
    }

    let mut parts = vec![
        format!("SELECT {}", emit_select_list(&query.select)),
        format!("FROM {}", emit_table(&query.from)),
    ];
    parts.extend(query.joins.iter().map(emit_join));

    if !query.predicates.is_empty() {
        let conjuncts = query
            .predicates
            .iter()
            .map(|p| emit_predicate(p, &query.params))
            .collect::<Result<Vec<_>, _>>()?;
        parts.push(format!("WHERE {}", conjuncts.join(" AND ")));
    }

    if query.is_grouped() {
        for &ordinal in &query.group_by {
            if ordinal == 0 || ordinal > query.select.len() {
                return Err(EmitError::InvalidGroupOrdinal {
                    ordinal,
                    columns: query.select.len(),
                });
            }
        }
        let ordinals: Vec<String> = query.group_by.iter().map(usize::to_string).collect();
        parts.push(format!("GROUP BY {}", ordinals.join(", ")));
    }

    if let Some(ordering) = &query.order_by {
        parts.push(emit_order(ordering));
    }
    if let Some(limit) = query.limit {
        parts.push(format!("LIMIT {}", limit));
    }

    Ok(RenderedQuery {
        sql: parts.join(" "),
        params: query.params.values().to_vec(),
    })
}

// ---------------------------------------------------------------------------
// Relations
// ---------------------------------------------------------------------------

fn emit_select_list(items: &[SelectItem]) -> String {
    items
        .iter()
        .map(|item| format!("{} AS {}", item.expr, item.alias))
        .collect::<Vec<_>>()
        .join(", ")
}

fn emit_table(table: &TableRef) -> String {
    format!("{} {}", table.table, table.alias)
}

fn emit_join(join: &JoinClause) -> String {
    let kw = match join.join_type {
        JoinType::Inner => "JOIN",
        JoinType::Left => "LEFT JOIN",
    };
    format!("{} {} ON {}", kw, emit_table(&join.table), join.on)
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

fn emit_predicate(predicate: &Predicate, params: &ParamList) -> Result<String, EmitError> {
    for param in predicate.params() {
        check_param(param, params)?;
    }
    Ok(match predicate {
        Predicate::Compare { column, op, param } => format!("{} {} {}", column, op.as_str(), param),
        Predicate::In { column, params: refs } => {
            if refs.is_empty() {
                return Err(EmitError::EmptyInList(column.clone()));
            }
            let list: Vec<String> = refs.iter().map(ParamRef::to_string).collect();
            format!("{} IN ({})", column, list.join(", "))
        }
        Predicate::Between { column, low, high } => format!("{} BETWEEN {} AND {}", column, low, high),
        Predicate::ILike { column, param } => format!("{} ILIKE {}", column, param),
    })
}

fn check_param(param: ParamRef, params: &ParamList) -> Result<(), EmitError> {
    if params.contains(param) {
        Ok(())
    } else {
        Err(EmitError::ParamOutOfRange {
            index: param.index(),
            bound: params.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

fn emit_order(ordering: &Ordering) -> String {
    let dir = match ordering.direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    match ordering.key {
        OrderKey::Total => format!("ORDER BY total {} NULLS LAST", dir),
        OrderKey::Label => format!("ORDER BY label {}", dir),
    }
}
