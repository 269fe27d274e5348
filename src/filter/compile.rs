//! Rule compilation
//!
//! Each accepted rule becomes one [`Predicate`] whose values live only in the
//! shared [`ParamList`]. Implicit predicates (date range, tenant scoping,
//! default status) are appended after the explicit rules.
//!
//! Tenant scoping comes from [`FilterContext`] alone. An explicit `tenant_id`
//! rule is never compiled, so request bodies cannot widen or switch tenants.

use serde_json::Value;
use tracing::{debug, warn};

use super::error::FilterError;
use super::policy::FilterPolicy;
use crate::catalog::{FilterDefinition, FilterOperator, TableCatalogEntry};
use crate::plan::{CompareOp, ParamList, Predicate};
use crate::query::WhereRule;

const TENANT_FIELD: &str = "tenant_id";
const STATUS_FIELD: &str = "status";

/// Inclusive date window on an already-validated column
#[derive(Debug, Clone, PartialEq)]
pub struct DateRange {
    pub column: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Request-scoped values that produce implicit predicates
#[derive(Debug, Clone, Default)]
pub struct FilterContext {
    pub tenant_id: Option<Value>,
    pub date_range: Option<DateRange>,
}

#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    pub predicates: Vec<Predicate>,
    pub params: ParamList,
    /// Rules skipped under the permissive policy
    pub dropped: Vec<FilterError>,
}

impl CompiledFilters {
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Whether `field` names the tenant, which only the request context may set
pub fn is_tenant_field(field: &str) -> bool {
    normalize_field(field) == TENANT_FIELD
}

/// Compile `rules` against the filters declared on `entry`
pub fn compile(
    entry: &TableCatalogEntry,
    rules: &[WhereRule],
    ctx: &FilterContext,
    policy: FilterPolicy,
) -> Result<CompiledFilters, FilterError> {
    let mut out = CompiledFilters::default();

    for rule in rules {
        match compile_rule(entry, rule, &mut out.params) {
            Ok(predicate) => out.predicates.push(predicate),
            Err(err) => {
                if policy.is_strict() {
                    return Err(err);
                }
                warn!(table = %entry.table, error = %err, "Dropping filter rule");
                out.dropped.push(err);
            }
        }
    }

    if let Some(range) = &ctx.date_range {
        push_date_range(range, &mut out);
    }

    if let (Some(tenant), Some(column)) = (non_null(ctx.tenant_id.as_ref()), &entry.tenant_column) {
        let param = out.params.push(tenant.clone());
        out.predicates.push(Predicate::Compare {
            column: entry.qualify(column),
            op: CompareOp::Eq,
            param,
        });
    }

    if let Some(status) = &entry.default_status {
        let caller_set_status = rules.iter().any(|r| normalize_field(&r.col) == STATUS_FIELD);
        if !caller_set_status && !status.values.is_empty() {
            let params = status
                .values
                .iter()
                .map(|v| out.params.push(Value::String(v.to_lowercase())))
                .collect();
            out.predicates.push(Predicate::In {
                column: format!("LOWER({})", entry.qualify(&status.column)),
                params,
            });
        }
    }

    debug!(
        table = %entry.table,
        predicates = out.predicates.len(),
        params = out.params.len(),
        dropped = out.dropped.len(),
        "Compiled filters"
    );
    Ok(out)
}

fn normalize_field(field: &str) -> String {
    field.trim().to_lowercase()
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn push_date_range(range: &DateRange, out: &mut CompiledFilters) {
    if let Some(from) = range.from.as_deref().filter(|s| !s.is_empty()) {
        let param = out.params.push(Value::String(from.to_string()));
        out.predicates.push(Predicate::Compare {
            column: range.column.clone(),
            op: CompareOp::GtEq,
            param,
        });
    }
    if let Some(to) = range.to.as_deref().filter(|s| !s.is_empty()) {
        let param = out.params.push(Value::String(to.to_string()));
        out.predicates.push(Predicate::Compare {
            column: range.column.clone(),
            op: CompareOp::LtEq,
            param,
        });
    }
}

// ----------------------------------------------------------------------------
// Single rule
// ----------------------------------------------------------------------------

fn compile_rule(
    entry: &TableCatalogEntry,
    rule: &WhereRule,
    params: &mut ParamList,
) -> Result<Predicate, FilterError> {
    if is_tenant_field(&rule.col) {
        return Err(FilterError::ReservedField {
            field: rule.col.trim().to_string(),
        });
    }

    let def = entry.get_filter(&rule.col).ok_or_else(|| FilterError::UnknownField {
        table: entry.table.to_string(),
        field: rule.col.clone(),
    })?;

    let op: FilterOperator = rule.op.parse().map_err(|_| FilterError::UnknownOperator {
        field: def.field.clone(),
        op: rule.op.clone(),
    })?;

    if !def.supports(op) {
        return Err(FilterError::UnsupportedOperator {
            field: def.field.clone(),
            op,
        });
    }

    let invalid = |reason: &str| FilterError::InvalidPayload {
        field: def.field.clone(),
        op,
        reason: reason.to_string(),
    };

    // Validate the whole payload before binding anything, so a rejected rule
    // leaves no orphan parameters behind.
    match op {
        FilterOperator::Eq | FilterOperator::Gte | FilterOperator::Lte => {
            let value = scalar(rule.val.as_ref()).ok_or_else(|| invalid("expected a scalar value"))?;
            let cmp = match op {
                FilterOperator::Gte => CompareOp::GtEq,
                FilterOperator::Lte => CompareOp::LtEq,
                _ => CompareOp::Eq,
            };
            let param = params.push(fold(def, value));
            Ok(Predicate::Compare {
                column: def.predicate_column(),
                op: cmp,
                param,
            })
        }
        FilterOperator::Contains => {
            let value = scalar(rule.val.as_ref()).ok_or_else(|| invalid("expected a scalar value"))?;
            let param = params.push(value.clone());
            Ok(Predicate::ILike {
                column: def.column.clone(),
                param,
            })
        }
        FilterOperator::In => {
            let values = list_payload(rule).ok_or_else(|| invalid("expected a non-empty list"))?;
            let refs = values.into_iter().map(|v| params.push(fold(def, v))).collect();
            Ok(Predicate::In {
                column: def.predicate_column(),
                params: refs,
            })
        }
        FilterOperator::Between => {
            let low = scalar(rule.start.as_ref()).ok_or_else(|| invalid("missing start bound"))?;
            let high = scalar(rule.end.as_ref()).ok_or_else(|| invalid("missing end bound"))?;
            let low = params.push(low.clone());
            let high = params.push(high.clone());
            Ok(Predicate::Between {
                column: def.column.clone(),
                low,
                high,
            })
        }
    }
}

fn scalar(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| matches!(v, Value::String(_) | Value::Number(_) | Value::Bool(_)))
}

/// `vals`, or an array given as `val`; every element must be scalar
fn list_payload(rule: &WhereRule) -> Option<Vec<&Value>> {
    let items: Vec<&Value> = match (&rule.vals, &rule.val) {
        (Some(vals), _) => vals.iter().collect(),
        (None, Some(Value::Array(vals))) => vals.iter().collect(),
        _ => return None,
    };
    if items.is_empty() || items.iter().any(|v| scalar(Some(v)).is_none()) {
        return None;
    }
    Some(items)
}

fn fold(def: &FilterDefinition, value: &Value) -> Value {
    match value {
        Value::String(s) if def.fold_case => Value::String(s.to_lowercase()),
        other => other.clone(),
    }
}
