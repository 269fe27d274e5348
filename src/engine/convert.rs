//! Module-query filter maps → WhereRules

use serde_json::Value;
use std::collections::BTreeMap;

use crate::catalog::{FilterOperator, TableCatalogEntry};
use crate::filter::is_tenant_field;
use crate::query::WhereRule;

/// The map's `tenant_id`, which scopes the request instead of becoming a rule
pub fn tenant_from_filter_map(filters: &BTreeMap<String, Value>) -> Option<Value> {
    filters
        .iter()
        .find(|(field, value)| is_tenant_field(field) && !value.is_null())
        .map(|(_, value)| value.clone())
}

/// Convert a `{field: value}` map into rules
///
/// - `tenant_id` is skipped; see [`tenant_from_filter_map`]
/// - `null`, `""` and `[]` mean "not set" and are skipped
/// - arrays become `in`
/// - `{start, end}` objects become `between`
/// - scalars use the field's scalar operator (`eq` when declared); unknown
///   fields get `eq` and are left to the filter engine to drop or reject
pub fn rules_from_filter_map(entry: &TableCatalogEntry, filters: &BTreeMap<String, Value>) -> Vec<WhereRule> {
    filters
        .iter()
        .filter(|(field, _)| !is_tenant_field(field))
        .filter_map(|(field, value)| rule_for(entry, field, value))
        .collect()
}

fn rule_for(entry: &TableCatalogEntry, field: &str, value: &Value) -> Option<WhereRule> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(WhereRule::in_list(field, items.clone())),
        Value::Object(map) if map.contains_key("start") || map.contains_key("end") => Some(WhereRule {
            col: field.to_string(),
            op: FilterOperator::Between.as_str().to_string(),
            start: map.get("start").cloned(),
            end: map.get("end").cloned(),
            ..Default::default()
        }),
        other => {
            let op = entry
                .get_filter(field)
                .and_then(|def| def.scalar_operator())
                .unwrap_or(FilterOperator::Eq);
            Some(WhereRule::scalar(field, op.as_str(), other.clone()))
        }
    }
}
