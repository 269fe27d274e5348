use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One user-supplied filter rule
///
/// `op` stays a string here so an unknown operator can be dropped (or
/// reported) by the filter engine instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhereRule {
    pub col: String,
    #[serde(default = "default_op")]
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vals: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Value>,
}

fn default_op() -> String {
    "=".to_string()
}

impl WhereRule {
    pub fn eq(col: impl Into<String>, val: impl Into<Value>) -> Self {
        Self::scalar(col, "eq", val)
    }

    pub fn scalar(col: impl Into<String>, op: impl Into<String>, val: impl Into<Value>) -> Self {
        WhereRule {
            col: col.into(),
            op: op.into(),
            val: Some(val.into()),
            ..Default::default()
        }
    }

    pub fn in_list(col: impl Into<String>, vals: Vec<Value>) -> Self {
        WhereRule {
            col: col.into(),
            op: "in".to_string(),
            vals: Some(vals),
            ..Default::default()
        }
    }

    pub fn between(col: impl Into<String>, start: impl Into<Value>, end: impl Into<Value>) -> Self {
        WhereRule {
            col: col.into(),
            op: "between".to_string(),
            start: Some(start.into()),
            end: Some(end.into()),
            ..Default::default()
        }
    }
}

// ============================================================================
// Ordering
// ============================================================================

/// What the grouped result is sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKey {
    #[default]
    Total,
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SortDirection {
    #[serde(rename = "ASC")]
    Asc,
    #[default]
    #[serde(rename = "DESC")]
    Desc,
}

/// Effective ordering: `value DESC` unless the request says otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Ordering {
    pub key: OrderKey,
    pub direction: SortDirection,
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.key {
            OrderKey::Total => "value",
            OrderKey::Label => "label",
        };
        let dir = match self.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        write!(f, "{} {}", key, dir)
    }
}

/// Ordering as it arrives on the wire: `"value DESC"`, `"label"`, `"asc"`,
/// or `{field, dir}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderBySpec {
    Text(String),
    Field {
        field: String,
        #[serde(default)]
        dir: Option<String>,
    },
}

impl OrderBySpec {
    /// Lenient interpretation; anything unrecognised sorts by value descending
    pub fn ordering(&self) -> Ordering {
        let (field, dir) = match self {
            OrderBySpec::Text(text) => {
                let mut parts = text.split_whitespace();
                let first = parts.next().unwrap_or_default().to_lowercase();
                let second = parts.next().map(str::to_lowercase);
                match first.as_str() {
                    "asc" | "desc" => ("value".to_string(), Some(first)),
                    _ => (first, second),
                }
            }
            OrderBySpec::Field { field, dir } => (field.trim().to_lowercase(), dir.as_ref().map(|d| d.trim().to_lowercase())),
        };

        let key = match field.as_str() {
            "label" | "dimension" | "name" => OrderKey::Label,
            _ => OrderKey::Total,
        };
        // Labels default to ascending, totals to descending
        let direction = match (dir.as_deref(), key) {
            (Some("asc"), _) => SortDirection::Asc,
            (Some("desc"), _) => SortDirection::Desc,
            (_, OrderKey::Label) => SortDirection::Asc,
            (_, OrderKey::Total) => SortDirection::Desc,
        };
        Ordering { key, direction }
    }
}

// ============================================================================
// Module query endpoint
// ============================================================================

/// `POST /api/modulos/{module}/query` body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleQueryBody {
    #[serde(rename = "dataQuery")]
    pub data_query: DataQuery,
}

/// A chart's data query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQuery {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    #[serde(default, rename = "dimensionExpr", skip_serializing_if = "Option::is_none")]
    pub dimension_expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure: Option<String>,
    /// Field name to scalar or array value
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, Value>,
    #[serde(default, rename = "orderBy", skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Value>,
}

impl DataQuery {
    /// Module prefix of the model id (`financeiro.contas_pagar` -> `financeiro`)
    pub fn module_prefix(&self) -> &str {
        self.model.split('.').next().unwrap_or_default().trim()
    }
}

// ============================================================================
// Analytics endpoint
// ============================================================================

/// `POST /api/analytics` body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRequest {
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    #[serde(default, rename = "dimensionExpr", skip_serializing_if = "Option::is_none")]
    pub dimension_expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grain: Option<String>,
    #[serde(default, rename = "dateColumn", skip_serializing_if = "Option::is_none")]
    pub date_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub where_rules: Vec<WhereRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderBySpec>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_by_spellings() {
        let cases = [
            (json!("value DESC"), OrderKey::Total, SortDirection::Desc),
            (json!("value ASC"), OrderKey::Total, SortDirection::Asc),
            (json!("label ASC"), OrderKey::Label, SortDirection::Asc),
            (json!("label DESC"), OrderKey::Label, SortDirection::Desc),
            (json!("label"), OrderKey::Label, SortDirection::Asc),
            (json!("asc"), OrderKey::Total, SortDirection::Asc),
            (json!({"field": "label", "dir": "desc"}), OrderKey::Label, SortDirection::Desc),
            (json!({"field": "measure"}), OrderKey::Total, SortDirection::Desc),
            (json!("random garbage"), OrderKey::Total, SortDirection::Desc),
        ];
        for (raw, key, direction) in cases {
            let spec: OrderBySpec = serde_json::from_value(raw.clone()).unwrap();
            assert_eq!(spec.ordering(), Ordering { key, direction }, "{}", raw);
        }
    }

    #[test]
    fn test_module_body_deserializes() {
        let body: ModuleQueryBody = serde_json::from_value(json!({
            "dataQuery": {
                "model": "financeiro.contas_pagar",
                "dimension": "fornecedor",
                "measure": "valor_total",
                "filters": { "status": ["aberto", "pendente"], "de": "2024-01-01" },
                "orderBy": "value DESC",
                "limit": 10
            }
        }))
        .unwrap();

        let q = body.data_query;
        assert_eq!(q.module_prefix(), "financeiro");
        assert_eq!(q.filters.len(), 2);
        assert_eq!(q.limit, Some(json!(10)));
    }

    #[test]
    fn test_where_rule_defaults_to_eq() {
        let rule: WhereRule = serde_json::from_value(json!({"col": "status", "val": "aberto"})).unwrap();
        assert_eq!(rule.op, "=");
        assert_eq!(rule.val, Some(json!("aberto")));
    }

    #[test]
    fn test_analytics_request_where_key() {
        let req: AnalyticsRequest = serde_json::from_value(json!({
            "source": "ap",
            "where": [{"col": "fornecedor_id", "op": "in", "vals": [1, 2]}],
            "tenant_id": 7
        }))
        .unwrap();
        assert_eq!(req.where_rules.len(), 1);
        assert_eq!(req.tenant_id, Some(json!(7)));
    }
}
