//! Dimension definitions
//!
//! Attribute dimensions carry a single label expression and, optionally, a
//! distinct key expression. Time dimensions carry the date column they bucket
//! plus optional per-grain overrides; any grain not overridden is derived from
//! the column through [`TimeGrain::expr`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{DimensionKind, TimeGrain};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionDefinition {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub kind: DimensionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Alternative ids accepted on input (e.g. `centros_custo`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Label expression (attribute dimensions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    /// Group key expression, when distinct from the label
    #[serde(default, rename = "keyExpr", skip_serializing_if = "Option::is_none")]
    pub key_expr: Option<String>,
    /// Bucketed date column (time dimensions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, rename = "exprByGrain", skip_serializing_if = "BTreeMap::is_empty")]
    pub expr_by_grain: BTreeMap<TimeGrain, String>,
}

impl DimensionDefinition {
    pub fn is_time(&self) -> bool {
        self.kind == DimensionKind::Time
    }

    /// Expression for a time grain: explicit override first, then the column template
    pub fn expr_for_grain(&self, grain: TimeGrain) -> Option<String> {
        if let Some(expr) = self.expr_by_grain.get(&grain) {
            return Some(expr.clone());
        }
        self.column.as_deref().map(|c| grain.expr(c))
    }

    /// Label expression at the given grain (grain is ignored for attributes)
    pub fn label_expr(&self, grain: TimeGrain) -> Option<String> {
        match self.kind {
            DimensionKind::Attribute => self.expr.clone(),
            DimensionKind::Time => self.expr_for_grain(grain),
        }
    }

    /// Key expression, only when it differs from the label
    pub fn distinct_key_expr(&self) -> Option<&str> {
        match (&self.key_expr, &self.expr) {
            (Some(key), Some(label)) if key == label => None,
            (Some(key), _) => Some(key.as_str()),
            (None, _) => None,
        }
    }

    /// Grains with no way of producing an expression
    pub fn missing_grains(&self) -> Vec<TimeGrain> {
        TimeGrain::ALL
            .iter()
            .copied()
            .filter(|g| self.expr_for_grain(*g).is_none())
            .collect()
    }

    /// Every SQL expression this dimension can emit
    pub fn declared_exprs(&self) -> Vec<String> {
        let mut out = Vec::new();
        out.extend(self.expr.iter().cloned());
        out.extend(self.key_expr.iter().cloned());
        if self.is_time() {
            out.extend(TimeGrain::ALL.iter().filter_map(|g| self.expr_for_grain(*g)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periodo() -> DimensionDefinition {
        serde_yaml::from_str(
            r#"
id: periodo
label: Periodo
kind: time
column: cp.data_vencimento
exprByGrain:
  year: "EXTRACT(YEAR FROM cp.data_vencimento)::text"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_time_dimension_derives_missing_grains() {
        let dim = periodo();
        assert!(dim.is_time());
        assert!(dim.missing_grains().is_empty());
        assert_eq!(
            dim.label_expr(TimeGrain::Month).unwrap(),
            "TO_CHAR(DATE_TRUNC('month', cp.data_vencimento), 'YYYY-MM')"
        );
        assert_eq!(
            dim.label_expr(TimeGrain::Year).unwrap(),
            "EXTRACT(YEAR FROM cp.data_vencimento)::text"
        );
    }

    #[test]
    fn test_time_dimension_without_column_misses_grains() {
        let dim: DimensionDefinition = serde_yaml::from_str(
            r#"
id: periodo
label: Periodo
kind: time
exprByGrain:
  month: "TO_CHAR(DATE_TRUNC('month', x.dt), 'YYYY-MM')"
"#,
        )
        .unwrap();
        let missing = dim.missing_grains();
        assert_eq!(missing.len(), 4);
        assert!(!missing.contains(&TimeGrain::Month));
    }

    #[test]
    fn test_distinct_key_expr() {
        let dim: DimensionDefinition = serde_yaml::from_str(
            "id: cliente\nlabel: Cliente\nexpr: \"COALESCE(cli.nome_fantasia,'Sem cliente')\"\nkeyExpr: cli.id\n",
        )
        .unwrap();
        assert_eq!(dim.kind, DimensionKind::Attribute);
        assert_eq!(dim.distinct_key_expr(), Some("cli.id"));

        let same: DimensionDefinition =
            serde_yaml::from_str("id: status\nlabel: Status\nexpr: o.status\nkeyExpr: o.status\n").unwrap();
        assert_eq!(same.distinct_key_expr(), None);
    }
}
