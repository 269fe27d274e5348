//! Metric definitions

use serde::{Deserialize, Serialize};

use super::types::MetricFormat;

/// A measurable quantity exposed by a table
///
/// `expressions` holds equivalent SQL aggregate spellings. The first one is
/// canonical and is the only one ever emitted; the rest exist so that legacy
/// payloads carrying an older spelling resolve to the same metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub format: MetricFormat,
    #[serde(default)]
    pub expressions: Vec<String>,
}

impl MetricDefinition {
    /// The expression emitted for this metric
    pub fn canonical_expr(&self) -> Option<&str> {
        self.expressions.first().map(|s| s.as_str())
    }

    /// Every accepted spelling after the canonical one
    pub fn legacy_exprs(&self) -> &[String] {
        self.expressions.get(1..).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_is_first_expression() {
        let metric: MetricDefinition = serde_yaml::from_str(
            r#"
id: valor_total
label: Valor Total
format: currency
expressions: ["SUM(cp.valor_liquido)", "SUM(valor_liquido)", "SUM(valor)"]
"#,
        )
        .unwrap();

        assert_eq!(metric.canonical_expr(), Some("SUM(cp.valor_liquido)"));
        assert_eq!(metric.legacy_exprs().len(), 2);
        assert_eq!(metric.format, MetricFormat::Currency);
    }

    #[test]
    fn test_metric_without_expressions() {
        let metric: MetricDefinition = serde_yaml::from_str("id: x\nlabel: X\n").unwrap();
        assert!(metric.canonical_expr().is_none());
        assert!(metric.legacy_exprs().is_empty());
    }
}
