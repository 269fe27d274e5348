//! Drill hierarchy definitions

use serde::{Deserialize, Serialize};

use crate::resolver::normalize_id;

/// Dimension id → filter field written when a value of that dimension is
/// clicked
const FILTER_FIELDS: &[(&str, &str)] = &[
    ("cliente", "cliente_id"),
    ("fornecedor", "fornecedor_id"),
    ("vendedor", "vendedor_id"),
    ("filial", "filial_id"),
    ("unidade_negocio", "unidade_negocio_id"),
    ("canal_venda", "canal_venda_id"),
    ("categoria_receita", "categoria_receita_id"),
    ("categoria_despesa", "categoria_despesa_id"),
    ("centro_lucro", "centro_lucro_id"),
    ("centro_custo", "centro_custo_id"),
    ("departamento", "departamento_id"),
    ("projeto", "projeto_id"),
    ("territorio", "territorio_id"),
    ("status", "status"),
];

/// Filter field implied by a dimension id, if any
pub fn infer_filter_field(dimension: &str) -> Option<&'static str> {
    let key = normalize_id(dimension);
    FILTER_FIELDS
        .iter()
        .find(|(dim, _)| *dim == key)
        .map(|(_, field)| *field)
}

/// One level as written in a chart definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrillLevelConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    #[serde(default, rename = "dimensionExpr", skip_serializing_if = "Option::is_none")]
    pub dimension_expr: Option<String>,
    #[serde(default, rename = "filterField", skip_serializing_if = "Option::is_none")]
    pub filter_field: Option<String>,
}

/// `drill` block of a chart definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub levels: Vec<DrillLevelConfig>,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            levels: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// A normalized level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrillLevel {
    pub label: String,
    pub dimension: Option<String>,
    pub dimension_expr: Option<String>,
    pub filter_field: Option<String>,
}

impl DrillLevel {
    /// Normalize the level at position `index`; `None` when it names
    /// neither a dimension nor an expression
    pub fn from_config(config: &DrillLevelConfig, index: usize) -> Option<Self> {
        let dimension = trimmed(config.dimension.as_deref());
        let dimension_expr = trimmed(config.dimension_expr.as_deref());
        if dimension.is_none() && dimension_expr.is_none() {
            return None;
        }

        let filter_field = trimmed(config.filter_field.as_deref())
            .or_else(|| dimension.as_deref().and_then(infer_filter_field).map(str::to_string));

        Some(DrillLevel {
            label: trimmed(config.label.as_deref()).unwrap_or_else(|| format!("Nivel {}", index + 1)),
            dimension,
            dimension_expr,
            filter_field,
        })
    }
}

/// Normalize configured levels, dropping unusable ones
///
/// Default labels number levels by their configured position.
pub fn normalize_levels(configs: &[DrillLevelConfig]) -> Vec<DrillLevel> {
    configs
        .iter()
        .enumerate()
        .filter_map(|(i, c)| DrillLevel::from_config(c, i))
        .collect()
}

pub(crate) fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
