//! Driver rows → response rows

use serde::Serialize;
use serde_json::{Map, Value};

use super::number::to_number;

/// A raw row as returned by a [`QueryRunner`](crate::engine::QueryRunner)
pub type Row = Map<String, Value>;

pub const TOTAL_LABEL: &str = "Total";

/// One grouped bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapedRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    pub label: String,
    pub total: f64,
}

/// Result of shaping a statement's rows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Shaped {
    Grouped(Vec<ShapedRow>),
    Total { total: f64 },
}

impl Shaped {
    /// Rows in `{label, total}` form; an aggregate-only result becomes a
    /// single `Total` row
    pub fn into_rows(self) -> Vec<ShapedRow> {
        match self {
            Shaped::Grouped(rows) => rows,
            Shaped::Total { total } => vec![ShapedRow {
                key: None,
                label: TOTAL_LABEL.to_string(),
                total,
            }],
        }
    }
}

pub fn shape(rows: &[Row], had_dimension: bool) -> Shaped {
    if !had_dimension {
        let total = rows
            .first()
            .and_then(|row| row.get("total"))
            .map(to_number)
            .unwrap_or(0.0);
        return Shaped::Total { total };
    }

    Shaped::Grouped(
        rows.iter()
            .enumerate()
            .map(|(i, row)| ShapedRow {
                key: row.get("key").filter(|k| !k.is_null()).cloned(),
                label: label_of(row.get("label"), i),
                total: row.get("total").map(to_number).unwrap_or(0.0),
            })
            .collect(),
    )
}

fn label_of(value: Option<&Value>, index: usize) -> String {
    match value {
        None | Some(Value::Null) => format!("Item {}", index + 1),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
