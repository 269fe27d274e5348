//! Response envelopes
//!
//! Every endpoint answers with `success: true` plus a payload, or with the
//! `{success: false, message}` error envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the module query endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleRow {
    Grouped {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<Value>,
        label: String,
        value: f64,
    },
    Total {
        total: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleQueryResponse {
    pub success: bool,
    pub rows: Vec<ModuleRow>,
    pub sql_query: String,
    pub sql_params: Vec<Value>,
}

/// One row of the analytics endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRow {
    pub label: String,
    pub total: f64,
}

/// Echo of what the analytics endpoint actually ran
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsMeta {
    pub sql: String,
    pub params: Vec<Value>,
    pub measure: String,
    pub dimension: Option<String>,
    #[serde(rename = "dateColumn")]
    pub date_column: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: u32,
    pub order: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub success: bool,
    pub source: String,
    pub rows: Vec<AnalyticsRow>,
    pub meta: AnalyticsMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorResponse {
            success: false,
            message: message.into(),
        }
    }
}

/// Status code plus JSON body, as handed to whatever HTTP layer hosts the engine
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointResponse {
    pub status: u16,
    pub body: Value,
}

impl EndpointResponse {
    pub fn ok<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(body) => EndpointResponse { status: 200, body },
            Err(e) => Self::error(400, e.to_string()),
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let body = serde_json::json!({ "success": false, "message": message.into() });
        EndpointResponse { status, body }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_module_rows_serialize() {
        let grouped = ModuleRow::Grouped {
            key: Some(json!(42)),
            label: "Acme".into(),
            value: 10.5,
        };
        assert_eq!(
            serde_json::to_value(&grouped).unwrap(),
            json!({"key": 42, "label": "Acme", "value": 10.5})
        );

        let unkeyed = ModuleRow::Grouped {
            key: None,
            label: "aberto".into(),
            value: 1.0,
        };
        assert_eq!(
            serde_json::to_value(&unkeyed).unwrap(),
            json!({"label": "aberto", "value": 1.0})
        );

        let total = ModuleRow::Total { total: 0.0 };
        assert_eq!(serde_json::to_value(&total).unwrap(), json!({"total": 0.0}));
    }

    #[test]
    fn test_error_envelope() {
        let resp = EndpointResponse::error(400, "Unknown table 'x'");
        assert!(!resp.is_success());
        assert_eq!(resp.body, json!({"success": false, "message": "Unknown table 'x'"}));
    }
}
