//! Click-to-filter bridge
//!
//! Turns a chart click into a shared filter entry that every other chart on
//! the dashboard picks up.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::controller::{is_blank, ClickedItem};
use super::level::{infer_filter_field, trimmed};
use super::state::FilterState;

const STORE_PREFIX: &str = "filters.";

/// `interaction` block of a chart definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossFilterConfig {
    #[serde(default = "default_true")]
    pub click_as_filter: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_field: Option<String>,
    /// Key in the shared state; `filters.` prefix accepted
    #[serde(default, alias = "storePath", skip_serializing_if = "Option::is_none")]
    pub store_key: Option<String>,
    #[serde(default = "default_true")]
    pub clear_on_second_click: bool,
    #[serde(default)]
    pub also_with_drill: bool,
}

impl Default for CrossFilterConfig {
    fn default() -> Self {
        Self {
            click_as_filter: true,
            filter_field: None,
            store_key: None,
            clear_on_second_click: true,
            also_with_drill: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// What a click did to the shared state
#[derive(Debug, Clone, PartialEq)]
pub enum CrossFilterOutcome {
    Set { key: String, value: Value },
    Cleared { key: String },
    Ignored,
}

impl CrossFilterOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, CrossFilterOutcome::Ignored)
    }
}

#[derive(Debug, Clone)]
pub struct CrossFilterBridge {
    config: CrossFilterConfig,
    store_key: Option<String>,
}

impl CrossFilterBridge {
    /// `chart_dimension` is the chart's own dimension, used to infer the
    /// field when none is configured
    pub fn new(config: CrossFilterConfig, chart_dimension: Option<&str>) -> Self {
        let field = trimmed(config.filter_field.as_deref())
            .or_else(|| chart_dimension.and_then(infer_filter_field).map(str::to_string));
        let store_key = trimmed(config.store_key.as_deref())
            .map(|k| k.strip_prefix(STORE_PREFIX).map(str::to_string).unwrap_or(k))
            .or(field)
            .filter(|k| !k.is_empty());
        Self { config, store_key }
    }

    pub fn store_key(&self) -> Option<&str> {
        self.store_key.as_deref()
    }

    /// Whether clicks write filters, given whether drill is active
    pub fn is_active(&self, drill_enabled: bool) -> bool {
        self.config.click_as_filter
            && self.store_key.is_some()
            && (!drill_enabled || self.config.also_with_drill)
    }

    /// Apply a click to `state`
    pub fn apply(&self, state: &mut FilterState, item: &ClickedItem, drill_enabled: bool) -> CrossFilterOutcome {
        let Some(key) = self.store_key.as_deref().filter(|_| self.is_active(drill_enabled)) else {
            return CrossFilterOutcome::Ignored;
        };
        let Some(raw) = item.raw_value().filter(|v| !is_blank(v)) else {
            return CrossFilterOutcome::Ignored;
        };
        let next = match raw {
            v @ (Value::Number(_) | Value::String(_)) => v,
            other => Value::String(js_string(&other)),
        };

        let current = state.get(key).map(js_string).unwrap_or_default();
        if self.config.clear_on_second_click && current == js_string(&next) {
            state.clear(key);
            debug!(key, "Cross-filter cleared");
            return CrossFilterOutcome::Cleared { key: key.to_string() };
        }

        debug!(key, value = %next, "Cross-filter set");
        state.set(key, next.clone());
        CrossFilterOutcome::Set {
            key: key.to_string(),
            value: next,
        }
    }
}

/// String form used to compare a stored value with a clicked one, so `7`
/// and `"7"` match
fn js_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
