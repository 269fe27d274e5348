//! Dashboard-wide filter state shared by charts

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The shared date window (`filters.dateRange`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

/// Global filters every chart merges into its own query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default, rename = "dateRange", skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateWindow>,
    #[serde(flatten)]
    pub filters: BTreeMap<String, Value>,
}

impl FilterState {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.filters.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.filters.insert(key.into(), value);
    }

    pub fn clear(&mut self, key: &str) -> Option<Value> {
        self.filters.remove(key)
    }

    pub fn set_date_range(&mut self, from: Option<String>, to: Option<String>) {
        self.date_range = Some(DateWindow { from, to });
    }
}

/// Handle to filter state shared between chart sessions
#[derive(Debug, Clone, Default)]
pub struct FilterStore {
    inner: Arc<RwLock<FilterState>>,
}

impl FilterStore {
    pub fn new(state: FilterState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn snapshot(&self) -> FilterState {
        self.inner.read().await.clone()
    }

    /// Mutate the state and return whatever `f` returns
    pub async fn update<R>(&self, f: impl FnOnce(&mut FilterState) -> R) -> R {
        let mut guard = self.inner.write().await;
        f(&mut guard)
    }
}
