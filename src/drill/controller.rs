//! Drill-down state machine
//!
//! ```text
//!   level 0 ──click──▶ level 1 ──click──▶ ... ──click──▶ level n-1
//!      ◀──── up ─────     ◀──── up ─────
//!   reset / reconfigure: back to level 0 with an empty path
//! ```
//!
//! Every transition bumps `generation`, which the session uses to discard
//! responses for superseded states.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::level::{normalize_levels, trimmed, DrillConfig, DrillLevel};
use super::state::FilterState;
use crate::query::DataQuery;

const DATE_FROM_FIELD: &str = "de";
const DATE_TO_FIELD: &str = "ate";

/// The data point a user clicked
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickedItem {
    #[serde(default, rename = "drillKey", skip_serializing_if = "Option::is_none")]
    pub drill_key: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ClickedItem {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn keyed(key: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn label_text(&self) -> String {
        self.label.clone().unwrap_or_default()
    }

    /// First present identifier: `drillKey`, `key`, `id`, then `label`
    pub fn raw_value(&self) -> Option<Value> {
        [&self.drill_key, &self.key, &self.id]
            .into_iter()
            .flatten()
            .find(|v| !v.is_null())
            .cloned()
            .or_else(|| self.label.clone().map(Value::String))
    }

    /// Identifier used as a drill filter value: a number or a non-empty
    /// string; other shapes fall back to the label
    pub fn drill_value(&self) -> Option<Value> {
        let value = match self.raw_value() {
            Some(v @ (Value::Number(_) | Value::String(_))) => v,
            _ => Value::String(self.label_text()),
        };
        (!is_blank(&value)).then_some(value)
    }
}

pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// A committed drill selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillPathStep {
    pub level: usize,
    pub label: String,
    pub value: Value,
    #[serde(rename = "filterField")]
    pub filter_field: String,
}

#[derive(Debug, Clone)]
pub struct DrillController {
    enabled: bool,
    levels: Vec<DrillLevel>,
    level_index: usize,
    path: Vec<DrillPathStep>,
    generation: u64,
    /// Filter fields the chart's table declares; `None` when unknown
    declared_fields: Option<BTreeSet<String>>,
}

impl DrillController {
    pub fn new(config: &DrillConfig) -> Self {
        Self {
            enabled: config.enabled,
            levels: normalize_levels(&config.levels),
            level_index: 0,
            path: Vec::new(),
            generation: 0,
            declared_fields: None,
        }
    }

    /// Limit externally sourced filters (drill path, shared filters, shared
    /// date range) to the fields the chart's table declares
    pub fn restrict_filter_fields<I>(&mut self, fields: Option<I>)
    where
        I: IntoIterator<Item = String>,
    {
        self.declared_fields = fields.map(|f| f.into_iter().map(|name| name.trim().to_lowercase()).collect());
    }

    fn accepts(&self, field: &str) -> bool {
        match &self.declared_fields {
            Some(declared) => declared.contains(&field.trim().to_lowercase()),
            None => true,
        }
    }

    /// Drill is active only when enabled and at least one level is usable
    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.levels.is_empty()
    }

    pub fn levels(&self) -> &[DrillLevel] {
        &self.levels
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn path(&self) -> &[DrillPathStep] {
        &self.path
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn can_drill_down(&self) -> bool {
        self.is_enabled() && self.level_index + 1 < self.levels.len()
    }

    pub fn can_drill_up(&self) -> bool {
        self.is_enabled() && self.level_index > 0
    }

    pub fn active_level(&self) -> Option<&DrillLevel> {
        if !self.is_enabled() {
            return None;
        }
        self.levels.get(self.level_index.min(self.levels.len() - 1))
    }

    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Record a change made outside the drill state (shared filters,
    /// cross-filter clicks) as a transition
    pub fn touch(&mut self) -> u64 {
        self.bump()
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Narrow to the clicked value and advance one level
    ///
    /// Returns `false` (and changes nothing) at the last level. A level
    /// without a filter field, or a click without a usable key, still
    /// advances but records no step.
    pub fn drill_down(&mut self, item: &ClickedItem) -> bool {
        if !self.can_drill_down() {
            return false;
        }
        let idx = self.level_index;
        self.path.truncate(idx);

        let filter_field = self.levels[idx].filter_field.clone();
        match (filter_field, item.drill_value()) {
            (Some(filter_field), Some(value)) => self.path.push(DrillPathStep {
                level: idx,
                label: item.label_text(),
                value,
                filter_field,
            }),
            (field, value) => debug!(
                level = idx,
                has_field = field.is_some(),
                has_value = value.is_some(),
                "Drill step recorded without a filter"
            ),
        }

        self.level_index = (idx + 1).min(self.levels.len() - 1);
        self.bump();
        true
    }

    pub fn drill_up(&mut self) -> bool {
        if !self.can_drill_up() {
            return false;
        }
        self.level_index -= 1;
        self.path.truncate(self.level_index);
        self.bump();
        true
    }

    pub fn reset(&mut self) {
        self.level_index = 0;
        self.path.clear();
        self.bump();
    }

    /// Replace the level list; always returns to the first level
    pub fn reconfigure(&mut self, config: &DrillConfig) {
        self.enabled = config.enabled;
        self.levels = normalize_levels(&config.levels);
        self.reset();
    }

    // ------------------------------------------------------------------------
    // Request building
    // ------------------------------------------------------------------------

    /// `"Fornecedor: Acme > Filial: Matriz > Mes"`
    pub fn breadcrumb(&self) -> String {
        if !self.is_enabled() {
            return String::new();
        }
        (0..=self.level_index)
            .map_while(|i| self.levels.get(i).map(|level| (i, level)))
            .map(|(i, level)| match self.path.iter().find(|s| s.level == i) {
                Some(step) if !step.label.is_empty() => format!("{}: {}", level.label, step.label),
                _ => level.label.clone(),
            })
            .collect::<Vec<_>>()
            .join(" > ")
    }

    /// Filters for the next request: chart filters, then the shared date
    /// range, then shared filters not already set, then the drill path
    ///
    /// Outside of the chart's own filters, fields the table does not declare
    /// are skipped once [`restrict_filter_fields`](Self::restrict_filter_fields)
    /// has been given the table's fields.
    pub fn request_filters(&self, base: &BTreeMap<String, Value>, state: &FilterState) -> BTreeMap<String, Value> {
        let mut filters = base.clone();

        if let Some(range) = &state.date_range {
            if !filters.contains_key(DATE_FROM_FIELD) && !filters.contains_key(DATE_TO_FIELD) {
                if let Some(from) = trimmed(range.from.as_deref()).filter(|_| self.accepts(DATE_FROM_FIELD)) {
                    filters.insert(DATE_FROM_FIELD.to_string(), Value::String(from));
                }
                if let Some(to) = trimmed(range.to.as_deref()).filter(|_| self.accepts(DATE_TO_FIELD)) {
                    filters.insert(DATE_TO_FIELD.to_string(), Value::String(to));
                }
            }
        }

        for (key, value) in state.filters.iter().filter(|(key, _)| self.accepts(key)) {
            filters.entry(key.clone()).or_insert_with(|| value.clone());
        }

        if self.is_enabled() {
            for step in self.path.iter().take(self.level_index) {
                if !self.accepts(&step.filter_field) {
                    debug!(level = step.level, field = %step.filter_field, "Skipping undeclared drill filter");
                    continue;
                }
                filters.insert(step.filter_field.clone(), step.value.clone());
            }
        }
        filters
    }

    /// The chart query with the active level's dimension and the merged
    /// filters applied
    pub fn build_query(&self, chart: &DataQuery, state: &FilterState) -> DataQuery {
        let level = self.active_level();
        let dimension = level
            .and_then(|l| l.dimension.clone())
            .or_else(|| chart.dimension.clone());
        let dimension_expr = level
            .and_then(|l| l.dimension_expr.clone())
            .or_else(|| chart.dimension_expr.clone());

        DataQuery {
            dimension,
            dimension_expr,
            filters: self.request_filters(&chart.filters, state),
            ..chart.clone()
        }
    }
}
