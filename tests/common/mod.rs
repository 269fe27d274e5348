//! Shared test utilities for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use bizquery::catalog::{self, Catalog};
use bizquery::engine::{Engine, QueryRunner, RunnerError};
use bizquery::parser;
use bizquery::shaper::Row;
use bizquery::EngineConfig;

/// Load a catalog fixture from the tests/test_data directory
pub fn load_fixture(name: &str) -> Arc<Catalog> {
    let path = format!("tests/test_data/{}", name);
    let catalog = parser::parse_file(&path)
        .unwrap_or_else(|e| panic!("Failed to load test data {}: {}", name, e));
    Arc::new(catalog)
}

/// Build a driver row from a JSON object literal
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("row fixture must be an object, got {}", other),
    }
}

pub fn empty_row() -> Row {
    Map::new()
}

// =============================================================================
// Recording runner
// =============================================================================

/// One statement the engine sent to the database
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub sql: String,
    pub params: Vec<Value>,
}

/// In-memory `QueryRunner` returning canned rows and recording every call
#[derive(Default)]
pub struct RecordingRunner {
    rows: Vec<Row>,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingRunner {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    /// Wait `delay` (or until cancelled) before answering
    pub fn delayed(rows: Vec<Row>, delay: Duration) -> Self {
        Self {
            rows,
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls().pop().expect("runner was never called")
    }
}

#[async_trait]
impl QueryRunner for RecordingRunner {
    async fn run_query(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancellationToken,
    ) -> Result<Vec<Row>, RunnerError> {
        self.calls.lock().unwrap().push(RecordedCall {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(RunnerError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        Ok(self.rows.clone())
    }
}

/// Runner that always fails like a broken connection
pub struct FailingRunner;

#[async_trait]
impl QueryRunner for FailingRunner {
    async fn run_query(
        &self,
        _sql: &str,
        _params: &[Value],
        _cancel: CancellationToken,
    ) -> Result<Vec<Row>, RunnerError> {
        Err(RunnerError::Database("connection refused".to_string()))
    }
}

// =============================================================================
// Engine helpers
// =============================================================================

/// Engine over the builtin catalog backed by `runner`
pub fn engine_with(runner: Arc<RecordingRunner>) -> Engine {
    engine_with_config(runner, EngineConfig::default())
}

pub fn engine_with_config(runner: Arc<RecordingRunner>, config: EngineConfig) -> Engine {
    let catalog = catalog::builtin().expect("builtin catalog should load");
    Engine::new(catalog, runner, config)
}

// =============================================================================
// SQL inspection
// =============================================================================

/// Text between `WHERE` and the next clause, or empty
pub fn where_clause(sql: &str) -> &str {
    let Some(start) = sql.find(" WHERE ") else {
        return "";
    };
    let rest = &sql[start + " WHERE ".len()..];
    let end = [" GROUP BY ", " ORDER BY ", " LIMIT "]
        .iter()
        .filter_map(|kw| rest.find(kw))
        .min()
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Value of the trailing `LIMIT n`, if any
pub fn limit_of(sql: &str) -> Option<u32> {
    sql.rsplit_once(" LIMIT ").and_then(|(_, n)| n.trim().parse().ok())
}

/// Highest `$n` placeholder used in `sql`
pub fn max_placeholder(sql: &str) -> usize {
    sql.split('$')
        .skip(1)
        .filter_map(|s| {
            let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        })
        .max()
        .unwrap_or(0)
}
