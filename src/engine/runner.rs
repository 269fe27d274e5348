//! Database seam

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::error::RunnerError;
use crate::shaper::Row;

/// Executes one parameterized statement (`$1..$n` placeholders)
///
/// Implementations may watch `cancel` to abort server-side work; the engine
/// stops waiting as soon as it fires either way.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn run_query(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancellationToken,
    ) -> Result<Vec<Row>, RunnerError>;
}

/// Run `sql` under a deadline, giving up early if `cancel` fires
pub async fn run_with_deadline(
    runner: &dyn QueryRunner,
    sql: &str,
    params: &[Value],
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<Row>, RunnerError> {
    let query_token = cancel.child_token();
    tokio::select! {
        _ = cancel.cancelled() => Err(RunnerError::Cancelled),
        result = tokio::time::timeout(timeout, runner.run_query(sql, params, query_token.clone())) => {
            match result {
                Ok(rows) => rows,
                Err(_) => {
                    query_token.cancel();
                    Err(RunnerError::Timeout(timeout))
                }
            }
        }
    }
}
