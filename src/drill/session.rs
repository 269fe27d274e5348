//! A chart bound to a transport
//!
//! Each transition (click, drill-up, reset, shared-filter change) cancels
//! the request in flight, issues exactly one new request, and only keeps
//! the response if no newer transition happened meanwhile.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::controller::{ClickedItem, DrillController, DrillPathStep};
use super::cross::{CrossFilterBridge, CrossFilterConfig, CrossFilterOutcome};
use super::error::{SessionError, TransportError};
use super::level::DrillConfig;
use super::state::FilterStore;
use crate::engine::{Engine, EngineError, RunnerError};
use crate::query::{DataQuery, ModuleQueryBody, ModuleQueryResponse, ModuleRow};

/// Sends a module query somewhere and waits for the answer
#[async_trait]
pub trait QueryTransport: Send + Sync {
    async fn fetch(
        &self,
        module: &str,
        body: &ModuleQueryBody,
        cancel: CancellationToken,
    ) -> Result<ModuleQueryResponse, TransportError>;

    /// Filter fields declared on the table behind `module`/`model`, when the
    /// transport can tell
    fn filter_fields(&self, _module: &str, _model: &str) -> Option<Vec<String>> {
        None
    }
}

/// In-process transport
#[async_trait]
impl QueryTransport for Engine {
    async fn fetch(
        &self,
        module: &str,
        body: &ModuleQueryBody,
        cancel: CancellationToken,
    ) -> Result<ModuleQueryResponse, TransportError> {
        let body = serde_json::to_value(body).map_err(|e| TransportError::Io(e.to_string()))?;
        match self.module_query(module, body, &cancel).await {
            Ok(response) => Ok(response),
            Err(EngineError::Runner(RunnerError::Cancelled)) => Err(TransportError::Cancelled),
            Err(e) => Err(TransportError::Rejected(e.to_string())),
        }
    }

    fn filter_fields(&self, module: &str, model: &str) -> Option<Vec<String>> {
        let entry = self.compiler().module_entry(module, model).ok()?;
        Some(entry.filters.iter().map(|f| f.field.clone()).collect())
    }
}

/// A chart definition: its query plus drill and click behaviour
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(rename = "dataQuery")]
    pub data_query: DataQuery,
    #[serde(default)]
    pub drill: DrillConfig,
    #[serde(default)]
    pub interaction: CrossFilterConfig,
}

/// What the chart currently shows
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSnapshot {
    pub generation: u64,
    pub level_index: usize,
    pub breadcrumb: String,
    pub rows: Vec<ModuleRow>,
    pub sql_query: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClickOutcome {
    pub cross_filter: CrossFilterOutcome,
    pub drilled: bool,
    /// `None` when nothing changed or the response was superseded
    pub snapshot: Option<ChartSnapshot>,
}

struct SessionState {
    chart: ChartConfig,
    controller: DrillController,
    bridge: CrossFilterBridge,
    in_flight: Option<CancellationToken>,
    latest: Option<ChartSnapshot>,
}

/// A pending request, detached from the session lock
struct Pending {
    generation: u64,
    module: String,
    body: ModuleQueryBody,
    cancel: CancellationToken,
}

pub struct ChartSession {
    state: Mutex<SessionState>,
    filters: FilterStore,
    transport: Arc<dyn QueryTransport>,
}

impl ChartSession {
    pub fn new(
        chart: ChartConfig,
        filters: FilterStore,
        transport: Arc<dyn QueryTransport>,
    ) -> Result<Self, SessionError> {
        if chart.data_query.model.trim().is_empty() {
            return Err(SessionError::MissingModel);
        }
        let mut controller = DrillController::new(&chart.drill);
        controller.restrict_filter_fields(declared_fields(transport.as_ref(), &chart.data_query));
        let bridge = CrossFilterBridge::new(chart.interaction.clone(), chart.data_query.dimension.as_deref());
        Ok(Self {
            state: Mutex::new(SessionState {
                chart,
                controller,
                bridge,
                in_flight: None,
                latest: None,
            }),
            filters,
            transport,
        })
    }

    pub fn filters(&self) -> &FilterStore {
        &self.filters
    }

    pub async fn latest(&self) -> Option<ChartSnapshot> {
        self.state.lock().await.latest.clone()
    }

    pub async fn level_index(&self) -> usize {
        self.state.lock().await.controller.level_index()
    }

    pub async fn path(&self) -> Vec<DrillPathStep> {
        self.state.lock().await.controller.path().to_vec()
    }

    pub async fn breadcrumb(&self) -> String {
        self.state.lock().await.controller.breadcrumb()
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Load (or reload after a shared-filter change)
    pub async fn refresh(&self) -> Result<Option<ChartSnapshot>, SessionError> {
        let pending = {
            let mut st = self.state.lock().await;
            st.controller.touch();
            self.begin(&mut st).await
        };
        self.finish(pending).await
    }

    /// Cross-filter first, then drill; one request for both
    pub async fn click(&self, item: &ClickedItem) -> Result<ClickOutcome, SessionError> {
        let (cross_filter, drilled, pending) = {
            let mut st = self.state.lock().await;
            let drill_enabled = st.controller.is_enabled();
            let bridge = st.bridge.clone();
            let cross_filter = self
                .filters
                .update(|fs| bridge.apply(fs, item, drill_enabled))
                .await;
            let drilled = st.controller.drill_down(item);

            if !cross_filter.changed() && !drilled {
                debug!("Click changed nothing");
                return Ok(ClickOutcome {
                    cross_filter,
                    drilled,
                    snapshot: None,
                });
            }
            if !drilled {
                st.controller.touch();
            }
            let pending = self.begin(&mut st).await;
            (cross_filter, drilled, pending)
        };

        let snapshot = self.finish(pending).await?;
        Ok(ClickOutcome {
            cross_filter,
            drilled,
            snapshot,
        })
    }

    pub async fn drill_up(&self) -> Result<Option<ChartSnapshot>, SessionError> {
        let pending = {
            let mut st = self.state.lock().await;
            if !st.controller.drill_up() {
                return Ok(None);
            }
            self.begin(&mut st).await
        };
        self.finish(pending).await
    }

    pub async fn reset(&self) -> Result<Option<ChartSnapshot>, SessionError> {
        let pending = {
            let mut st = self.state.lock().await;
            st.controller.reset();
            self.begin(&mut st).await
        };
        self.finish(pending).await
    }

    /// Swap in a new chart definition; drill state starts over
    pub async fn reconfigure(&self, chart: ChartConfig) -> Result<Option<ChartSnapshot>, SessionError> {
        if chart.data_query.model.trim().is_empty() {
            return Err(SessionError::MissingModel);
        }
        let pending = {
            let mut st = self.state.lock().await;
            st.controller.reconfigure(&chart.drill);
            st.controller
                .restrict_filter_fields(declared_fields(self.transport.as_ref(), &chart.data_query));
            st.bridge = CrossFilterBridge::new(chart.interaction.clone(), chart.data_query.dimension.as_deref());
            st.chart = chart;
            self.begin(&mut st).await
        };
        self.finish(pending).await
    }

    // ------------------------------------------------------------------------
    // Request lifecycle
    // ------------------------------------------------------------------------

    async fn begin(&self, st: &mut SessionState) -> Pending {
        if let Some(previous) = st.in_flight.take() {
            previous.cancel();
        }
        let cancel = CancellationToken::new();
        st.in_flight = Some(cancel.clone());

        let shared = self.filters.snapshot().await;
        let data_query = st.controller.build_query(&st.chart.data_query, &shared);
        Pending {
            generation: st.controller.generation(),
            module: data_query.module_prefix().to_string(),
            body: ModuleQueryBody { data_query },
            cancel,
        }
    }

    async fn finish(&self, pending: Pending) -> Result<Option<ChartSnapshot>, SessionError> {
        let result = self
            .transport
            .fetch(&pending.module, &pending.body, pending.cancel.clone())
            .await;

        let mut st = self.state.lock().await;
        if st.controller.generation() != pending.generation {
            debug!(
                generation = pending.generation,
                current = st.controller.generation(),
                "Discarding superseded response"
            );
            return Ok(None);
        }
        st.in_flight = None;

        match result {
            Ok(response) => {
                let snapshot = ChartSnapshot {
                    generation: pending.generation,
                    level_index: st.controller.level_index(),
                    breadcrumb: st.controller.breadcrumb(),
                    rows: response.rows,
                    sql_query: response.sql_query,
                };
                st.latest = Some(snapshot.clone());
                Ok(Some(snapshot))
            }
            Err(TransportError::Cancelled) => Ok(None),
            Err(e) => {
                warn!(error = %e, "Chart query failed");
                st.latest = None;
                Err(e.into())
            }
        }
    }
}

fn declared_fields(transport: &dyn QueryTransport, query: &DataQuery) -> Option<Vec<String>> {
    transport.filter_fields(query.module_prefix(), &query.model)
}
