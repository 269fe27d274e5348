//! Drill-down and cross-filtering (verb module)
//!
//! Chart clicks → drill path / shared filters → the next module query.

mod controller;
mod cross;
mod error;
mod level;
mod session;
mod state;

pub use controller::{ClickedItem, DrillController, DrillPathStep};
pub use cross::{CrossFilterBridge, CrossFilterConfig, CrossFilterOutcome};
pub use error::{SessionError, TransportError};
pub use level::{infer_filter_field, normalize_levels, DrillConfig, DrillLevel, DrillLevelConfig};
pub use session::{ChartConfig, ChartSession, ChartSnapshot, ClickOutcome, QueryTransport};
pub use state::{DateWindow, FilterState, FilterStore};
