//! Query request and response types (noun module)

mod request;
mod response;

pub use request::{
    AnalyticsRequest, DataQuery, ModuleQueryBody, OrderBySpec, OrderKey, Ordering, SortDirection,
    WhereRule,
};
pub use response::{
    AnalyticsMeta, AnalyticsResponse, AnalyticsRow, EndpointResponse, ErrorResponse, ModuleQueryResponse,
    ModuleRow,
};
