//! Streaming aggregation: per-endpoint and per-scenario statistics.
mod accumulator;
mod differ;
mod endpoint;
mod scenario;
mod sort;


pub use accumulator::Accumulator;
pub use differ::{diff_count, diff_value, with_diff};
pub use endpoint::{EndpointKey, EndpointStat, HttpStats};
pub use scenario::{GlobalStat, RequestDetail, ScenarioStat, StepStat, TraceStats};
pub use sort::{Limit, SortKey, SortOptions};
