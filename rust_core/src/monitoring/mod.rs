//! Polling, fan-in and aggregation pipeline
//!
//! One polling loop per source kind feeds a single bounded merge stage;
//! a single consumer drains it into the aggregator.

pub mod aggregator;
pub mod merge;
pub mod scheduler;
pub mod stats;

pub use aggregator::{consume_and_aggregate, PriceUpdater};
pub use merge::{merge_stage, MergeSendError, MergeSender, DEFAULT_MERGE_CAPACITY};
pub use scheduler::{PriceScheduler, SchedulerHandle};
pub use stats::{PipelineStats, PipelineStatsSnapshot};
