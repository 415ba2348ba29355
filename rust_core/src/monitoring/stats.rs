//! Pipeline counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PipelineStats {
    pub fetches_ok: AtomicU64,
    pub fetches_failed: AtomicU64,
    pub events_emitted: AtomicU64,
    pub events_aggregated: AtomicU64,
    pub store_write_failures: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> PipelineStatsSnapshot {
        PipelineStatsSnapshot {
            fetches_ok: self.fetches_ok.load(Ordering::Relaxed),
            fetches_failed: self.fetches_failed.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            events_aggregated: self.events_aggregated.load(Ordering::Relaxed),
            store_write_failures: self.store_write_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineStatsSnapshot {
    pub fetches_ok: u64,
    pub fetches_failed: u64,
    pub events_emitted: u64,
    pub events_aggregated: u64,
    pub store_write_failures: u64,
}
