//! In-memory aggregation of price events
//!
//! Holds the latest price and running statistics per product name, and
//! forwards every event to the durable store before applying it.

use crate::db::PriceStore;
use crate::models::{PriceEvent, PriceHistoryEntry, StatEntry};
use crate::monitoring::{PipelineStats, PriceUpdater};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Default)]
struct AggregateState {
    /// product name -> most recently applied event
    latest: HashMap<String, PriceEvent>,
    /// product name -> running stats
    stats: HashMap<String, StatEntry>,
}

impl AggregateState {
    fn apply(&mut self, event: PriceEvent) {
        self.stats
            .entry(event.product_name.clone())
            .and_modify(|entry| entry.record(event.price))
            .or_insert_with(|| StatEntry::first(event.price));
        self.latest.insert(event.product_name.clone(), event);
    }
}

pub struct PriceService {
    state: RwLock<AggregateState>,
    store: Arc<dyn PriceStore>,
    pipeline: Arc<PipelineStats>,
}

impl PriceService {
    pub fn new(store: Arc<dyn PriceStore>, pipeline: Arc<PipelineStats>) -> Self {
        Self {
            state: RwLock::new(AggregateState::default()),
            store,
            pipeline,
        }
    }

    /// Persist then apply one event.
    ///
    /// A failed store write is logged and counted; the in-memory update
    /// still happens and the write is not retried.
    pub async fn update_with_price(&self, event: PriceEvent) {
        if let Err(e) = self.store.save_price(&event).await {
            self.pipeline
                .store_write_failures
                .fetch_add(1, Ordering::Relaxed);
            error!(
                "Failed to save price for {}/{}: {:#}",
                event.store_name, event.product_name, e
            );
        }

        self.state.write().apply(event);
        self.pipeline
            .events_aggregated
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of the latest event per product
    pub fn latest_prices(&self) -> HashMap<String, PriceEvent> {
        self.state.read().latest.clone()
    }

    /// Snapshot of the running stats per product
    pub fn stats(&self) -> HashMap<String, StatEntry> {
        self.state.read().stats.clone()
    }

    pub async fn history(&self, product_name: &str) -> Result<Vec<PriceHistoryEntry>> {
        self.store.price_history(product_name).await
    }
}

#[async_trait]
impl PriceUpdater for PriceService {
    async fn update_with_price(&self, event: PriceEvent) {
        PriceService::update_with_price(self, event).await
    }
}
