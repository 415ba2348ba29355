//! Consumer side of the merge stage

use crate::models::PriceEvent;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Sink for every event drained from the merge stage
#[async_trait]
pub trait PriceUpdater: Send + Sync {
    async fn update_with_price(&self, event: PriceEvent);
}

/// Drain `updates` into `updater`, one event at a time, until every producer
/// has dropped its sender. Returns the number of events applied.
///
/// Producers stop on cancellation, so on shutdown this returns once the
/// events already queued have been applied.
pub async fn consume_and_aggregate<U>(mut updates: mpsc::Receiver<PriceEvent>, updater: Arc<U>) -> u64
where
    U: PriceUpdater + ?Sized,
{
    let mut applied = 0u64;

    while let Some(event) = updates.recv().await {
        debug!(
            "Received price update: {}/{} = {}",
            event.store_name, event.product_name, event.price
        );
        updater.update_with_price(event).await;
        applied += 1;
    }

    info!("Merge stage drained after {} events", applied);
    applied
}
