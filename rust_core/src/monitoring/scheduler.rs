//! Per-source polling scheduler
//!
//! Groups the catalogue by source kind and runs one independent polling loop
//! per kind. Every resolved price becomes a `PriceEvent` on the merge stage.
//! A failed fetch is logged and the loop waits for its next tick.

use super::merge::{merge_stage, MergeSender};
use super::stats::PipelineStats;
use crate::error::FetchError;
use crate::models::{AssignedProduct, PriceEvent, Product};
use crate::providers::{PriceProvider, ProviderKind, ProviderRegistry};
use futures_util::future::join_all;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Catalogue partitioned by source kind
#[derive(Debug, Default)]
pub struct ProviderGroups {
    pub groups: BTreeMap<ProviderKind, Vec<AssignedProduct>>,
    /// Unparseable kind string -> number of products referencing it
    pub unknown: BTreeMap<String, usize>,
}

pub fn group_by_provider(products: &[AssignedProduct]) -> ProviderGroups {
    let mut grouped = ProviderGroups::default();

    for assigned in products {
        match assigned.product.provider.parse::<ProviderKind>() {
            Ok(kind) => grouped
                .groups
                .entry(kind)
                .or_default()
                .push(assigned.clone()),
            Err(e) => *grouped.unknown.entry(e.0).or_insert(0) += 1,
        }
    }

    grouped
}

/// Output side of a running scheduler
pub struct SchedulerHandle {
    /// Merge stage consumer; yields `None` once every loop has exited
    pub updates: mpsc::Receiver<PriceEvent>,
    /// Resolves after every polling loop has stopped
    pub completion: JoinHandle<()>,
    /// Number of polling loops started
    pub loops: usize,
}

pub struct PriceScheduler {
    registry: Arc<ProviderRegistry>,
    channel_capacity: usize,
    stats: Arc<PipelineStats>,
}

impl PriceScheduler {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        channel_capacity: usize,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            registry,
            channel_capacity,
            stats,
        }
    }

    /// Start one polling loop per source kind referenced by `products`.
    ///
    /// Kinds that do not parse, or that have no registered provider, are
    /// logged and never polled.
    pub fn start(&self, products: &[AssignedProduct], cancel: CancellationToken) -> SchedulerHandle {
        let (out, updates) = merge_stage(self.channel_capacity);
        let grouped = group_by_provider(products);

        for (kind, count) in &grouped.unknown {
            warn!("Unknown provider '{}' ({} products). Skipping.", kind, count);
        }

        let mut handles = Vec::new();
        for (kind, assigned) in grouped.groups {
            let Some(registered) = self.registry.get(kind) else {
                warn!(
                    "No provider registered for '{}' ({} products). Skipping.",
                    kind,
                    assigned.len()
                );
                continue;
            };

            let provider_loop = ProviderLoop::new(
                kind,
                registered.provider.clone(),
                registered.poll_interval,
                assigned,
                out.clone(),
                cancel.clone(),
                self.stats.clone(),
            );
            handles.push(tokio::spawn(provider_loop.run()));
        }

        // Loops hold the only remaining senders, so the stage closes exactly
        // when the last of them returns.
        drop(out);

        let loops = handles.len();
        info!("Scheduler started {} polling loops", loops);

        let completion = tokio::spawn(async move {
            for result in join_all(handles).await {
                if let Err(e) = result {
                    error!("Polling loop terminated abnormally: {}", e);
                }
            }
            info!("All polling loops stopped; merge stage closed");
        });

        SchedulerHandle {
            updates,
            completion,
            loops,
        }
    }
}

struct ProviderLoop {
    kind: ProviderKind,
    provider: Arc<dyn PriceProvider>,
    poll_interval: Duration,
    assigned: Vec<AssignedProduct>,
    /// One entry per distinct product name, the batch handed to the provider
    batch: Vec<Product>,
    out: MergeSender,
    cancel: CancellationToken,
    stats: Arc<PipelineStats>,
}

impl ProviderLoop {
    fn new(
        kind: ProviderKind,
        provider: Arc<dyn PriceProvider>,
        poll_interval: Duration,
        assigned: Vec<AssignedProduct>,
        out: MergeSender,
        cancel: CancellationToken,
        stats: Arc<PipelineStats>,
    ) -> Self {
        let mut names = HashSet::new();
        let batch = assigned
            .iter()
            .filter(|a| names.insert(a.product.product_name.clone()))
            .map(|a| a.product.clone())
            .collect();

        Self {
            kind,
            provider,
            // tokio intervals reject a zero period
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            assigned,
            batch,
            out,
            cancel,
            stats,
        }
    }

    async fn run(self) {
        info!(
            "[{}] polling loop started: {} products every {:?}",
            self.kind,
            self.assigned.len(),
            self.poll_interval
        );

        // The first tick completes immediately, giving the startup fetch
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if !self.fetch_and_send().await {
                break;
            }
        }

        info!("[{}] polling loop stopped", self.kind);
    }

    /// One batch fetch, fanned out onto the merge stage.
    /// Returns false once the loop should stop.
    async fn fetch_and_send(&self) -> bool {
        let prices = match self.provider.fetch_prices(&self.batch, &self.cancel).await {
            Ok(prices) => prices,
            Err(FetchError::Cancelled) => return false,
            Err(e) => {
                self.stats.fetches_failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    "Error fetching prices for provider '{}': {}",
                    self.provider.provider_name(),
                    e
                );
                return true;
            }
        };
        self.stats.fetches_ok.fetch_add(1, Ordering::Relaxed);

        for assigned in &self.assigned {
            let name = &assigned.product.product_name;
            let Some(&price) = prices.get(name) else {
                debug!("[{}] no price for {}", self.kind, name);
                continue;
            };

            let event = PriceEvent::new(&assigned.store_name, name, price);
            if let Err(e) = self.out.send(event, &self.cancel).await {
                debug!("[{}] stopping: {}", self.kind, e);
                return false;
            }
            self.stats.events_emitted.fetch_add(1, Ordering::Relaxed);
        }

        true
    }
}
