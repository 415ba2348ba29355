//! In-process price history, used when no database is configured and in tests

use super::{PriceStore, HISTORY_LIMIT};
use crate::models::{PriceEvent, PriceHistoryEntry};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct MemoryPriceStore {
    records: RwLock<Vec<PriceHistoryEntry>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `save_price` calls fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `price_history` calls fail
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl PriceStore for MemoryPriceStore {
    async fn save_price(&self, event: &PriceEvent) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("memory store rejected write"));
        }

        self.records.write().push(PriceHistoryEntry {
            store_name: event.store_name.clone(),
            product_name: event.product_name.clone(),
            price: event.price,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn price_history(&self, product_name: &str) -> Result<Vec<PriceHistoryEntry>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("memory store rejected read"));
        }

        // Append order is write order, so walking backwards is newest first
        Ok(self
            .records
            .read()
            .iter()
            .rev()
            .filter(|r| r.product_name == product_name)
            .take(HISTORY_LIMIT)
            .cloned()
            .collect())
    }
}
