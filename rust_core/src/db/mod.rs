//! Durable price storage.
//!
//! The pipeline only needs two operations from storage: append one price
//! event, and read back the newest history for a product. `save_price` must
//! be safe to call while `price_history` reads are in flight.

use crate::models::{PriceEvent, PriceHistoryEntry};
use anyhow::Result;
use async_trait::async_trait;

pub mod memory;
pub mod pool;
pub mod postgres;

pub use memory::MemoryPriceStore;
pub use pool::{create_pool, DbPoolConfig};
pub use postgres::PgPriceStore;

/// Maximum rows returned by a history query
pub const HISTORY_LIMIT: usize = 100;

#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Append one event. The store assigns the record timestamp.
    async fn save_price(&self, event: &PriceEvent) -> Result<()>;

    /// Newest-first history for `product_name`, at most `HISTORY_LIMIT` rows.
    /// An unknown product yields an empty list.
    async fn price_history(&self, product_name: &str) -> Result<Vec<PriceHistoryEntry>>;
}
