// Shared models for the price monitor
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Catalogue
// ============================================================================

/// A configured product. Immutable once the catalogue is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Filled from the catalogue map key, never read from the product body
    #[serde(skip)]
    pub product_name: String,
    /// Source kind selector ("random", "coingecko"); empty means random
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub min_price: i32,
    #[serde(default)]
    pub max_price: i32,
    /// Reserved for alerting, not read by the pipeline
    #[serde(default)]
    pub alert_threshold: i32,
}

impl Product {
    pub fn new(product_name: &str, provider: &str, min_price: i32, max_price: i32) -> Self {
        Self {
            product_name: product_name.to_string(),
            provider: provider.to_string(),
            min_price,
            max_price,
            alert_threshold: 0,
        }
    }
}

/// A product together with the store that lists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedProduct {
    pub store_name: String,
    pub product: Product,
}

// ============================================================================
// Price Events
// ============================================================================

/// One observed price, created per fetch result and consumed once by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEvent {
    pub store_name: String,
    pub product_name: String,
    pub price: i32,
    /// Assigned at emission time; upstream sources do not carry timestamps
    pub observed_at: DateTime<Utc>,
}

impl PriceEvent {
    pub fn new(store_name: &str, product_name: &str, price: i32) -> Self {
        Self {
            store_name: store_name.to_string(),
            product_name: product_name.to_string(),
            price,
            observed_at: Utc::now(),
        }
    }
}

// ============================================================================
// Running Statistics
// ============================================================================

/// Per-product running statistics since process start. Never reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEntry {
    pub count: u64,
    /// i64 so that long runs of i32 prices cannot overflow
    pub sum: i64,
    pub min: i32,
    pub max: i32,
}

impl StatEntry {
    /// Entry seeded by the first observed price
    pub fn first(price: i32) -> Self {
        Self {
            count: 1,
            sum: price as i64,
            min: price,
            max: price,
        }
    }

    pub fn record(&mut self, price: i32) {
        self.count += 1;
        self.sum += price as i64;
        self.min = self.min.min(price);
        self.max = self.max.max(price);
    }

    /// Mean price, derived on demand
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum as f64 / self.count as f64
    }
}

// ============================================================================
// History (owned by the durable store)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryEntry {
    pub store_name: String,
    pub product_name: String,
    pub price: i32,
    /// Assigned by the store on write
    pub timestamp: DateTime<Utc>,
}
