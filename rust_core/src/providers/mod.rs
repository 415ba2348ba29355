//! Price provider abstractions
//!
//! Defines the PriceProvider trait that allows pluggable price sources
//! (bounded-random synthetic prices, the CoinGecko public API, ...) and the
//! closed set of source kinds the catalogue may reference.

use crate::error::{FetchError, UnknownProviderKind};
use crate::models::Product;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// Concrete provider implementations
pub mod coingecko;
pub mod random;
pub mod registry;

pub use coingecko::CoinGeckoProvider;
pub use random::RandomProvider;
pub use registry::{ProviderRegistry, ProviderSettings};

/// Universal price provider trait
///
/// Fetches current prices for a batch of products in a single call.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Provider name for logging and debugging
    fn provider_name(&self) -> &str;

    /// Fetch current prices for `products`, keyed by product name.
    ///
    /// Products the source cannot resolve are simply absent from the map.
    /// Any error discards the whole batch. Remote sources abort their
    /// in-flight request once `cancel` fires and return `FetchError::Cancelled`.
    async fn fetch_prices(
        &self,
        products: &[Product],
        cancel: &CancellationToken,
    ) -> Result<HashMap<String, i32>, FetchError>;
}

/// Source kinds known to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Random,
    CoinGecko,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Random => "random",
            ProviderKind::CoinGecko => "coingecko",
        }
    }

    /// Polling cadence used when no override is configured.
    ///
    /// CoinGecko's public tier allows a handful of calls per minute, so one
    /// batched call a minute stays well inside it.
    pub fn default_poll_interval(&self) -> Duration {
        match self {
            ProviderKind::Random => Duration::from_secs(2),
            ProviderKind::CoinGecko => Duration::from_secs(60),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = UnknownProviderKind;

    /// Empty strings resolve to the random source
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "random" => Ok(ProviderKind::Random),
            "coingecko" => Ok(ProviderKind::CoinGecko),
            _ => Err(UnknownProviderKind(s.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
