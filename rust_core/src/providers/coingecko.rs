//! CoinGecko price source
//!
//! Batches every assigned product into one `/simple/price` request, using
//! the lower-cased product name as the CoinGecko coin id.

use super::PriceProvider;
use crate::error::FetchError;
use crate::models::Product;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// CoinGecko API price source
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

/// Simplified price response from CoinGecko /simple/price endpoint
#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    #[serde(flatten)]
    prices: HashMap<String, SimplePriceData>,
}

#[derive(Debug, Deserialize)]
struct SimplePriceData {
    #[serde(default)]
    usd: Option<f64>,
}

impl CoinGeckoProvider {
    /// Create a provider against the public API with the default 10s timeout
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create with a custom endpoint and request timeout
    pub fn with_config(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("PriceMonitor/1.0")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn request_prices(&self, ids: &str) -> Result<SimplePriceResponse, FetchError> {
        let url = format!("{}/simple/price", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("ids", ids), ("vs_currencies", "usd")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json::<SimplePriceResponse>()
            .await
            .map_err(|e| match FetchError::from(e) {
                FetchError::Timeout => FetchError::Timeout,
                other => FetchError::Decode(other.to_string()),
            })
    }
}

/// Truncate a USD quote to whole units. None if it is not finite or does not fit an i32.
fn whole_usd(usd: f64) -> Option<i32> {
    let whole = usd.trunc();
    if whole.is_finite() && whole >= i32::MIN as f64 && whole <= i32::MAX as f64 {
        Some(whole as i32)
    } else {
        None
    }
}

/// Map CoinGecko ids back to the catalogue's original product names.
/// Products the response does not cover, or quotes out of range, are left out.
fn map_to_products(products: &[Product], response: &SimplePriceResponse) -> HashMap<String, i32> {
    products
        .iter()
        .filter_map(|product| {
            let id = product.product_name.to_lowercase();
            let usd = response.prices.get(&id).and_then(|data| data.usd)?;
            match whole_usd(usd) {
                Some(price) => Some((product.product_name.clone(), price)),
                None => {
                    debug!("Skipping unrepresentable price for {}: {}", product.product_name, usd);
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    fn provider_name(&self) -> &str {
        "coingecko"
    }

    async fn fetch_prices(
        &self,
        products: &[Product],
        cancel: &CancellationToken,
    ) -> Result<HashMap<String, i32>, FetchError> {
        if products.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<String> = products
            .iter()
            .map(|p| p.product_name.to_lowercase())
            .collect();
        let ids = ids.join(",");

        debug!("Fetching prices for {} coins from CoinGecko", products.len());

        // Dropping the request future on cancellation aborts the connection
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            result = self.request_prices(&ids) => result?,
        };

        Ok(map_to_products(products, &response))
    }
}
