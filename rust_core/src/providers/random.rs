//! Bounded-random price source
//!
//! Draws a uniform integer in `[min_price, max_price]` per product.

use super::PriceProvider;
use crate::error::FetchError;
use crate::models::Product;
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

pub struct RandomProvider {
    rng: Mutex<StdRng>,
}

impl RandomProvider {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence, for reproducible runs
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn draw(&self, products: &[Product]) -> HashMap<String, i32> {
        let mut rng = self.rng.lock();
        products
            .iter()
            .map(|product| {
                // Degenerate or inverted ranges pin to min_price
                let price = if product.min_price >= product.max_price {
                    product.min_price
                } else {
                    rng.gen_range(product.min_price..=product.max_price)
                };
                (product.product_name.clone(), price)
            })
            .collect()
    }
}

impl Default for RandomProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceProvider for RandomProvider {
    fn provider_name(&self) -> &str {
        "random"
    }

    async fn fetch_prices(
        &self,
        products: &[Product],
        _cancel: &CancellationToken,
    ) -> Result<HashMap<String, i32>, FetchError> {
        Ok(self.draw(products))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_range_returns_min() {
        let provider = RandomProvider::new();
        let products = vec![Product::new("flat", "random", 10, 10)];
        let cancel = CancellationToken::new();

        for _ in 0..50 {
            let prices = provider.fetch_prices(&products, &cancel).await.unwrap();
            assert_eq!(prices["flat"], 10);
        }
    }

    #[tokio::test]
    async fn test_inverted_range_returns_min() {
        let provider = RandomProvider::new();
        let products = vec![Product::new("odd", "random", 30, 5)];
        let prices = provider
            .fetch_prices(&products, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(prices["odd"], 30);
    }

    #[tokio::test]
    async fn test_draws_stay_in_bounds_and_hit_both_ends() {
        let provider = RandomProvider::with_seed(7);
        let products = vec![Product::new("widget", "random", 1, 4)];
        let cancel = CancellationToken::new();

        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..2000 {
            let price = provider.fetch_prices(&products, &cancel).await.unwrap()["widget"];
            assert!((1..=4).contains(&price), "price {} out of range", price);
            seen_min |= price == 1;
            seen_max |= price == 4;
        }

        assert!(seen_min && seen_max);
    }

    #[tokio::test]
    async fn test_every_product_is_priced() {
        let provider = RandomProvider::new();
        let products = vec![
            Product::new("a", "", 1, 100),
            Product::new("b", "", 200, 300),
            Product::new("c", "", -5, 5),
        ];
        let prices = provider
            .fetch_prices(&products, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(prices.len(), 3);
        assert!((200..=300).contains(&prices["b"]));
        assert!((-5..=5).contains(&prices["c"]));
    }
}
