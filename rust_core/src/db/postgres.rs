//! Postgres-backed price history

use super::{PriceStore, HISTORY_LIMIT};
use crate::models::{PriceEvent, PriceHistoryEntry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

pub struct PgPriceStore {
    pool: PgPool,
}

impl PgPriceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the price_history table and its lookup index if missing
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS price_history (
                id SERIAL PRIMARY KEY,
                store_name VARCHAR(255) NOT NULL,
                product_name VARCHAR(255) NOT NULL,
                price INT NOT NULL,
                timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create price_history table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_price_history_product_ts
                ON price_history (product_name, timestamp DESC)
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create price_history index")?;

        info!("price_history schema ready");
        Ok(())
    }
}

#[async_trait]
impl PriceStore for PgPriceStore {
    async fn save_price(&self, event: &PriceEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO price_history (store_name, product_name, price)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&event.store_name)
        .bind(&event.product_name)
        .bind(event.price)
        .execute(&self.pool)
        .await
        .context("Failed to insert price")?;

        debug!(
            "Inserted {} / {} price: {}",
            event.store_name, event.product_name, event.price
        );

        Ok(())
    }

    async fn price_history(&self, product_name: &str) -> Result<Vec<PriceHistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT store_name, product_name, price, timestamp
            FROM price_history
            WHERE product_name = $1
            ORDER BY timestamp DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(product_name)
        .bind(HISTORY_LIMIT as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch price history")?;

        rows.into_iter()
            .map(|row| -> Result<PriceHistoryEntry> {
                Ok(PriceHistoryEntry {
                    store_name: row.try_get("store_name")?,
                    product_name: row.try_get("product_name")?,
                    price: row.try_get("price")?,
                    timestamp: row.try_get("timestamp")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::{create_pool, DbPoolConfig};

    async fn connect() -> PgPriceStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = create_pool(&url, DbPoolConfig::default()).await.unwrap();
        let store = PgPriceStore::new(pool);
        store.init_schema().await.unwrap();
        store
    }

    #[tokio::test]
    #[ignore] // Requires a running Postgres
    async fn test_save_and_read_back() {
        let store = connect().await;
        let product = format!("test-product-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0));

        for price in [5, 6, 7] {
            store.save_price(&PriceEvent::new("test-store", &product, price)).await.unwrap();
        }

        let history = store.price_history(&product).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].price, 7);
        assert_eq!(history[2].price, 5);
    }

    #[tokio::test]
    #[ignore] // Requires a running Postgres
    async fn test_unknown_product_is_empty() {
        let store = connect().await;
        let history = store.price_history("no-such-product-anywhere").await.unwrap();
        assert!(history.is_empty());
    }
}
