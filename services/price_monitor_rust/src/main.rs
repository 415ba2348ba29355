use anyhow::{Context, Result};
use dotenv::dotenv;
use price_monitor_core::db::{create_pool, DbPoolConfig, MemoryPriceStore, PgPriceStore, PriceStore};
use price_monitor_core::monitoring::{consume_and_aggregate, PipelineStats, PriceScheduler};
use price_monitor_core::providers::ProviderRegistry;
use price_monitor_core::{CatalogConfig, PriceService};
use price_monitor_rust::api::{create_router, ApiState};
use price_monitor_rust::config::ServiceConfig;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Price Monitor Service...");

    // Config
    let config = ServiceConfig::from_env()?;
    let catalog = CatalogConfig::load(&config.catalog_path)
        .with_context(|| format!("Failed to load catalogue from {}", config.catalog_path))?;

    // Storage
    let store: Arc<dyn PriceStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url, DbPoolConfig::from_env()).await?;
            let store = PgPriceStore::new(pool);
            store
                .init_schema()
                .await
                .context("Failed to initialize database schema")?;
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL is not set; price history is kept in memory only");
            Arc::new(MemoryPriceStore::new())
        }
    };

    // Pipeline
    let pipeline = Arc::new(PipelineStats::new());
    let prices = Arc::new(PriceService::new(store, pipeline.clone()));
    let registry = Arc::new(ProviderRegistry::from_settings(&config.provider_settings())?);
    let scheduler = PriceScheduler::new(registry, config.merge_capacity, pipeline.clone());

    let cancel = CancellationToken::new();
    let handle = scheduler.start(&catalog.assigned_products(), cancel.clone());
    let consumer = tokio::spawn(consume_and_aggregate(handle.updates, prices.clone()));

    // HTTP
    let app = create_router(Arc::new(ApiState::new(prices, pipeline.clone())));
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Starting server on {}", config.bind_addr);

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
                _ = shutdown.cancelled() => {}
            }
            shutdown.cancel();
        })
        .await
        .context("HTTP server failed")?;

    // The server can also return early on its own; make sure the pipeline stops
    cancel.cancel();

    if let Err(e) = handle.completion.await {
        error!("Scheduler task failed: {}", e);
    }
    match consumer.await {
        Ok(applied) => info!("Aggregator drained: {} events applied", applied),
        Err(e) => error!("Aggregator task failed: {}", e),
    }

    info!("Final pipeline counters: {:?}", pipeline.snapshot());
    info!("Price Monitor Service stopped");
    Ok(())
}
