//! Price Monitor Core - polling, fan-in and aggregation of product prices.
//!
//! This crate provides:
//! - Pluggable price providers (bounded-random, CoinGecko) behind one trait
//! - A per-source polling scheduler feeding a single bounded merge stage
//! - An aggregator keeping the latest price and running stats per product
//! - Durable price history (Postgres, or in-memory when no database is set)
//! - Product catalogue loading

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod monitoring;
pub mod providers;
pub mod service;

pub use config::CatalogConfig;
pub use error::{ConfigError, FetchError, UnknownProviderKind};
pub use models::{AssignedProduct, PriceEvent, PriceHistoryEntry, Product, StatEntry};
pub use service::PriceService;
