//! Configuration for price_monitor_rust

use anyhow::{anyhow, Result};
use price_monitor_core::config::DEFAULT_CONFIG_PATH;
use price_monitor_core::monitoring::DEFAULT_MERGE_CAPACITY;
use price_monitor_core::providers::coingecko;
use price_monitor_core::providers::ProviderSettings;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    // Catalogue
    pub catalog_path: String,

    // Storage; None runs on the in-memory store
    pub database_url: Option<String>,

    // HTTP
    pub bind_addr: SocketAddr,

    // Pipeline
    pub random_poll_interval: Duration,
    pub coingecko_poll_interval: Duration,
    pub merge_capacity: usize,

    // CoinGecko
    pub coingecko_base_url: String,
    pub coingecko_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, so tests need not touch the process env
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let random_poll_ms = parse_u64(&lookup, "RANDOM_POLL_INTERVAL_MS", 2000)?;
        let coingecko_poll_secs = parse_u64(&lookup, "COINGECKO_POLL_INTERVAL_SECS", 60)?;
        let coingecko_timeout_secs = parse_u64(&lookup, "COINGECKO_TIMEOUT_SECS", 10)?;
        let merge_capacity = parse_usize(&lookup, "MERGE_CHANNEL_CAPACITY", DEFAULT_MERGE_CAPACITY)?;

        if random_poll_ms == 0 {
            return Err(anyhow!("RANDOM_POLL_INTERVAL_MS must be > 0"));
        }
        if coingecko_poll_secs == 0 {
            return Err(anyhow!("COINGECKO_POLL_INTERVAL_SECS must be > 0"));
        }
        if coingecko_timeout_secs == 0 {
            return Err(anyhow!("COINGECKO_TIMEOUT_SECS must be > 0"));
        }
        if merge_capacity == 0 {
            return Err(anyhow!("MERGE_CHANNEL_CAPACITY must be > 0"));
        }

        let bind_addr = lookup("HTTP_BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|_| anyhow!("HTTP_BIND_ADDR must be a socket address like 0.0.0.0:8080"))?;

        Ok(Self {
            catalog_path: lookup("PRICE_CONFIG_PATH")
                .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()),

            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),

            bind_addr,

            random_poll_interval: Duration::from_millis(random_poll_ms),
            coingecko_poll_interval: Duration::from_secs(coingecko_poll_secs),
            merge_capacity,

            coingecko_base_url: lookup("COINGECKO_BASE_URL")
                .unwrap_or_else(|| coingecko::DEFAULT_BASE_URL.to_string()),
            coingecko_timeout: Duration::from_secs(coingecko_timeout_secs),
        })
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            random_poll_interval: self.random_poll_interval,
            coingecko_poll_interval: self.coingecko_poll_interval,
            coingecko_base_url: self.coingecko_base_url.clone(),
            coingecko_timeout: self.coingecko_timeout,
        }
    }
}

/// Parse a variable as u64 with default fallback
fn parse_u64<F>(lookup: &F, var_name: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var_name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} must be a valid u64", var_name)),
        None => Ok(default),
    }
}

/// Parse a variable as usize with default fallback
fn parse_usize<F>(lookup: &F, var_name: &str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var_name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} must be a valid usize", var_name)),
        None => Ok(default),
    }
}
