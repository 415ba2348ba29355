//! Price Provider Registry
//!
//! Maps each source kind to its concrete implementation and polling cadence.

use super::coingecko::{self, CoinGeckoProvider};
use super::random::RandomProvider;
use super::{PriceProvider, ProviderKind};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Tunables for the default providers
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub random_poll_interval: Duration,
    pub coingecko_poll_interval: Duration,
    pub coingecko_base_url: String,
    pub coingecko_timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            random_poll_interval: ProviderKind::Random.default_poll_interval(),
            coingecko_poll_interval: ProviderKind::CoinGecko.default_poll_interval(),
            coingecko_base_url: coingecko::DEFAULT_BASE_URL.to_string(),
            coingecko_timeout: coingecko::DEFAULT_TIMEOUT,
        }
    }
}

/// A provider plus the interval its polling loop runs at
#[derive(Clone)]
pub struct RegisteredProvider {
    pub provider: Arc<dyn PriceProvider>,
    pub poll_interval: Duration,
}

/// Registry of price providers, keyed by source kind
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, RegisteredProvider>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Create a registry with both built-in sources at their default cadence
    pub fn with_defaults() -> Result<Self> {
        Self::from_settings(&ProviderSettings::default())
    }

    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let mut registry = Self::new();

        registry.register(
            ProviderKind::Random,
            Arc::new(RandomProvider::new()),
            settings.random_poll_interval,
        );

        let coingecko =
            CoinGeckoProvider::with_config(&settings.coingecko_base_url, settings.coingecko_timeout)?;
        registry.register(
            ProviderKind::CoinGecko,
            Arc::new(coingecko),
            settings.coingecko_poll_interval,
        );

        info!(
            "ProviderRegistry initialized with {} providers",
            registry.providers.len()
        );

        Ok(registry)
    }

    /// Register (or replace) the provider serving `kind`
    pub fn register(
        &mut self,
        kind: ProviderKind,
        provider: Arc<dyn PriceProvider>,
        poll_interval: Duration,
    ) {
        info!(
            "Registering provider: {} (poll interval {:?})",
            kind, poll_interval
        );
        self.providers.insert(
            kind,
            RegisteredProvider {
                provider,
                poll_interval,
            },
        );
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&RegisteredProvider> {
        self.providers.get(&kind)
    }

    pub fn has_provider(&self, kind: ProviderKind) -> bool {
        self.providers.contains_key(&kind)
    }

    pub fn list_providers(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<ProviderKind> = self.providers.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
