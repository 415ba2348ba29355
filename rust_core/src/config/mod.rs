//! Product catalogue loading
//!
//! The catalogue is a JSON document of the form
//! `{"stores": {"<store>": {"<product>": {"provider": .., "minPrice": .., ...}}}}`.
//! Product names come from the map keys.

use crate::error::ConfigError;
use crate::models::{AssignedProduct, Product};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// store name -> product name -> product
    #[serde(default)]
    pub stores: BTreeMap<String, BTreeMap<String, Product>>,
}

impl CatalogConfig {
    /// Read and validate the catalogue at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_json(&data)?;
        info!(
            "Loaded catalogue from {}: {} stores, {} products",
            path.display(),
            config.stores.len(),
            config.product_count()
        );
        Ok(config)
    }

    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let mut config: CatalogConfig = serde_json::from_str(data)?;

        for (store, products) in config.stores.iter_mut() {
            for (name, product) in products.iter_mut() {
                if name.trim().is_empty() {
                    return Err(ConfigError::InvalidProduct {
                        store: store.clone(),
                        reason: "product name is empty".to_string(),
                    });
                }
                product.product_name = name.clone();
            }
        }

        Ok(config)
    }

    pub fn product_count(&self) -> usize {
        self.stores.values().map(BTreeMap::len).sum()
    }

    /// Flatten the catalogue into (store, product) pairs
    pub fn assigned_products(&self) -> Vec<AssignedProduct> {
        self.stores
            .iter()
            .flat_map(|(store, products)| {
                products.values().map(move |product| AssignedProduct {
                    store_name: store.clone(),
                    product: product.clone(),
                })
            })
            .collect()
    }
}
