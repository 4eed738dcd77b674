//! Catalog configuration.

use thiserror::Error;

use pim_products::DEFAULT_PRICE_TYPE;

pub const MAX_SKU_LENGTH_ENV: &str = "PIM_MAX_SKU_LENGTH";
pub const DEFAULT_PRICE_TYPE_ENV: &str = "PIM_DEFAULT_PRICE_TYPE";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Settings of the catalog writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Longest SKU accepted on create/update (width of the SKU column).
    pub max_sku_length: usize,
    /// Price type assigned to prices submitted without one.
    pub default_price_type: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_sku_length: 255,
            default_price_type: DEFAULT_PRICE_TYPE.to_string(),
        }
    }
}

impl CatalogConfig {
    /// Read overrides from `PIM_MAX_SKU_LENGTH` / `PIM_DEFAULT_PRICE_TYPE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(MAX_SKU_LENGTH_ENV) {
            let value = raw.trim().parse::<usize>().map_err(|e| ConfigError::InvalidValue {
                key: MAX_SKU_LENGTH_ENV,
                message: e.to_string(),
            })?;
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: MAX_SKU_LENGTH_ENV,
                    message: "must be greater than zero".to_string(),
                });
            }
            config.max_sku_length = value;
        }

        if let Some(raw) = lookup(DEFAULT_PRICE_TYPE_ENV) {
            let value = raw.trim();
            if value.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: DEFAULT_PRICE_TYPE_ENV,
                    message: "must not be blank".to_string(),
                });
            }
            config.default_price_type = value.to_string();
        }

        Ok(config)
    }
}
