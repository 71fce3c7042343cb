//! Pipeline configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use pan_pipeline::domain::{KeyWidth, PipelineConfigBuilder};
//!
//! let config = PipelineConfigBuilder::new()
//!     .key_width(KeyWidth::Six)
//!     .token_secret("terminal-7f3a")
//!     .build()
//!     .expect("Valid config");
//! ```

use std::env;
use std::path::PathBuf;

use pan_crypto::{derive_token_key, TokenKey};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default bound on steps a caller waits for a token.
pub const DEFAULT_TOKEN_TIMEOUT_STEPS: u32 = 2000;

/// Which table key widths the classifier consults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyWidth {
    /// Four-digit keys only
    Four,
    /// Six-digit keys only
    Six,
    /// Both widths; a six-digit entry wins over a four-digit one
    #[default]
    Both,
}

impl KeyWidth {
    /// Parse `4`, `6` or `both`.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "4" | "four" => Ok(KeyWidth::Four),
            "6" | "six" => Ok(KeyWidth::Six),
            "both" | "4,6" | "6,4" => Ok(KeyWidth::Both),
            other => Err(ConfigError::InvalidKeyWidth(other.to_string())),
        }
    }

    pub fn uses_six(self) -> bool {
        matches!(self, KeyWidth::Six | KeyWidth::Both)
    }

    pub fn uses_four(self) -> bool {
        matches!(self, KeyWidth::Four | KeyWidth::Both)
    }
}

/// Order in which the byte-multiplexed bus drains the eight token bytes.
///
/// Consumers must reassemble by index; this order is a producer setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainOrder([u8; 8]);

impl Default for DrainOrder {
    fn default() -> Self {
        Self::lsb_first()
    }
}

impl DrainOrder {
    /// Byte 0 (least significant) first.
    pub fn lsb_first() -> Self {
        Self([0, 1, 2, 3, 4, 5, 6, 7])
    }

    /// A custom order; must be a permutation of `0..8`.
    pub fn new(order: [u8; 8]) -> Result<Self, ConfigError> {
        let drain = Self(order);
        drain.validate()?;
        Ok(drain)
    }

    /// Parse a comma-separated list such as `7,6,5,4,3,2,1,0`.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let mut order = [0u8; 8];
        let mut count = 0;
        for part in value.split(',') {
            if count == order.len() {
                return Err(ConfigError::InvalidDrainOrder(format!(
                    "more than 8 entries in {value:?}"
                )));
            }
            order[count] = part.trim().parse().map_err(|_| {
                ConfigError::InvalidDrainOrder(format!("not a byte index: {:?}", part.trim()))
            })?;
            count += 1;
        }
        if count != order.len() {
            return Err(ConfigError::InvalidDrainOrder(format!(
                "expected 8 entries, got {count}"
            )));
        }
        Self::new(order)
    }

    /// Check the order names every index exactly once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = 0u8;
        for &index in &self.0 {
            if index > 7 {
                return Err(ConfigError::InvalidDrainOrder(format!(
                    "index {index} out of range"
                )));
            }
            seen |= 1 << index;
        }
        if seen != 0xFF {
            return Err(ConfigError::InvalidDrainOrder(
                "indices must be a permutation of 0..8".to_string(),
            ));
        }
        Ok(())
    }

    /// Byte index presented at drain position `position`.
    pub fn index_at(&self, position: usize) -> u8 {
        self.0[position]
    }
}

/// Pipeline configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Table key widths consulted by the classifier
    pub key_width: KeyWidth,
    /// Classification table path (bundled sample table when `None`)
    pub table_path: Option<PathBuf>,
    /// Provisioning secret the token key is derived from
    #[serde(skip_serializing)]
    pub token_secret: Option<String>,
    /// Token drain order on the byte-multiplexed bus
    pub drain_order: DrainOrder,
    /// Steps a caller waits for a token before giving up
    pub token_timeout_steps: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            key_width: KeyWidth::Both,
            table_path: None,
            token_secret: None,
            drain_order: DrainOrder::lsb_first(),
            token_timeout_steps: DEFAULT_TOKEN_TIMEOUT_STEPS,
        }
    }
}

impl PipelineConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PAN_KEY_WIDTH`: `4`, `6` or `both` (default: both)
    /// - `PAN_TABLE_PATH`: classification table CSV (default: bundled)
    /// - `PAN_TOKEN_SECRET`: provisioning secret (default: none, insecure key)
    /// - `PAN_DRAIN_ORDER`: comma-separated byte indices (default: 0..7)
    /// - `PAN_TOKEN_TIMEOUT_STEPS`: wait bound in steps (default: 2000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let key_width = match env::var("PAN_KEY_WIDTH") {
            Ok(v) => KeyWidth::parse(&v)?,
            Err(_) => defaults.key_width,
        };

        let drain_order = match env::var("PAN_DRAIN_ORDER") {
            Ok(v) => DrainOrder::parse(&v)?,
            Err(_) => defaults.drain_order,
        };

        let token_timeout_steps = match env::var("PAN_TOKEN_TIMEOUT_STEPS") {
            Ok(v) => v.trim().parse().map_err(|_| {
                ConfigError::InvalidParameter(format!("PAN_TOKEN_TIMEOUT_STEPS={v:?}"))
            })?,
            Err(_) => defaults.token_timeout_steps,
        };

        let config = Self {
            key_width,
            table_path: env::var("PAN_TABLE_PATH").ok().map(PathBuf::from),
            token_secret: env::var("PAN_TOKEN_SECRET").ok().filter(|s| !s.is_empty()),
            drain_order,
            token_timeout_steps,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.drain_order.validate()?;

        if self.token_timeout_steps == 0 {
            return Err(ConfigError::InvalidParameter(
                "token_timeout_steps cannot be 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate configuration for production readiness.
    ///
    /// # Returns
    ///
    /// Returns `Err` if no provisioning secret is configured, which would
    /// leave the tokenizer on the all-zero development key.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.token_key().is_insecure_default() {
            return Err(ConfigError::InsecureTokenKey);
        }
        Ok(())
    }

    /// The token key: derived from the secret, or the development key.
    pub fn token_key(&self) -> TokenKey {
        match &self.token_secret {
            Some(secret) => derive_token_key(secret.as_bytes()),
            None => TokenKey::insecure_default(),
        }
    }
}

/// Builder for PipelineConfig with validation
#[derive(Default)]
pub struct PipelineConfigBuilder {
    key_width: Option<KeyWidth>,
    table_path: Option<PathBuf>,
    token_secret: Option<String>,
    drain_order: Option<DrainOrder>,
    token_timeout_steps: Option<u32>,
}

impl PipelineConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_width(mut self, width: KeyWidth) -> Self {
        self.key_width = Some(width);
        self
    }

    pub fn table_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.table_path = Some(path.into());
        self
    }

    pub fn token_secret(mut self, secret: impl Into<String>) -> Self {
        self.token_secret = Some(secret.into());
        self
    }

    pub fn drain_order(mut self, order: DrainOrder) -> Self {
        self.drain_order = Some(order);
        self
    }

    pub fn token_timeout_steps(mut self, steps: u32) -> Self {
        self.token_timeout_steps = Some(steps);
        self
    }

    /// Build the PipelineConfig, validating all parameters
    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let defaults = PipelineConfig::default();

        let config = PipelineConfig {
            key_width: self.key_width.unwrap_or(defaults.key_width),
            table_path: self.table_path.or(defaults.table_path),
            token_secret: self.token_secret.or(defaults.token_secret),
            drain_order: self.drain_order.unwrap_or(defaults.drain_order),
            token_timeout_steps: self
                .token_timeout_steps
                .unwrap_or(defaults.token_timeout_steps),
        };

        config.validate()?;
        Ok(config)
    }
}
