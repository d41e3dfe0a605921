//! Configuration for transforms and decoder limits.
//!
//! Every field has a default, so an empty document is a valid config:
//!
//! ```yaml
//! transform:
//!   jpeg_quality: 85
//!   unknown_orientation: ignore      # or: reject
//!   idle_request: allow_auto_orient  # or: reject
//! limits:
//!   max_width: 16384
//!   max_height: 16384
//!   max_alloc_bytes: 536870912
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// What to do with an orientation tag value outside `{1, 3, 6, 8}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownOrientationPolicy {
    /// Log a warning and apply no rotation.
    #[default]
    Ignore,
    /// Fail the transform with a metadata error.
    Reject,
}

/// What to do with a request that ends up with nothing to resize or rotate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleRequestPolicy {
    /// Auto-orient requests that find the image already upright still
    /// succeed, re-encoding the source into the destination. Anything else
    /// with nothing to do is rejected.
    #[default]
    AllowAutoOrient,
    /// Every request with nothing to do is rejected.
    Reject,
}

/// Settings consumed by the transform pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Quality hint attached to JPEG destinations (1-100).
    pub jpeg_quality: u8,
    pub unknown_orientation: UnknownOrientationPolicy,
    pub idle_request: IdleRequestPolicy,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 85,
            unknown_orientation: UnknownOrientationPolicy::default(),
            idle_request: IdleRequestPolicy::default(),
        }
    }
}

/// Decoder safety limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeLimits {
    pub max_width: u32,
    pub max_height: u32,
    pub max_alloc_bytes: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_width: 16_384,
            max_height: 16_384,
            max_alloc_bytes: 512 * 1024 * 1024,
        }
    }
}

impl DecodeLimits {
    /// Convert to the image crate's limits.
    pub fn to_image_limits(self) -> image::Limits {
        let mut limits = image::Limits::default();
        limits.max_image_width = Some(self.max_width);
        limits.max_image_height = Some(self.max_height);
        limits.max_alloc = Some(self.max_alloc_bytes);
        limits
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transform: TransformConfig,
    pub limits: DecodeLimits,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document; treat it as all defaults
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.transform.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality must be 1-100, got {}",
                self.transform.jpeg_quality
            )));
        }
        if self.limits.max_width == 0 || self.limits.max_height == 0 {
            return Err(ConfigError::Invalid(
                "decode limits must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
