//! YAML configuration file.
//!
//! ```yaml
//! log_level: info
//! jpeg_quality: 95
//! pair:
//!   offset_ratio: 0.25
//!   blend:
//!     num_bands: 4
//!     require_full_coverage: false
//! ```
//!
//! Every key is optional; command-line flags override file values.

use anyhow::{Context, Result};
use pyrblend_ops::PairOptions;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub jpeg_quality: u8,
    pub pair: PairOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            jpeg_quality: 90,
            pair: PairOptions::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        // An empty document deserializes as null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.pair.offset_ratio) {
            anyhow::bail!("pair.offset_ratio must be 0.0-1.0");
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            anyhow::bail!("jpeg_quality must be 1-100");
        }
        Ok(())
    }
}
