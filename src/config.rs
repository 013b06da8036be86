//! TOML configuration for the `fdx` binary and SQLite-backed engines.
//!
//! ```toml
//! [db]
//! path = "./data/fdx.sqlite"
//!
//! [engine]
//! debug = false
//!
//! [engine.weights]
//! title = 5.0
//! body = 3.0
//! location = 1.0
//! ```
//!
//! Only `[db].path` is required.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use facetdex_core::engine::EngineOptions;
use facetdex_core::models::FieldWeights;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub weights: FieldWeights,
}

impl Config {
    /// Engine options derived from the `[engine]` table.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            weights: self.engine.weights,
            debug: self.engine.debug,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be >= 1");
    }

    if let Err(e) = config.engine.weights.validate() {
        anyhow::bail!("engine.weights: {}", e);
    }

    Ok(config)
}
