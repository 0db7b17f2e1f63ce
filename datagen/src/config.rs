use anyhow::{bail, Context};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::sinks::sqlite::MAX_BATCH_ROWS;

const DEFAULT_CONFIG_PATH: &str = "datagen-config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub uri: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: "sqlite://dev.sqlite3".to_string(),
            max_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub meters: usize,
    pub spots: usize,
    pub years: u32,
    /// Measurements start on January 1 of this year.
    pub start_year: i32,
    /// Fixed seed for reproducible datasets; drawn from the OS when absent.
    pub seed: Option<u64>,
    pub batch_size: usize,
    pub progress_every: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            meters: 5_000,
            spots: 2_000,
            years: 3,
            start_year: 2021,
            seed: None,
            batch_size: 500,
            progress_every: 100,
        }
    }
}

impl GenerationConfig {
    /// One measurement per day, 365 days a year.
    pub fn days(&self) -> usize {
        365 * self.years as usize
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub top_spots_limit: u32,
    pub sample_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_spots_limit: 100,
            sample_size: 1_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub generation: GenerationConfig,
    pub queries: QueryConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    /// Load from `DATAGEN_CONFIG`, or `datagen-config.toml` when unset.
    ///
    /// A missing default file yields the built-in defaults; a missing file
    /// named explicitly through the environment is an error.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let cfg = match env::var("DATAGEN_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH)?,
            Err(_) => Self::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let generation = &self.generation;
        if generation.meters > 0 && generation.spots == 0 {
            bail!("generation.spots must be at least 1 when meters are generated");
        }
        if generation.years == 0 {
            bail!("generation.years must be at least 1");
        }
        if generation.batch_size == 0 || generation.batch_size > MAX_BATCH_ROWS {
            bail!("generation.batch_size must be between 1 and {MAX_BATCH_ROWS}");
        }
        if generation.progress_every == 0 {
            bail!("generation.progress_every must be at least 1");
        }
        if self.database.max_connections == 0 {
            bail!("database.max_connections must be at least 1");
        }
        Ok(())
    }
}
