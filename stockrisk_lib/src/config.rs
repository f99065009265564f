//! Optional TOML configuration for analysis defaults and fetch behaviour.
//!
//! Every field has a default, so an empty or missing file is valid. CLI
//! flags are applied on top by the binary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::benchmark::DEFAULT_BENCHMARK;
use crate::error::StatsError;
use crate::series::DateRange;

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "stockrisk.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// How stock and benchmark calendars are reconciled before comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentPolicy {
    /// Restrict both series to their shared trading dates.
    #[default]
    CommonDates,
    /// Require identical dates; divergence is a per-ticker failure.
    Strict,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Benchmark alias or symbol.
    pub benchmark: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub alignment: AlignmentPolicy,
    pub concurrency: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            benchmark: DEFAULT_BENCHMARK.to_string(),
            start: None,
            end: None,
            alignment: AlignmentPolicy::default(),
            concurrency: 4,
        }
    }
}

impl AnalysisConfig {
    /// The configured window, falling back to the default for unset ends.
    pub fn window(&self) -> Result<DateRange, StatsError> {
        let default = DateRange::default();
        DateRange::new(
            self.start.unwrap_or(default.start),
            self.end.unwrap_or(default.end),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub cache_ttl_secs: u64,
    pub max_retries: u32,
    /// Use Tiingo as a fallback when `TIINGO_API_KEY` is set.
    pub tiingo_fallback: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 3600,
            max_retries: 3,
            tiingo_fallback: true,
        }
    }
}

impl AppConfig {
    pub fn parse(toml_content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(toml_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Load `path` if given, else `stockrisk.toml` if it exists, else defaults.
    /// An explicitly given path must exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    tracing::debug!("loading {}", DEFAULT_CONFIG_FILE);
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "analysis.concurrency must be at least 1".to_string(),
            ));
        }
        if self.analysis.benchmark.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "analysis.benchmark must not be empty".to_string(),
            ));
        }
        self.analysis
            .window()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }
}
