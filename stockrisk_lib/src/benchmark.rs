//! Benchmark index resolution and the per-run benchmark context.
//!
//! Friendly aliases (`nifty50`, `sp500`, ...) are loaded from an embedded YAML
//! table, following the same compile-time `include_str!` pattern as other
//! seed data.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::error::StatsError;
use crate::returns::derive_returns;
use crate::series::{PriceSeries, ReturnSeries};
use crate::validation;

/// Default benchmark: the Nifty 50 index.
pub const DEFAULT_BENCHMARK: &str = "^NSEI";

/// Error types for benchmark alias operations.
#[derive(Error, Debug)]
pub enum BenchmarkAliasError {
    #[error("Failed to parse benchmark alias YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Duplicate benchmark alias in alias file: {0}")]
    DuplicateAlias(String),
}

/// Top-level structure for the benchmark alias YAML file.
#[derive(Deserialize, Debug)]
pub struct BenchmarkAliasFile {
    pub benchmarks: Vec<BenchmarkAlias>,
}

/// A single alias → index symbol mapping.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BenchmarkAlias {
    pub alias: String,
    pub symbol: String,
    pub name: String,
}

/// Parse benchmark aliases from YAML content, preserving file order.
pub fn parse_benchmark_aliases(yaml_content: &str) -> Result<Vec<BenchmarkAlias>, BenchmarkAliasError> {
    let file: BenchmarkAliasFile = serde_yml::from_str(yaml_content)?;

    let mut seen = HashSet::new();
    for entry in &file.benchmarks {
        if !seen.insert(entry.alias.to_lowercase()) {
            return Err(BenchmarkAliasError::DuplicateAlias(entry.alias.clone()));
        }
    }

    Ok(file.benchmarks)
}

/// Load benchmark aliases from the embedded YAML file.
pub fn load_benchmark_aliases() -> Result<Vec<BenchmarkAlias>, BenchmarkAliasError> {
    let yaml_content = include_str!("../../seed_data/benchmarks.yml");
    parse_benchmark_aliases(yaml_content)
}

/// Resolve user input to an index symbol: a known alias (case-insensitive)
/// maps to its symbol, anything else must be a valid ticker.
pub fn resolve_benchmark(input: &str, aliases: &[BenchmarkAlias]) -> Result<String, StatsError> {
    let wanted = input.trim().to_lowercase();
    if let Some(entry) = aliases.iter().find(|a| a.alias.to_lowercase() == wanted) {
        return Ok(entry.symbol.clone());
    }
    validation::validate_ticker(input)
}

/// The benchmark series shared read-only by every holding in one run.
#[derive(Debug, Clone)]
pub struct BenchmarkContext {
    pub prices: PriceSeries,
    pub returns: ReturnSeries,
    pub last_close: f64,
    pub hypothetical_level: Option<f64>,
}

impl BenchmarkContext {
    pub fn new(prices: PriceSeries, hypothetical_level: Option<f64>) -> Result<Self, StatsError> {
        let returns = derive_returns(&prices)?;
        let last_close = prices
            .last()
            .map(|p| p.adj_close)
            .ok_or(StatsError::InsufficientData {
                required: 2,
                actual: 0,
            })?;
        Ok(Self {
            prices,
            returns,
            last_close,
            hypothetical_level,
        })
    }

    pub fn symbol(&self) -> &str {
        self.prices.symbol()
    }

    /// Implied index move in percent, when a hypothetical level is set.
    pub fn index_change_percent(&self) -> Option<f64> {
        let level = self.hypothetical_level?;
        if self.last_close == 0.0 || !self.last_close.is_finite() {
            return None;
        }
        Some((level / self.last_close - 1.0) * 100.0)
    }
}
