//! Library layer for stockrisk: price sources, return derivation, the risk
//! statistics engine, and portfolio analysis orchestration.
//!
//! Prices come from Yahoo Finance with an optional Tiingo fallback, wrapped in
//! rate-limit retry and an in-memory TTL cache.

pub mod analysis;
pub mod benchmark;
pub mod cache;
pub mod config;
pub mod error;
pub mod portfolio;
pub mod returns;
pub mod series;
pub mod source;
pub mod stats;
pub mod tiingo;
pub mod validation;
pub mod yahoo;

pub use analysis::{
    analyze, build_report, AnalysisReport, AnalysisRequest, BenchmarkSummary, CorrelationEntry,
    FetchedHolding, StatResult, TickerFailure, TickerOutcome, TickerReport,
};
pub use benchmark::{
    load_benchmark_aliases, resolve_benchmark, BenchmarkAlias, BenchmarkAliasError,
    BenchmarkContext, DEFAULT_BENCHMARK,
};
pub use cache::{CachedSource, MemoryCache};
pub use config::{AlignmentPolicy, AppConfig, ConfigError};
pub use error::{FailureKind, StatsError};
pub use portfolio::{Holding, Portfolio};
pub use returns::derive_returns;
pub use series::{DateRange, PricePoint, PriceSeries, ReturnPoint, ReturnSeries};
pub use source::{FallbackSource, FetchError, PriceSource, RetryingSource};
pub use tiingo::{TiingoClient, TiingoError};
pub use yahoo::YahooClient;
