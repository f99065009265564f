//! Error types for the statistics engine and the analysis orchestrator.

use serde::Serialize;
use thiserror::Error;

/// Errors produced while deriving returns, computing statistics, or
/// assembling an analysis run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// Fewer data points than a formula requires.
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    /// Two series were compared without matching date indices.
    #[error("Misaligned series: {0}")]
    MisalignedSeries(String),
    /// A zero variance or zero denominator makes the statistic undefined.
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),
    /// Price data for a symbol could not be fetched.
    #[error("Data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },
    /// User-provided input failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StatsError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InsufficientData { .. } => FailureKind::InsufficientData,
            Self::MisalignedSeries(_) => FailureKind::MisalignedSeries,
            Self::DegenerateInput(_) => FailureKind::DegenerateInput,
            Self::DataUnavailable { .. } => FailureKind::DataUnavailable,
            Self::InvalidInput(_) => FailureKind::InvalidInput,
        }
    }
}

/// Serializable classification of a per-ticker failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InsufficientData,
    MisalignedSeries,
    DegenerateInput,
    DataUnavailable,
    InvalidInput,
}

impl FailureKind {
    /// Short marker shown in place of statistics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InsufficientData => "insufficient data",
            Self::MisalignedSeries => "misaligned dates",
            Self::DegenerateInput => "undefined (zero variance)",
            Self::DataUnavailable => "data unavailable",
            Self::InvalidInput => "invalid input",
        }
    }
}
