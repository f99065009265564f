//! Portfolio analysis orchestration.
//!
//! [`analyze`] fetches the benchmark once, fetches every holding with bounded
//! concurrency, and hands the fetched data to [`build_report`], which is pure
//! and deterministic. Per-ticker failures are recorded on that ticker; only a
//! benchmark failure aborts the run.

use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::benchmark::{BenchmarkContext, DEFAULT_BENCHMARK};
use crate::config::AlignmentPolicy;
use crate::error::{FailureKind, StatsError};
use crate::portfolio::{Holding, Portfolio};
use crate::returns::derive_returns;
use crate::series::{DateRange, PriceSeries};
use crate::source::{FetchError, PriceSource};
use crate::stats::{
    compute_annualized_volatility, compute_beta, compute_correlation,
    compute_expected_change_absolute, compute_expected_change_percent, ExpectedChangeInputs,
};

/// Default number of concurrent holding fetches.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Everything one analysis run needs. Inputs are validated before this is built.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub portfolio: Portfolio,
    pub window: DateRange,
    /// Resolved benchmark symbol (not an alias).
    pub benchmark: String,
    pub hypothetical_index_level: Option<f64>,
    pub alignment: AlignmentPolicy,
    pub concurrency: usize,
}

impl AnalysisRequest {
    pub fn new(portfolio: Portfolio) -> Self {
        Self {
            portfolio,
            window: DateRange::default(),
            benchmark: DEFAULT_BENCHMARK.to_string(),
            hypothetical_index_level: None,
            alignment: AlignmentPolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_window(mut self, window: DateRange) -> Self {
        self.window = window;
        self
    }

    pub fn with_benchmark(mut self, symbol: impl Into<String>) -> Self {
        self.benchmark = symbol.into();
        self
    }

    pub fn with_hypothetical_index_level(mut self, level: Option<f64>) -> Self {
        self.hypothetical_index_level = level;
        self
    }

    pub fn with_alignment(mut self, alignment: AlignmentPolicy) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// Statistics for one successfully analysed holding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatResult {
    pub beta: f64,
    pub annualized_volatility: f64,
    pub correlation: f64,
    pub expected_change_absolute: Option<f64>,
    pub expected_change_percent: Option<f64>,
    pub last_price: f64,
    pub market_value: f64,
    /// Aligned price points the beta was computed over.
    pub observations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&StatsError> for TickerFailure {
    fn from(err: &StatsError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickerOutcome {
    Stats(StatResult),
    Error(TickerFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerReport {
    pub symbol: String,
    pub quantity: u32,
    #[serde(flatten)]
    pub outcome: TickerOutcome,
}

impl TickerReport {
    pub fn stats(&self) -> Option<&StatResult> {
        match &self.outcome {
            TickerOutcome::Stats(s) => Some(s),
            TickerOutcome::Error(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&TickerFailure> {
        match &self.outcome {
            TickerOutcome::Stats(_) => None,
            TickerOutcome::Error(f) => Some(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkSummary {
    pub symbol: String,
    pub last_close: f64,
    pub hypothetical_level: Option<f64>,
    pub index_change_pct: Option<f64>,
    pub observations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationEntry {
    pub symbol: String,
    pub correlation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub window: DateRange,
    pub alignment: AlignmentPolicy,
    pub benchmark: BenchmarkSummary,
    pub holdings: Vec<TickerReport>,
    pub correlation_table: Vec<CorrelationEntry>,
    /// Sum of market values over holdings that produced statistics.
    pub total_market_value: f64,
}

impl AnalysisReport {
    pub fn succeeded(&self) -> usize {
        self.holdings.iter().filter(|h| h.stats().is_some()).count()
    }

    pub fn failed(&self) -> usize {
        self.holdings.len() - self.succeeded()
    }
}

/// A holding paired with its fetch outcome.
#[derive(Debug, Clone)]
pub struct FetchedHolding {
    pub holding: Holding,
    pub prices: Result<PriceSeries, StatsError>,
}

struct FetchResult {
    index: usize,
    result: Result<PriceSeries, FetchError>,
}

fn unavailable(symbol: &str, err: &FetchError) -> StatsError {
    StatsError::DataUnavailable {
        symbol: symbol.to_string(),
        reason: err.to_string(),
    }
}

/// Run a full portfolio analysis.
///
/// `on_fetch(symbol, succeeded)` is called once per holding, in completion
/// order, on the calling task. The returned report lists holdings in
/// portfolio order regardless of completion order.
pub async fn analyze<F>(
    source: Arc<dyn PriceSource>,
    request: &AnalysisRequest,
    mut on_fetch: F,
) -> Result<AnalysisReport, StatsError>
where
    F: FnMut(&str, bool),
{
    if request.portfolio.is_empty() {
        return Err(StatsError::InvalidInput(
            "portfolio has no holdings".to_string(),
        ));
    }

    tracing::debug!(
        "analyzing {} holdings against {} via {}",
        request.portfolio.len(),
        request.benchmark,
        source.name()
    );

    let benchmark_prices = source
        .fetch(&request.benchmark, request.window)
        .await
        .map_err(|e| unavailable(&request.benchmark, &e))?;
    let benchmark = BenchmarkContext::new(benchmark_prices, request.hypothetical_index_level)?;

    let holdings: Vec<Holding> = request.portfolio.iter().cloned().collect();
    let mut slots: Vec<Option<Result<PriceSeries, StatsError>>> = vec![None; holdings.len()];

    // bounded by holdings so the semaphore stays under MAX_PERMITS
    let concurrency = request.concurrency.clamp(1, holdings.len().max(1));
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let (tx, mut rx) = mpsc::channel::<FetchResult>(concurrency.saturating_mul(2));
    let mut join_set = JoinSet::new();

    for (index, holding) in holdings.iter().enumerate() {
        if holding.symbol == benchmark.symbol() {
            slots[index] = Some(Ok(benchmark.prices.clone()));
            on_fetch(&holding.symbol, true);
            continue;
        }

        let sem = Arc::clone(&semaphore);
        let sender = tx.clone();
        let source = Arc::clone(&source);
        let symbol = holding.symbol.clone();
        let window = request.window;

        join_set.spawn(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return;
            };
            let result = source.fetch(&symbol, window).await;
            let _ = sender.send(FetchResult { index, result }).await;
        });
    }
    drop(tx);

    while let Some(fetch) = rx.recv().await {
        let symbol = &holdings[fetch.index].symbol;
        let outcome = fetch.result.map_err(|e| {
            tracing::warn!("{}: {}", symbol, e);
            unavailable(symbol, &e)
        });
        on_fetch(symbol, outcome.is_ok());
        slots[fetch.index] = Some(outcome);
    }
    while join_set.join_next().await.is_some() {}

    let fetched: Vec<FetchedHolding> = holdings
        .into_iter()
        .zip(slots)
        .map(|(holding, slot)| {
            let prices = slot.unwrap_or_else(|| {
                Err(StatsError::DataUnavailable {
                    symbol: holding.symbol.clone(),
                    reason: "fetch task did not complete".to_string(),
                })
            });
            FetchedHolding { holding, prices }
        })
        .collect();

    Ok(build_report(request, &benchmark, &fetched))
}

/// Assemble the report from already-fetched data. Pure.
pub fn build_report(
    request: &AnalysisRequest,
    benchmark: &BenchmarkContext,
    fetched: &[FetchedHolding],
) -> AnalysisReport {
    let mut holdings = Vec::with_capacity(fetched.len());
    let mut correlation_table = Vec::with_capacity(fetched.len());
    let mut total_market_value = 0.0;

    for entry in fetched {
        let symbol = entry.holding.symbol.clone();
        let outcome = match entry
            .prices
            .as_ref()
            .map_err(|e| e.clone())
            .and_then(|prices| {
                analyze_holding(&entry.holding, prices, benchmark, request.alignment)
            }) {
            Ok(stats) => {
                total_market_value += stats.market_value;
                correlation_table.push(CorrelationEntry {
                    symbol: symbol.clone(),
                    correlation: Some(stats.correlation),
                });
                TickerOutcome::Stats(stats)
            }
            Err(err) => {
                if !matches!(err, StatsError::DataUnavailable { .. }) {
                    tracing::warn!("{}: {}", symbol, err);
                }
                correlation_table.push(CorrelationEntry {
                    symbol: symbol.clone(),
                    correlation: None,
                });
                TickerOutcome::Error(TickerFailure::from(&err))
            }
        };
        holdings.push(TickerReport {
            symbol,
            quantity: entry.holding.quantity,
            outcome,
        });
    }

    AnalysisReport {
        window: request.window,
        alignment: request.alignment,
        benchmark: BenchmarkSummary {
            symbol: benchmark.symbol().to_string(),
            last_close: benchmark.last_close,
            hypothetical_level: benchmark.hypothetical_level,
            index_change_pct: benchmark.index_change_percent(),
            observations: benchmark.prices.len(),
        },
        holdings,
        correlation_table,
        total_market_value,
    }
}

/// Align both price series according to `policy`.
fn align<'a>(
    stock: &'a PriceSeries,
    benchmark: &'a PriceSeries,
    policy: AlignmentPolicy,
) -> (Cow<'a, PriceSeries>, Cow<'a, PriceSeries>) {
    match policy {
        AlignmentPolicy::Strict => (Cow::Borrowed(stock), Cow::Borrowed(benchmark)),
        AlignmentPolicy::CommonDates if stock.same_dates(benchmark) => {
            (Cow::Borrowed(stock), Cow::Borrowed(benchmark))
        }
        AlignmentPolicy::CommonDates => (
            Cow::Owned(stock.restrict_to(benchmark)),
            Cow::Owned(benchmark.restrict_to(stock)),
        ),
    }
}

fn analyze_holding(
    holding: &Holding,
    prices: &PriceSeries,
    benchmark: &BenchmarkContext,
    policy: AlignmentPolicy,
) -> Result<StatResult, StatsError> {
    let (stock_aligned, bench_aligned) = align(prices, &benchmark.prices, policy);

    let beta = compute_beta(&stock_aligned, &bench_aligned)?;
    let annualized_volatility = compute_annualized_volatility(&derive_returns(prices)?)?;
    let correlation = compute_correlation(
        &derive_returns(&stock_aligned)?,
        &derive_returns(&bench_aligned)?,
    )?;

    let last_price = prices
        .last()
        .map(|p| p.adj_close)
        .ok_or(StatsError::InsufficientData {
            required: 2,
            actual: 0,
        })?;

    let (expected_change_absolute, expected_change_percent) =
        match benchmark.hypothetical_level {
            Some(level) => {
                let inputs = ExpectedChangeInputs {
                    last_stock_price: last_price,
                    beta,
                    volatility: annualized_volatility,
                    correlation,
                    hypothetical_index_level: level,
                    last_index_price: benchmark.last_close,
                };
                (
                    Some(compute_expected_change_absolute(&inputs)?),
                    Some(compute_expected_change_percent(&inputs)?),
                )
            }
            None => (None, None),
        };

    Ok(StatResult {
        beta,
        annualized_volatility,
        correlation,
        expected_change_absolute,
        expected_change_percent,
        last_price,
        market_value: last_price * f64::from(holding.quantity),
        observations: stock_aligned.len(),
    })
}
