//! Return/risk statistics: beta, annualized volatility, correlation, and the
//! expected price change projection.
//!
//! Numeric conventions match the reference computations this tool replaced:
//! - beta divides the *sample* covariance of adjusted-close levels by the
//!   *population* variance of the benchmark levels;
//! - volatility uses the population standard deviation of daily returns.

use serde::Serialize;

use crate::error::StatsError;
use crate::series::{PriceSeries, ReturnSeries};

/// Trading days per year used to annualize daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sum of squared deviations from the mean.
fn sum_sq_dev(values: &[f64], mean: f64) -> f64 {
    values.iter().map(|v| (v - mean).powi(2)).sum()
}

/// Sum of cross products of deviations.
fn sum_cross_dev(x: &[f64], y: &[f64], mean_x: f64, mean_y: f64) -> f64 {
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| (a - mean_x) * (b - mean_y))
        .sum()
}

/// Keep only positions where both values are finite.
fn finite_pairs(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .unzip()
}

/// Beta of a stock against the benchmark, on raw adjusted-close levels.
///
/// Both series must cover identical dates. This is a price-level beta, not the
/// conventional return-based one; it is kept for compatibility with existing
/// reports.
pub fn compute_beta(
    stock_prices: &PriceSeries,
    benchmark_prices: &PriceSeries,
) -> Result<f64, StatsError> {
    if !stock_prices.same_dates(benchmark_prices) {
        return Err(StatsError::MisalignedSeries(format!(
            "{} has {} price points, {} has {} (or dates differ)",
            stock_prices.symbol(),
            stock_prices.len(),
            benchmark_prices.symbol(),
            benchmark_prices.len()
        )));
    }

    let (stock, bench) = finite_pairs(&stock_prices.closes(), &benchmark_prices.closes());
    if stock.len() < 2 {
        return Err(StatsError::InsufficientData {
            required: 2,
            actual: stock.len(),
        });
    }

    let n = stock.len() as f64;
    let mean_s = mean(&stock);
    let mean_b = mean(&bench);
    let covariance = sum_cross_dev(&stock, &bench, mean_s, mean_b) / (n - 1.0);
    let bench_variance = sum_sq_dev(&bench, mean_b) / n;

    if bench_variance == 0.0 {
        return Err(StatsError::DegenerateInput(format!(
            "benchmark {} price is constant over the window",
            benchmark_prices.symbol()
        )));
    }

    Ok(covariance / bench_variance)
}

/// Annualized volatility: population standard deviation of defined daily
/// returns times sqrt(252).
pub fn compute_annualized_volatility(returns: &ReturnSeries) -> Result<f64, StatsError> {
    let values = returns.defined_values();
    if values.len() < 2 {
        return Err(StatsError::InsufficientData {
            required: 2,
            actual: values.len(),
        });
    }

    let m = mean(&values);
    let std_dev = (sum_sq_dev(&values, m) / values.len() as f64).sqrt();
    Ok(std_dev * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Pearson correlation between two date-aligned return series.
pub fn compute_correlation(
    stock_returns: &ReturnSeries,
    benchmark_returns: &ReturnSeries,
) -> Result<f64, StatsError> {
    if !stock_returns.same_dates(benchmark_returns) {
        return Err(StatsError::MisalignedSeries(format!(
            "{} has {} returns, {} has {} (or dates differ)",
            stock_returns.symbol(),
            stock_returns.len(),
            benchmark_returns.symbol(),
            benchmark_returns.len()
        )));
    }

    let (x, y) = finite_pairs(&stock_returns.values(), &benchmark_returns.values());
    if x.len() < 2 {
        return Err(StatsError::InsufficientData {
            required: 2,
            actual: x.len(),
        });
    }

    let mean_x = mean(&x);
    let mean_y = mean(&y);
    let var_x = sum_sq_dev(&x, mean_x);
    let var_y = sum_sq_dev(&y, mean_y);
    if var_x == 0.0 || var_y == 0.0 {
        let constant = if var_x == 0.0 {
            stock_returns.symbol()
        } else {
            benchmark_returns.symbol()
        };
        return Err(StatsError::DegenerateInput(format!(
            "{} returns have zero variance",
            constant
        )));
    }

    let r = sum_cross_dev(&x, &y, mean_x, mean_y) / (var_x * var_y).sqrt();
    Ok(r.clamp(-1.0, 1.0))
}

/// Inputs to the expected price change heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpectedChangeInputs {
    pub last_stock_price: f64,
    pub beta: f64,
    pub volatility: f64,
    pub correlation: f64,
    pub hypothetical_index_level: f64,
    pub last_index_price: f64,
}

impl ExpectedChangeInputs {
    /// Fractional index move implied by the hypothetical level.
    pub fn index_change_fraction(&self) -> Result<f64, StatsError> {
        if self.last_index_price == 0.0 || !self.last_index_price.is_finite() {
            return Err(StatsError::DegenerateInput(format!(
                "last index price must be a non-zero number, got {}",
                self.last_index_price
            )));
        }
        Ok(self.hypothetical_index_level / self.last_index_price - 1.0)
    }

    /// `beta * index_change + volatility * correlation`.
    pub fn stock_change_fraction(&self) -> Result<f64, StatsError> {
        let index_change = self.index_change_fraction()?;
        Ok(self.beta * index_change + self.volatility * self.correlation)
    }
}

/// Expected change in currency units: `last_stock_price * stock_change_fraction`.
pub fn compute_expected_change_absolute(inputs: &ExpectedChangeInputs) -> Result<f64, StatsError> {
    Ok(inputs.last_stock_price * inputs.stock_change_fraction()?)
}

/// Expected change as a percentage of the current price, independent of its
/// currency scale.
pub fn compute_expected_change_percent(inputs: &ExpectedChangeInputs) -> Result<f64, StatsError> {
    Ok(inputs.stock_change_fraction()? * 100.0)
}
