//! The price fetch contract and source combinators.
//!
//! [`PriceSource`] is the only seam between the statistics core and the
//! network. Concrete sources live in [`crate::yahoo`] and [`crate::tiingo`];
//! this module adds fallback and rate-limit retry wrappers.

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use thiserror::Error;

use crate::series::{DateRange, PriceSeries};

/// Errors from price data providers.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Rate limited by {0}")]
    RateLimited(String),
    #[error("Ticker not found: {0}")]
    NotFound(String),
    #[error("No price data for {0} in the requested window")]
    NoData(String),
    #[error("Invalid API key (HTTP 401)")]
    InvalidApiKey,
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Request failed with status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    Parse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl FetchError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Something that can return daily adjusted closes for a symbol.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    async fn fetch(&self, symbol: &str, range: DateRange) -> Result<PriceSeries, FetchError>;
}

#[async_trait]
impl<S: PriceSource + ?Sized> PriceSource for std::sync::Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch(&self, symbol: &str, range: DateRange) -> Result<PriceSeries, FetchError> {
        (**self).fetch(symbol, range).await
    }
}

#[async_trait]
impl<S: PriceSource + ?Sized> PriceSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch(&self, symbol: &str, range: DateRange) -> Result<PriceSeries, FetchError> {
        (**self).fetch(symbol, range).await
    }
}

/// Tries `primary`, then `secondary` if the primary fails for any reason.
pub struct FallbackSource {
    primary: Box<dyn PriceSource>,
    secondary: Box<dyn PriceSource>,
    name: String,
}

impl FallbackSource {
    pub fn new(primary: Box<dyn PriceSource>, secondary: Box<dyn PriceSource>) -> Self {
        let name = format!("{}+{}", primary.name(), secondary.name());
        Self {
            primary,
            secondary,
            name,
        }
    }
}

#[async_trait]
impl PriceSource for FallbackSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, symbol: &str, range: DateRange) -> Result<PriceSeries, FetchError> {
        match self.primary.fetch(symbol, range).await {
            Ok(series) => Ok(series),
            Err(primary_err) => {
                tracing::info!(
                    "{} failed for {} ({}), trying {}",
                    self.primary.name(),
                    symbol,
                    primary_err,
                    self.secondary.name()
                );
                self.secondary.fetch(symbol, range).await.map_err(|e| {
                    tracing::warn!(
                        "{} also failed for {}: {}",
                        self.secondary.name(),
                        symbol,
                        e
                    );
                    e
                })
            }
        }
    }
}

/// Retries rate-limited fetches with jittered exponential backoff.
/// Any other error is returned immediately.
pub struct RetryingSource<S> {
    inner: S,
    max_retries: u32,
    base_delay: Duration,
}

impl<S: PriceSource> RetryingSource<S> {
    pub fn new(inner: S, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            base_delay: Duration::from_millis(500),
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let jitter_ms = rand::thread_rng().gen_range(0..=self.base_delay.as_millis() as u64);
        exp + Duration::from_millis(jitter_ms)
    }
}

#[async_trait]
impl<S: PriceSource> PriceSource for RetryingSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self, symbol: &str, range: DateRange) -> Result<PriceSeries, FetchError> {
        let mut attempt = 0;
        loop {
            match self.inner.fetch(symbol, range).await {
                Err(e) if e.is_rate_limited() && attempt < self.max_retries => {
                    let delay = self.backoff(attempt);
                    tracing::info!(
                        "{} on {}, retrying in {:?} ({}/{})",
                        e,
                        symbol,
                        delay,
                        attempt + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
