//! CLI subcommand implementations.

pub mod analyze;
pub mod benchmarks;
pub mod prices;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use stockrisk_lib::config::{AnalysisConfig, FetchConfig};
use stockrisk_lib::{
    validation, CachedSource, DateRange, FallbackSource, PriceSource, RetryingSource,
    TiingoClient, YahooClient,
};

/// Build the price source stack: Yahoo, optionally falling back to Tiingo,
/// with rate-limit retry and an in-process cache on top.
pub fn build_source(fetch: &FetchConfig, allow_fallback: bool) -> Result<Arc<dyn PriceSource>> {
    let yahoo = YahooClient::new()?;
    let tiingo_key = std::env::var("TIINGO_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty());

    let base: Box<dyn PriceSource> = match tiingo_key {
        Some(key) if fetch.tiingo_fallback && allow_fallback => {
            tracing::debug!("Tiingo fallback enabled");
            Box::new(FallbackSource::new(
                Box::new(yahoo),
                Box::new(TiingoClient::new(key)?),
            ))
        }
        _ => Box::new(yahoo),
    };

    let retrying = RetryingSource::new(base, fetch.max_retries);
    Ok(Arc::new(CachedSource::new(
        retrying,
        Duration::from_secs(fetch.cache_ttl_secs),
    )))
}

/// Window from `--start`/`--end`, falling back to config, then the default.
pub fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    config: &AnalysisConfig,
) -> Result<DateRange> {
    let configured = config.window()?;
    let start = match start {
        Some(s) => validation::parse_date(s)?,
        None => configured.start,
    };
    let end = match end {
        Some(s) => validation::parse_date(s)?,
        None => configured.end,
    };
    Ok(validation::validate_window(start, end)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn window_defaults_from_config() {
        let window = resolve_window(None, None, &AnalysisConfig::default()).unwrap();
        assert_eq!(window, DateRange::default());
    }

    #[test]
    fn window_flags_override_config() {
        let config = AnalysisConfig {
            start: NaiveDate::from_ymd_opt(2020, 1, 1),
            ..AnalysisConfig::default()
        };
        let window = resolve_window(None, Some("2021-01-01"), &config).unwrap();
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
    }

    #[test]
    fn window_rejects_inverted_or_bad_dates() {
        let config = AnalysisConfig::default();
        assert!(resolve_window(Some("2024-05-01"), Some("2024-01-01"), &config).is_err());
        assert!(resolve_window(Some("01/05/2024"), None, &config).is_err());
    }
}
