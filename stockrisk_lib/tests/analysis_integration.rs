use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stockrisk_lib::stats::{
    compute_expected_change_absolute, compute_expected_change_percent, ExpectedChangeInputs,
};
use stockrisk_lib::{
    analyze, AlignmentPolicy, AnalysisRequest, CachedSource, DateRange, FailureKind, FetchError,
    Portfolio, PricePoint, PriceSeries, PriceSource, RetryingSource, StatsError,
};

/// In-memory source. Symbols listed in `rate_limited` fail with a rate limit
/// the first time they are fetched.
struct MemorySource {
    series: HashMap<String, PriceSeries>,
    rate_limited: Vec<String>,
    calls: AtomicUsize,
    per_symbol: std::sync::Mutex<HashMap<String, usize>>,
}

impl MemorySource {
    fn new(series: Vec<PriceSeries>) -> Self {
        Self {
            series: series
                .into_iter()
                .map(|s| (s.symbol().to_string(), s))
                .collect(),
            rate_limited: Vec::new(),
            calls: AtomicUsize::new(0),
            per_symbol: std::sync::Mutex::new(HashMap::new()),
        }
    }

    fn rate_limit_once(mut self, symbol: &str) -> Self {
        self.rate_limited.push(symbol.to_string());
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, symbol: &str, _range: DateRange) -> Result<PriceSeries, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let attempt = {
            let mut seen = self.per_symbol.lock().unwrap();
            let n = seen.entry(symbol.to_string()).or_insert(0);
            *n += 1;
            *n
        };
        if attempt == 1 && self.rate_limited.iter().any(|s| s == symbol) {
            return Err(FetchError::RateLimited("memory".to_string()));
        }
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(symbol.to_string()))
    }
}

fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
    let base = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
    let points = closes
        .iter()
        .enumerate()
        .map(|(i, c)| PricePoint::new(base + Duration::days(i as i64), *c))
        .collect();
    PriceSeries::new(symbol, points).unwrap()
}

fn portfolio(entries: &[(&str, u32)]) -> Portfolio {
    Portfolio::from_entries(entries.iter().copied()).unwrap()
}

#[tokio::test]
async fn partial_failure_keeps_reachable_ticker() {
    let source = Arc::new(MemorySource::new(vec![
        series("^NSEI", &[100.0, 102.0, 99.0, 105.0]),
        series("TCS.NS", &[10.0, 11.0, 9.0, 12.0]),
    ]));
    let request = AnalysisRequest::new(portfolio(&[("DELISTED.NS", 3), ("TCS.NS", 10)]));

    let report = analyze(source, &request, |_, _| {}).await.unwrap();

    assert_eq!(report.holdings.len(), 2);
    let failure = report.holdings[0].failure().unwrap();
    assert_eq!(failure.kind, FailureKind::DataUnavailable);
    assert!(failure.message.contains("DELISTED.NS"));

    let stats = report.holdings[1].stats().unwrap();
    assert!((stats.beta - 0.634920634920635).abs() < 1e-6);
    assert!((stats.market_value - 120.0).abs() < 1e-9);
    assert!((report.total_market_value - 120.0).abs() < 1e-9);
}

#[tokio::test]
async fn volatility_matches_reference_computation() {
    let source = Arc::new(MemorySource::new(vec![
        series("^GSPC", &[4000.0, 4040.0, 3990.0, 4100.0]),
        series("AAPL", &[100.0, 102.0, 101.0, 105.0]),
    ]));
    let request = AnalysisRequest::new(portfolio(&[("AAPL", 1)])).with_benchmark("^GSPC");

    let report = analyze(source, &request, |_, _| {}).await.unwrap();

    let stats = report.holdings[0].stats().unwrap();
    assert!((stats.annualized_volatility - 0.32246608894697754).abs() < 1e-9);
    assert_eq!(report.benchmark.symbol, "^GSPC");
    assert_eq!(report.benchmark.observations, 4);
}

#[tokio::test]
async fn expected_change_scenario() {
    let inputs = ExpectedChangeInputs {
        last_stock_price: 50.0,
        beta: 1.2,
        volatility: 0.25,
        correlation: 0.8,
        hypothetical_index_level: 21000.0,
        last_index_price: 20000.0,
    };
    assert!((inputs.index_change_fraction().unwrap() - 0.05).abs() < 1e-12);
    assert!((compute_expected_change_absolute(&inputs).unwrap() - 13.0).abs() < 1e-9);
    assert!((compute_expected_change_percent(&inputs).unwrap() - 26.0).abs() < 1e-9);
}

#[tokio::test]
async fn benchmark_unreachable_fails_run() {
    let source = Arc::new(MemorySource::new(vec![series("TCS.NS", &[10.0, 11.0, 9.0])]));
    let request = AnalysisRequest::new(portfolio(&[("TCS.NS", 1)]));

    let err = analyze(source, &request, |_, _| {}).await.unwrap_err();
    assert!(matches!(err, StatsError::DataUnavailable { symbol, .. } if symbol == "^NSEI"));
}

#[tokio::test]
async fn progress_callback_sees_every_holding() {
    let source = Arc::new(MemorySource::new(vec![
        series("^NSEI", &[100.0, 102.0, 99.0, 105.0]),
        series("A", &[10.0, 11.0, 9.0, 12.0]),
        series("B", &[20.0, 21.0, 19.0, 23.0]),
    ]));
    let request = AnalysisRequest::new(portfolio(&[("A", 1), ("B", 1), ("C", 1)]));

    let mut seen: Vec<(String, bool)> = Vec::new();
    analyze(source, &request, |symbol, ok| seen.push((symbol.to_string(), ok)))
        .await
        .unwrap();

    seen.sort();
    assert_eq!(
        seen,
        vec![
            ("A".to_string(), true),
            ("B".to_string(), true),
            ("C".to_string(), false),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn retry_and_cache_stack_feeds_analysis() {
    let memory = Arc::new(
        MemorySource::new(vec![
            series("^NSEI", &[100.0, 102.0, 99.0, 105.0]),
            series("INFY.NS", &[10.0, 11.0, 9.0, 12.0]),
        ])
        .rate_limit_once("INFY.NS"),
    );
    let retrying = RetryingSource::new(Arc::clone(&memory), 2)
        .with_base_delay(std::time::Duration::from_millis(5));
    let cached = Arc::new(CachedSource::new(retrying, std::time::Duration::from_secs(60)));
    let request = AnalysisRequest::new(portfolio(&[("INFY.NS", 2)]));

    let first = analyze(cached.clone(), &request, |_, _| {}).await.unwrap();
    assert!(first.holdings[0].stats().is_some());
    // benchmark + rate-limited attempt + retry
    assert_eq!(memory.calls(), 3);

    let second = analyze(cached, &request, |_, _| {}).await.unwrap();
    assert_eq!(memory.calls(), 3);
    assert_eq!(first, second);
}

#[tokio::test]
async fn strict_alignment_flags_calendar_mismatch() {
    let bench = series("^NSEI", &[100.0, 102.0, 99.0, 105.0, 106.0]);
    // listed on an exchange closed on the third day
    let base = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
    let stock = PriceSeries::new(
        "AAPL",
        vec![
            PricePoint::new(base, 10.0),
            PricePoint::new(base + Duration::days(1), 11.0),
            PricePoint::new(base + Duration::days(3), 12.0),
            PricePoint::new(base + Duration::days(4), 11.5),
        ],
    )
    .unwrap();
    let source = Arc::new(MemorySource::new(vec![bench, stock]));
    let base_request = AnalysisRequest::new(portfolio(&[("AAPL", 1)]));

    let strict = analyze(
        source.clone(),
        &base_request.clone().with_alignment(AlignmentPolicy::Strict),
        |_, _| {},
    )
    .await
    .unwrap();
    assert_eq!(
        strict.holdings[0].failure().unwrap().kind,
        FailureKind::MisalignedSeries
    );

    let common = analyze(source, &base_request, |_, _| {}).await.unwrap();
    assert_eq!(common.holdings[0].stats().unwrap().observations, 4);
}

#[tokio::test]
async fn report_serializes_with_markers() {
    let source = Arc::new(MemorySource::new(vec![
        series("^NSEI", &[100.0, 102.0, 99.0, 105.0]),
        series("TCS.NS", &[10.0, 11.0, 9.0, 12.0]),
    ]));
    let request = AnalysisRequest::new(portfolio(&[("TCS.NS", 1), ("GONE", 1)]))
        .with_hypothetical_index_level(Some(110.25));

    let report = analyze(source, &request, |_, _| {}).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["window"]["start"], "2023-03-19");
    assert_eq!(json["alignment"], "common_dates");
    assert!(json["holdings"][0]["stats"]["expected_change_percent"].is_number());
    assert_eq!(json["holdings"][1]["error"]["kind"], "data_unavailable");
    assert!(json["correlation_table"][1]["correlation"].is_null());
    assert!((json["benchmark"]["index_change_pct"].as_f64().unwrap() - 5.0).abs() < 1e-9);
}
