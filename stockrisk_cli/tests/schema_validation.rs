use chrono::{Duration, NaiveDate};
use serde_json::Value;
use std::path::{Path, PathBuf};
use stockrisk_lib::{
    build_report, AnalysisRequest, BenchmarkContext, FetchedHolding, Holding, Portfolio,
    PricePoint, PriceSeries, StatsError,
};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("CLI crate should be inside workspace")
        .to_path_buf()
}

fn load_fixture(name: &str) -> Value {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read fixture {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("fixture is valid JSON")
}

fn load_schema(name: &str) -> Value {
    let path = workspace_root().join("schema").join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read schema {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("schema is valid JSON")
}

fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
    let base = NaiveDate::from_ymd_opt(2023, 3, 20).unwrap();
    let points = closes
        .iter()
        .enumerate()
        .map(|(i, c)| PricePoint::new(base + Duration::days(i as i64), *c))
        .collect();
    PriceSeries::new(symbol, points).unwrap()
}

/// A report produced by the library, serialized the way `--output json` does.
fn generated_report(level: Option<f64>) -> Value {
    let portfolio = Portfolio::from_entries([("TCS.NS", 10), ("FLAT", 2), ("GONE", 1)]).unwrap();
    let request = AnalysisRequest::new(portfolio).with_hypothetical_index_level(level);
    let benchmark =
        BenchmarkContext::new(series("^NSEI", &[100.0, 102.0, 99.0, 105.0]), level).unwrap();
    let fetched = vec![
        FetchedHolding {
            holding: Holding::new("TCS.NS", 10).unwrap(),
            prices: Ok(series("TCS.NS", &[10.0, 11.0, 9.0, 12.0])),
        },
        FetchedHolding {
            holding: Holding::new("FLAT", 2).unwrap(),
            prices: Ok(series("FLAT", &[5.0, 5.0, 5.0, 5.0])),
        },
        FetchedHolding {
            holding: Holding::new("GONE", 1).unwrap(),
            prices: Err(StatsError::DataUnavailable {
                symbol: "GONE".to_string(),
                reason: "Ticker not found: GONE".to_string(),
            }),
        },
    ];
    let report = build_report(&request, &benchmark, &fetched);
    let text = serde_json::to_string_pretty(&report).expect("report serializes");
    serde_json::from_str(&text).expect("report JSON parses")
}

// ---------------------------------------------------------------------------
// Positive validation
// ---------------------------------------------------------------------------

#[test]
fn test_report_fixture_conforms_to_schema() {
    let fixture = load_fixture("report.json");
    let schema = load_schema("report.schema.json");

    let validator = jsonschema::draft202012::new(&schema).expect("report schema compiles");
    let result = validator.validate(&fixture);
    if let Err(e) = &result {
        panic!("report fixture failed validation: {e}");
    }
}

#[test]
fn test_generated_report_conforms_to_schema() {
    let schema = load_schema("report.schema.json");
    let validator = jsonschema::draft202012::new(&schema).expect("report schema compiles");

    for level in [None, Some(110.25)] {
        let report = generated_report(level);
        if let Err(e) = validator.validate(&report) {
            panic!("generated report (level {:?}) failed validation: {e}", level);
        }
    }
}

#[test]
fn test_generated_report_marks_failures() {
    let report = generated_report(None);
    assert_eq!(report["holdings"][1]["error"]["kind"], "degenerate_input");
    assert_eq!(report["holdings"][2]["error"]["kind"], "data_unavailable");
    assert!(report["holdings"][0]["stats"].is_object());
}

// ---------------------------------------------------------------------------
// Negative validation: schema rejects invalid data
// ---------------------------------------------------------------------------

#[test]
fn test_schema_rejects_missing_required_field() {
    let mut fixture = load_fixture("report.json");
    fixture
        .as_object_mut()
        .expect("report is an object")
        .remove("benchmark");

    let schema = load_schema("report.schema.json");
    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(
        validator.validate(&fixture).is_err(),
        "schema should reject report missing benchmark"
    );
}

#[test]
fn test_schema_rejects_holding_with_stats_and_error() {
    let mut fixture = load_fixture("report.json");
    let error = fixture["holdings"][1]["error"].clone();
    fixture["holdings"][0]
        .as_object_mut()
        .expect("holding is an object")
        .insert("error".to_string(), error);

    let schema = load_schema("report.schema.json");
    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(
        validator.validate(&fixture).is_err(),
        "schema should reject a holding with both stats and error"
    );
}

#[test]
fn test_schema_rejects_unknown_failure_kind() {
    let mut fixture = load_fixture("report.json");
    fixture["holdings"][1]["error"]["kind"] = Value::String("timeout".to_string());

    let schema = load_schema("report.schema.json");
    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(validator.validate(&fixture).is_err());
}

#[test]
fn test_schema_rejects_out_of_range_correlation() {
    let mut fixture = load_fixture("report.json");
    fixture["correlation_table"][0]["correlation"] = serde_json::json!(1.5);

    let schema = load_schema("report.schema.json");
    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(validator.validate(&fixture).is_err());
}

#[test]
fn test_schema_rejects_zero_quantity() {
    let mut fixture = load_fixture("report.json");
    fixture["holdings"][0]["quantity"] = serde_json::json!(0);

    let schema = load_schema("report.schema.json");
    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(validator.validate(&fixture).is_err());
}
