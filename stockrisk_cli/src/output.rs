use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::Serialize;
use stockrisk_lib::{derive_returns, AnalysisReport, BenchmarkAlias, PriceSeries, TickerOutcome};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::xml_output;

#[derive(Clone, Debug, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
    Xml,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "markdown" | "md" => Ok(Self::Markdown),
            "xml" => Ok(Self::Xml),
            other => bail!(
                "unknown output format '{}'. Use table, json, csv, markdown or xml",
                other
            ),
        }
    }
}

#[derive(Tabled, Serialize)]
struct HoldingRow {
    #[tabled(rename = "Ticker")]
    #[serde(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Qty")]
    #[serde(rename = "Qty")]
    quantity: u32,
    #[tabled(rename = "Last Price")]
    #[serde(rename = "Last Price")]
    last_price: String,
    #[tabled(rename = "Market Value")]
    #[serde(rename = "Market Value")]
    market_value: String,
    #[tabled(rename = "Beta")]
    #[serde(rename = "Beta")]
    beta: String,
    #[tabled(rename = "Volatility")]
    #[serde(rename = "Volatility")]
    volatility: String,
    #[tabled(rename = "Correlation")]
    #[serde(rename = "Correlation")]
    correlation: String,
    #[tabled(rename = "Exp. Change")]
    #[serde(rename = "Exp. Change")]
    expected_change: String,
    #[tabled(rename = "Exp. Change %")]
    #[serde(rename = "Exp. Change %")]
    expected_change_pct: String,
    #[tabled(rename = "Status")]
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Tabled, Serialize)]
struct CorrelationRow {
    #[tabled(rename = "Ticker")]
    #[serde(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Correlation")]
    #[serde(rename = "Correlation")]
    correlation: String,
}

#[derive(Tabled, Serialize)]
struct PriceRow {
    #[tabled(rename = "Date")]
    #[serde(rename = "Date")]
    date: String,
    #[tabled(rename = "Adj Close")]
    #[serde(rename = "Adj Close")]
    adj_close: String,
    #[tabled(rename = "Daily Return")]
    #[serde(rename = "Daily Return")]
    daily_return: String,
}

#[derive(Tabled, Serialize)]
struct BenchmarkRow {
    #[tabled(rename = "Alias")]
    #[serde(rename = "Alias")]
    alias: String,
    #[tabled(rename = "Symbol")]
    #[serde(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
}

/// One dated close with the return into that date, for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistoryEntry {
    pub date: NaiveDate,
    pub adj_close: f64,
    pub daily_return: Option<f64>,
}

/// Pair each close with the return ending on its date. The first date has
/// no return; undefined returns are `None`. A single-session series keeps
/// its close with an empty return column.
pub fn price_history(prices: &PriceSeries) -> Vec<PriceHistoryEntry> {
    let returns = derive_returns(prices).ok();
    prices
        .points()
        .iter()
        .enumerate()
        .map(|(i, p)| PriceHistoryEntry {
            date: p.date,
            adj_close: p.adj_close,
            daily_return: i
                .checked_sub(1)
                .zip(returns.as_ref())
                .and_then(|(j, r)| r.points().get(j))
                .filter(|r| r.is_defined())
                .map(|r| r.value),
        })
        .collect()
}

// -- Row builders --

fn build_holding_rows(report: &AnalysisReport) -> Vec<HoldingRow> {
    report
        .holdings
        .iter()
        .map(|h| match &h.outcome {
            TickerOutcome::Stats(s) => HoldingRow {
                ticker: h.symbol.clone(),
                quantity: h.quantity,
                last_price: format_number(s.last_price, 2),
                market_value: format_number(s.market_value, 2),
                beta: format_number(s.beta, 4),
                volatility: format_number(s.annualized_volatility, 4),
                correlation: format_number(s.correlation, 4),
                expected_change: format_optional(s.expected_change_absolute, 2),
                expected_change_pct: s
                    .expected_change_percent
                    .map(format_percent)
                    .unwrap_or_else(|| "-".to_string()),
                status: "ok".to_string(),
            },
            TickerOutcome::Error(f) => HoldingRow {
                ticker: h.symbol.clone(),
                quantity: h.quantity,
                last_price: "-".to_string(),
                market_value: "-".to_string(),
                beta: "-".to_string(),
                volatility: "-".to_string(),
                correlation: "-".to_string(),
                expected_change: "-".to_string(),
                expected_change_pct: "-".to_string(),
                status: f.kind.label().to_string(),
            },
        })
        .collect()
}

fn build_correlation_rows(report: &AnalysisReport) -> Vec<CorrelationRow> {
    report
        .correlation_table
        .iter()
        .map(|c| CorrelationRow {
            ticker: c.symbol.clone(),
            correlation: format_optional(c.correlation, 4),
        })
        .collect()
}

fn build_price_rows(entries: &[PriceHistoryEntry]) -> Vec<PriceRow> {
    entries
        .iter()
        .map(|e| PriceRow {
            date: e.date.to_string(),
            adj_close: format_number(e.adj_close, 2),
            daily_return: e
                .daily_return
                .map(|r| format_percent(r * 100.0))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect()
}

fn build_benchmark_rows(aliases: &[BenchmarkAlias]) -> Vec<BenchmarkRow> {
    aliases
        .iter()
        .map(|a| BenchmarkRow {
            alias: a.alias.clone(),
            symbol: a.symbol.clone(),
            name: a.name.clone(),
        })
        .collect()
}

/// Header lines describing the benchmark and window.
fn report_summary(report: &AnalysisReport) -> Vec<String> {
    let b = &report.benchmark;
    let mut lines = vec![format!(
        "Benchmark {}: last close {} over {} sessions ({} to {}, end exclusive)",
        b.symbol,
        format_number(b.last_close, 2),
        b.observations,
        report.window.start,
        report.window.end
    )];
    if let (Some(level), Some(change)) = (b.hypothetical_level, b.index_change_pct) {
        lines.push(format!(
            "Hypothetical next close {} ({} vs last close)",
            format_number(level, 2),
            format_percent(change)
        ));
    }
    lines
}

/// Failure details for holdings without statistics.
fn report_notes(report: &AnalysisReport) -> Vec<String> {
    report
        .holdings
        .iter()
        .filter_map(|h| h.failure().map(|f| format!("{}: {}", h.symbol, f.message)))
        .collect()
}

fn report_footer(report: &AnalysisReport) -> String {
    format!(
        "Total market value: {} ({} analysed, {} failed)",
        format_number(report.total_market_value, 2),
        report.succeeded(),
        report.failed()
    )
}

fn render_report(report: &AnalysisReport, style_markdown: bool) -> String {
    let mut holdings = Table::new(build_holding_rows(report));
    let mut correlations = Table::new(build_correlation_rows(report));
    if style_markdown {
        holdings.with(Style::markdown());
        correlations.with(Style::markdown());
    }

    let mut out = report_summary(report).join("\n");
    out.push_str("\n\n");
    out.push_str(&holdings.to_string());
    out.push_str("\n\nCorrelation with benchmark\n\n");
    out.push_str(&correlations.to_string());
    out.push_str("\n\n");
    out.push_str(&report_footer(report));
    let notes = report_notes(report);
    if !notes.is_empty() {
        out.push_str("\n\n");
        out.push_str(&notes.join("\n"));
    }
    out
}

// -- Report output --

pub fn print_report_table(report: &AnalysisReport) {
    println!("{}", render_report(report, false));
}

pub fn print_report_markdown(report: &AnalysisReport) {
    println!("{}", render_report(report, true));
}

pub fn print_report_csv(report: &AnalysisReport) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for row in build_holding_rows(report) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_report_xml(report: &AnalysisReport) -> Result<()> {
    println!("{}", xml_output::report_to_xml(report)?);
    Ok(())
}

// -- Price history output --

pub fn print_prices_table(entries: &[PriceHistoryEntry]) {
    println!("{}", Table::new(build_price_rows(entries)));
}

pub fn print_prices_markdown(entries: &[PriceHistoryEntry]) {
    let mut table = Table::new(build_price_rows(entries));
    table.with(Style::markdown());
    println!("{}", table);
}

pub fn print_prices_csv(entries: &[PriceHistoryEntry]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for row in build_price_rows(entries) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_prices_xml(entries: &[PriceHistoryEntry]) -> Result<()> {
    println!("{}", xml_output::prices_to_xml(entries)?);
    Ok(())
}

// -- Benchmark alias output --

pub fn print_benchmarks_table(aliases: &[BenchmarkAlias]) {
    println!("{}", Table::new(build_benchmark_rows(aliases)));
}

pub fn print_benchmarks_markdown(aliases: &[BenchmarkAlias]) {
    let mut table = Table::new(build_benchmark_rows(aliases));
    table.with(Style::markdown());
    println!("{}", table);
}

pub fn print_benchmarks_csv(aliases: &[BenchmarkAlias]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for row in build_benchmark_rows(aliases) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_benchmarks_xml(aliases: &[BenchmarkAlias]) -> Result<()> {
    println!("{}", xml_output::benchmarks_to_xml(aliases)?);
    Ok(())
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

fn format_number(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{:.*}", decimals, value)
    } else {
        "-".to_string()
    }
}

fn format_optional(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format_number(v, decimals))
        .unwrap_or_else(|| "-".to_string())
}

fn format_percent(value: f64) -> String {
    if value.is_finite() {
        format!("{:+.2}%", value)
    } else {
        "-".to_string()
    }
}
