//! The `prices` subcommand: dated adjusted closes and daily returns for one
//! symbol, ready for charting.

use anyhow::Result;
use clap::Args;
use stockrisk_lib::{load_benchmark_aliases, resolve_benchmark, AppConfig, PriceSource};

use super::{build_source, resolve_window};
use crate::output::{
    price_history, print_json, print_prices_csv, print_prices_markdown, print_prices_table,
    print_prices_xml, OutputFormat,
};

/// Arguments for the `prices` subcommand.
#[derive(Args)]
pub struct PricesArgs {
    /// Ticker symbol or benchmark alias (e.g., TCS.NS, nifty50)
    pub symbol: String,

    /// Window start date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub start: Option<String>,

    /// Window end date (YYYY-MM-DD, exclusive)
    #[arg(long)]
    pub end: Option<String>,

    /// Disable the Tiingo fallback source
    #[arg(long)]
    pub no_fallback: bool,
}

pub async fn run(args: &PricesArgs, config: &AppConfig, format: &OutputFormat) -> Result<()> {
    let aliases = load_benchmark_aliases()?;
    let symbol = resolve_benchmark(&args.symbol, &aliases)?;
    let window = resolve_window(args.start.as_deref(), args.end.as_deref(), &config.analysis)?;

    let source = build_source(&config.fetch, !args.no_fallback)?;
    let prices = source.fetch(&symbol, window).await?;
    let history = price_history(&prices);

    eprintln!(
        "{}: {} sessions from {} to {}",
        symbol,
        history.len(),
        window.start,
        window.end
    );

    match format {
        OutputFormat::Table => print_prices_table(&history),
        OutputFormat::Json => print_json(&history),
        OutputFormat::Csv => print_prices_csv(&history)?,
        OutputFormat::Markdown => print_prices_markdown(&history),
        OutputFormat::Xml => print_prices_xml(&history)?,
    }

    Ok(())
}
