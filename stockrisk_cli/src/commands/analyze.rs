//! The `analyze` subcommand: beta, volatility and correlation for each holding
//! against a benchmark index.

use anyhow::{bail, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{BufRead, IsTerminal, Write};
use stockrisk_lib::{
    analyze, load_benchmark_aliases, resolve_benchmark, validation, AlignmentPolicy,
    AnalysisRequest, AppConfig, Holding, Portfolio,
};

use super::{build_source, resolve_window};
use crate::output::{
    print_json, print_report_csv, print_report_markdown, print_report_table, print_report_xml,
    OutputFormat,
};

/// Arguments for the `analyze` subcommand.
///
/// Quantities come from `--quantity`, then `--quantities`, then an
/// interactive prompt when stdin is a terminal.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Comma-separated ticker symbols (e.g., TCS.NS,INFY.NS)
    #[arg(long)]
    pub tickers: Option<String>,

    /// Holding as SYMBOL=QUANTITY (repeatable)
    #[arg(long = "quantity", value_name = "SYMBOL=QTY")]
    pub quantity: Vec<String>,

    /// Comma-separated quantities, in the same order as --tickers
    #[arg(long)]
    pub quantities: Option<String>,

    /// Hypothetical next closing level of the benchmark index
    #[arg(long)]
    pub next_index: Option<f64>,

    /// Benchmark alias (see `benchmarks`) or index symbol
    #[arg(long)]
    pub benchmark: Option<String>,

    /// Window start date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub start: Option<String>,

    /// Window end date (YYYY-MM-DD, exclusive)
    #[arg(long)]
    pub end: Option<String>,

    /// Require identical trading dates for stock and benchmark
    #[arg(long)]
    pub strict_dates: bool,

    /// Maximum concurrent price fetches
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Disable the Tiingo fallback source
    #[arg(long)]
    pub no_fallback: bool,
}

pub async fn run(args: &AnalyzeArgs, config: &AppConfig, format: &OutputFormat) -> Result<()> {
    let interactive = std::io::stdin().is_terminal();

    let specs = args
        .quantity
        .iter()
        .map(|s| validation::parse_holding_spec(s))
        .collect::<Result<Vec<_>, _>>()?;

    let tickers = match args.tickers.as_deref() {
        Some(list) => validation::parse_ticker_list(list)?,
        None if !specs.is_empty() => Vec::new(),
        None if interactive => validation::parse_ticker_list(&prompt_line(
            "Enter stock tickers (comma-separated): ",
        )?)?,
        None => bail!("no tickers given. Pass --tickers or --quantity SYMBOL=QTY"),
    };

    let positional = match args.quantities.as_deref() {
        Some(list) => Some(parse_quantity_list(list)?),
        None => None,
    };

    let portfolio = collect_portfolio(&tickers, &specs, positional.as_deref(), |symbol| {
        if interactive {
            prompt_quantity(symbol)
        } else {
            bail!(
                "missing quantity for {}. Pass --quantity {}=N",
                symbol,
                symbol
            )
        }
    })?;

    let window = resolve_window(args.start.as_deref(), args.end.as_deref(), &config.analysis)?;
    let aliases = load_benchmark_aliases()?;
    let benchmark = resolve_benchmark(
        args.benchmark.as_deref().unwrap_or(&config.analysis.benchmark),
        &aliases,
    )?;
    let next_index = args
        .next_index
        .map(validation::validate_index_level)
        .transpose()?;
    let alignment = if args.strict_dates {
        AlignmentPolicy::Strict
    } else {
        config.analysis.alignment
    };
    let concurrency = args.concurrency.unwrap_or(config.analysis.concurrency);
    if concurrency == 0 {
        bail!("--concurrency must be at least 1");
    }

    let request = AnalysisRequest::new(portfolio)
        .with_window(window)
        .with_benchmark(benchmark)
        .with_hypothetical_index_level(next_index)
        .with_alignment(alignment)
        .with_concurrency(concurrency);

    let source = build_source(&config.fetch, !args.no_fallback)?;

    eprintln!(
        "Analyzing {} holdings against {} ({} to {})",
        request.portfolio.len(),
        request.benchmark,
        window.start,
        window.end
    );

    let pb = ProgressBar::new(request.portfolio.len() as u64);
    pb.set_style(ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({eta}) {msg}",
    )?);
    pb.set_message("fetching prices...");

    let mut ok = 0usize;
    let mut failed = 0usize;
    let result = analyze(source, &request, |symbol, succeeded| {
        if succeeded {
            ok += 1;
        } else {
            failed += 1;
            pb.println(format!("  Warning: no price data for {}", symbol));
        }
        pb.set_message(format!("{} ok, {} err", ok, failed));
        pb.inc(1);
    })
    .await;
    pb.finish_and_clear();
    let report = result?;

    match format {
        OutputFormat::Table => print_report_table(&report),
        OutputFormat::Json => print_json(&report),
        OutputFormat::Csv => print_report_csv(&report)?,
        OutputFormat::Markdown => print_report_markdown(&report),
        OutputFormat::Xml => print_report_xml(&report)?,
    }

    Ok(())
}

/// Build the portfolio in ticker order. Each ticker takes its quantity from
/// `specs`, then `positional`, then `ask`. Symbols only named in `specs`
/// are appended after the ticker list. A repeated ticker keeps its first
/// position and its last quantity.
fn collect_portfolio<F>(
    tickers: &[String],
    specs: &[(String, u32)],
    positional: Option<&[u32]>,
    mut ask: F,
) -> Result<Portfolio>
where
    F: FnMut(&str) -> Result<u32>,
{
    if let Some(quantities) = positional {
        if quantities.len() != tickers.len() {
            bail!(
                "--quantities has {} values for {} tickers",
                quantities.len(),
                tickers.len()
            );
        }
    }

    let by_symbol: HashMap<&str, u32> = specs.iter().map(|(s, q)| (s.as_str(), *q)).collect();
    let mut portfolio = Portfolio::new();

    for (i, symbol) in tickers.iter().enumerate() {
        let quantity = match by_symbol.get(symbol.as_str()) {
            Some(q) => *q,
            None => match positional {
                Some(quantities) => quantities[i],
                None => ask(symbol)?,
            },
        };
        if let Some(previous) = portfolio.insert(Holding::new(symbol, quantity)?) {
            tracing::info!(
                "{} entered twice, quantity {} replaces {}",
                symbol,
                quantity,
                previous
            );
        }
    }

    for (symbol, quantity) in specs {
        if portfolio.get(symbol).is_none() {
            portfolio.insert(Holding::new(symbol, *quantity)?);
        }
    }

    if portfolio.is_empty() {
        bail!("portfolio is empty");
    }
    Ok(portfolio)
}

fn parse_quantity_list(input: &str) -> Result<Vec<u32>> {
    Ok(input
        .split(',')
        .map(validation::parse_quantity)
        .collect::<Result<Vec<_>, _>>()?)
}

fn prompt_line(prompt: &str) -> Result<String> {
    eprint!("{}", prompt);
    std::io::stderr().flush()?;
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        bail!("unexpected end of input");
    }
    Ok(line)
}

/// Ask until a positive integer is entered.
fn prompt_quantity(symbol: &str) -> Result<u32> {
    loop {
        let line = prompt_line(&format!("Enter quantity of {}: ", symbol))?;
        match validation::parse_quantity(&line) {
            Ok(quantity) => return Ok(quantity),
            Err(e) => eprintln!("  {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tickers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn entries(portfolio: &Portfolio) -> Vec<(String, u32)> {
        portfolio
            .iter()
            .map(|h| (h.symbol.clone(), h.quantity))
            .collect()
    }

    #[test]
    fn quantities_from_specs_then_prompt() {
        let specs = vec![("AAPL".to_string(), 10)];
        let mut asked = Vec::new();
        let portfolio = collect_portfolio(&tickers(&["AAPL", "GOOGL"]), &specs, None, |s| {
            asked.push(s.to_string());
            Ok(3)
        })
        .unwrap();

        assert_eq!(asked, vec!["GOOGL"]);
        assert_eq!(
            entries(&portfolio),
            vec![("AAPL".to_string(), 10), ("GOOGL".to_string(), 3)]
        );
    }

    #[test]
    fn positional_quantities_follow_ticker_order() {
        let portfolio = collect_portfolio(
            &tickers(&["TCS.NS", "INFY.NS"]),
            &[],
            Some(&[5, 7]),
            |_| bail!("should not prompt"),
        )
        .unwrap();
        assert_eq!(
            entries(&portfolio),
            vec![("TCS.NS".to_string(), 5), ("INFY.NS".to_string(), 7)]
        );
    }

    #[test]
    fn positional_length_mismatch_rejected() {
        let result = collect_portfolio(&tickers(&["A", "B"]), &[], Some(&[1]), |_| Ok(1));
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_ticker_keeps_first_position_last_quantity() {
        let portfolio = collect_portfolio(
            &tickers(&["AAPL", "MSFT", "AAPL"]),
            &[],
            Some(&[1, 2, 9]),
            |_| Ok(0),
        )
        .unwrap();
        assert_eq!(
            entries(&portfolio),
            vec![("AAPL".to_string(), 9), ("MSFT".to_string(), 2)]
        );
    }

    #[test]
    fn spec_only_symbols_are_appended() {
        let specs = vec![("SPY".to_string(), 4)];
        let portfolio =
            collect_portfolio(&tickers(&["AAPL"]), &specs, Some(&[1]), |_| Ok(0)).unwrap();
        assert_eq!(
            entries(&portfolio),
            vec![("AAPL".to_string(), 1), ("SPY".to_string(), 4)]
        );
    }

    #[test]
    fn missing_quantity_error_propagates() {
        let result = collect_portfolio(&tickers(&["AAPL"]), &[], None, |s| {
            bail!("missing quantity for {}", s)
        });
        assert!(result.unwrap_err().to_string().contains("AAPL"));
    }

    #[test]
    fn zero_quantity_rejected() {
        assert!(parse_quantity_list("1,0").is_err());
        assert_eq!(parse_quantity_list("1, 2").unwrap(), vec![1, 2]);
    }
}
