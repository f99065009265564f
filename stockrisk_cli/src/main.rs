mod commands;
mod output;
mod xml_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use stockrisk_lib::AppConfig;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "stockrisk")]
#[command(about = "Beta, volatility and correlation of stock holdings against a market index")]
struct Cli {
    /// Output format: table, json, csv, markdown, xml
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Config file (defaults to ./stockrisk.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a portfolio against a benchmark index
    Analyze(Box<commands::analyze::AnalyzeArgs>),
    /// Show adjusted closes and daily returns for one symbol
    Prices(commands::prices::PricesArgs),
    /// List built-in benchmark aliases
    Benchmarks,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("stockrisk=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let format = OutputFormat::parse(&cli.output)?;
    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    match &cli.command {
        Commands::Analyze(args) => commands::analyze::run(args.as_ref(), &config, &format).await?,
        Commands::Prices(args) => commands::prices::run(args, &config, &format).await?,
        Commands::Benchmarks => commands::benchmarks::run(&format)?,
    }

    Ok(())
}
