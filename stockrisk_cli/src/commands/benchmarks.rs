//! The `benchmarks` subcommand: lists the built-in benchmark aliases.

use anyhow::Result;
use stockrisk_lib::load_benchmark_aliases;

use crate::output::{
    print_benchmarks_csv, print_benchmarks_markdown, print_benchmarks_table,
    print_benchmarks_xml, print_json, OutputFormat,
};

pub fn run(format: &OutputFormat) -> Result<()> {
    let aliases = load_benchmark_aliases()?;

    match format {
        OutputFormat::Table => print_benchmarks_table(&aliases),
        OutputFormat::Json => print_json(&aliases),
        OutputFormat::Csv => print_benchmarks_csv(&aliases)?,
        OutputFormat::Markdown => print_benchmarks_markdown(&aliases),
        OutputFormat::Xml => print_benchmarks_xml(&aliases)?,
    }

    Ok(())
}
