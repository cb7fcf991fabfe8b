//! race-summarize - pool simulation run records into grouped statistics.
//!
//! Reads one or more results files (each a JSON list of run records),
//! flattens them into per-agent observations, and writes a
//! `race_summary_v1` document.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};

use race_core::{
    flatten_records, load_all, obs, parse_group_by, render_summary_row, summarize,
    write_summary_json, GateSpan, JsonFileSource, MetricReporting, MetricSpec, RunRecordSource,
    SummarizeConfig, METRICS,
};

#[derive(Parser)]
#[command(name = "race-summarize")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Aggregate race run records into a grouped summary", long_about = None)]
struct Cli {
    /// Results file holding a JSON list of run records (repeatable)
    #[arg(long = "results-file", required = true)]
    results_files: Vec<PathBuf>,

    /// Metric to pool: literal key, dotted path, or `auto`
    #[arg(long, env = "RACE_METRIC", default_value = "auto")]
    metric: String,

    /// Comma-separated group-by fields
    #[arg(long, env = "RACE_GROUP_BY", default_value = "simulation,variant,agent")]
    group_by: String,

    /// Destination path for the summary JSON
    #[arg(long)]
    output: PathBuf,

    /// Suppress per-row narration
    #[arg(long)]
    quiet: bool,

    /// Record the concrete key `auto` resolved to instead of `auto`
    #[arg(long)]
    report_resolved_metric: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    race_core::init_tracing(cli.json, level);

    let _span = GateSpan::enter("summarize", &cli.output.display().to_string());

    let metric = MetricSpec::parse(&cli.metric).context("Invalid --metric")?;
    let group_by = parse_group_by(&cli.group_by).context("Invalid --group-by")?;
    let reporting = if cli.report_resolved_metric {
        MetricReporting::Concrete
    } else {
        MetricReporting::Configured
    };
    let config = SummarizeConfig::new(metric, group_by)?.with_reporting(reporting);

    let sources: Vec<Box<dyn RunRecordSource>> = cli
        .results_files
        .iter()
        .map(|path| Box::new(JsonFileSource::new(path)) as Box<dyn RunRecordSource>)
        .collect();
    let records = load_all(&sources)
        .await
        .context("Failed to load results files")?;
    info!(
        files = sources.len(),
        records = records.len(),
        "loaded run records"
    );

    let observations = flatten_records(&records);
    let outcome = summarize(&observations, &config).context("Failed to summarize results")?;
    let document = &outcome.document;

    if !cli.quiet {
        for row in &document.rows {
            println!("{}", render_summary_row(row));
        }
        println!(
            "Records scanned: {} (skipped for missing metric: {})",
            document.records_scanned, document.records_skipped_missing_metric
        );
        if outcome.skipped_missing_group > 0 {
            println!(
                "Skipped for missing group-by field: {}",
                outcome.skipped_missing_group
            );
        }
    }

    write_summary_json(&cli.output, document)
        .with_context(|| format!("Failed to write summary {:?}", cli.output))?;
    obs::emit_summary_written(
        &cli.output,
        document.rows.len(),
        document.records_scanned,
        document.records_skipped_missing_metric,
    );
    METRICS.flush();

    println!("Summary saved to {}", cli.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn results_file_is_repeatable() {
        let cli = Cli::try_parse_from([
            "race-summarize",
            "--results-file",
            "a.json",
            "--results-file",
            "b.json",
            "--output",
            "out.json",
        ])
        .expect("parse");
        assert_eq!(
            cli.results_files,
            vec![PathBuf::from("a.json"), PathBuf::from("b.json")]
        );
        assert!(!cli.quiet);
    }
}
