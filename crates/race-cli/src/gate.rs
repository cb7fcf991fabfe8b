//! race-gate - check a race summary against baseline thresholds.
//!
//! Exit status: 0 when every rule passes, 1 when any rule fails, 2 when an
//! input is missing or structurally invalid.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

use race_core::{
    obs, read_json_document, render_gate_report, resolve_against, run_gate,
    write_gate_report_json, BaselineDocument, GateReport, GateReportArtifact, GateSpan,
    JsonDocument, LoadedSummary, EXIT_FATAL, METRICS,
};

#[derive(Parser)]
#[command(name = "race-gate")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Gate a race summary against regression baselines", long_about = None)]
struct Cli {
    /// Summary JSON produced by race-summarize
    #[arg(long)]
    summary_file: PathBuf,

    /// Baseline rules JSON (regression_gate_v1)
    #[arg(long)]
    baseline_file: PathBuf,

    /// Root that relative paths are resolved against
    #[arg(long, env = "RACE_REPO_ROOT", default_value = ".")]
    repo_root: PathBuf,

    /// Also write a JSON gate report to this path
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    race_core::init_tracing(cli.json, level);

    match run(&cli) {
        Ok(report) => {
            METRICS.flush();
            ExitCode::from(report.exit_code() as u8)
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_FATAL as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<GateReport> {
    let summary_path = resolve_against(&cli.repo_root, &cli.summary_file);
    let baseline_path = resolve_against(&cli.repo_root, &cli.baseline_file);
    let _span = GateSpan::enter("gate", &baseline_path.display().to_string());

    let summary_doc = load_document(&summary_path)?;
    let summary = LoadedSummary::from_value(&summary_doc.value)
        .with_context(|| format!("Rejected summary {:?}", summary_path))?;

    let baseline_doc = load_document(&baseline_path)?;
    let baseline = BaselineDocument::from_value(&baseline_doc.value)
        .with_context(|| format!("Rejected baseline {:?}", baseline_path))?;

    let report = run_gate(&summary, &baseline);

    if let Some(path) = &cli.report_json {
        let path = resolve_against(&cli.repo_root, path);
        let artifact = GateReportArtifact::new(&report, &summary_doc.digest, &baseline_doc.digest);
        write_gate_report_json(&path, &artifact)
            .with_context(|| format!("Failed to write gate report {:?}", path))?;
    }

    print!("{}", render_gate_report(&report));
    Ok(report)
}

fn load_document(path: &Path) -> Result<JsonDocument> {
    read_json_document(path).map_err(|err| {
        obs::emit_fatal_input(path, &err);
        anyhow::Error::new(err)
    })
}
