/*
 * Dataflow CLI
 *
 * Runs the selected analyses over a program given as JSON IR.
 *
 * Usage:
 *   dataflow-cli program.json --analysis ifds-taint --analysis ide-taint
 *   dataflow-cli program.json --config analyses.yaml --output-dir out/
 *   dataflow-cli program.json -a none --output-dir out/   (ICFG only)
 */

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use codegraph_dataflow::features::export::to_json_string;
use codegraph_dataflow::pipeline::AnalysisKind;
use codegraph_dataflow::{AnalysisConfig, AnalysisController, DataflowError, Program, Result};

/// Run IFDS/IDE and monotone analyses over a program
#[derive(Debug, Parser)]
#[command(name = "dataflow-cli", rename_all = "kebab-case")]
struct Args {
    /// Program in JSON IR form
    #[arg(required_unless_present = "list")]
    program: Option<PathBuf>,

    /// YAML configuration; command-line flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Analysis to run (repeatable)
    #[arg(short, long = "analysis")]
    analyses: Vec<String>,

    /// Entry function (repeatable)
    #[arg(short, long = "entry")]
    entries: Vec<String>,

    /// Directory for JSON and DOT exports
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Record exploded supergraph edges
    #[arg(long)]
    record_edges: bool,

    /// Write DOT graphs
    #[arg(long)]
    dot: bool,

    /// Run analyses in parallel
    #[arg(short, long)]
    parallel: bool,

    /// Print the full report as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// List the available analyses and exit
    #[arg(long)]
    list: bool,
}

impl Args {
    fn into_config(self) -> Result<(PathBuf, AnalysisConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_yaml(path)?,
            None => AnalysisConfig::default(),
        };
        if !self.analyses.is_empty() {
            config.analyses = self.analyses;
        }
        if !self.entries.is_empty() {
            config.entry_points = self.entries;
        }
        if self.output_dir.is_some() {
            config.output_dir = self.output_dir;
        }
        config.record_edges |= self.record_edges;
        config.export_dot |= self.dot;
        config.parallel_analyses |= self.parallel;
        let program = self
            .program
            .ok_or_else(|| DataflowError::malformed("no program given"))?;
        Ok((program, config, self.json))
    }
}

fn run(args: Args) -> Result<bool> {
    let (program_path, config, json) = args.into_config()?;
    let program = Program::from_json_file(&program_path)?;
    let controller = AnalysisController::new(&program, config)?;
    let report = controller.run()?;

    if json {
        println!("{}", to_json_string(&report)?);
    } else {
        for outcome in &report.outcomes {
            println!(
                "{} ({} solver): {} findings",
                outcome.analysis,
                outcome.solver,
                outcome.findings.len()
            );
            for finding in &outcome.findings {
                println!("  [{}] {}: {}", finding.code, finding.point, finding.message);
            }
        }
        for diagnostic in &report.diagnostics {
            eprintln!("{}", diagnostic);
        }
    }
    Ok(!report.has_errors())
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.list {
        for kind in AnalysisKind::ALL {
            println!("{:<24} {}", kind.as_str(), kind.solver_kind());
        }
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
