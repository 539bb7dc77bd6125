//! py-coupling CLI - Package Coupling Metrics
//!
//! Analyzes a Python package and prints afferent/efferent coupling,
//! instability, abstractness, distance from the main sequence and a PlantUML
//! dependency diagram.
//!
//! Usage:
//!   py-coupling --project-root <PATH> --package-name <NAME> [OPTIONS]

use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use py_coupling::{
    AnalysisOptions, CouplingConfig, DiagramOptions, ParseFailurePolicy, ReportOptions,
    TracingDiagnostics, analyze_project, generate_json_output, generate_report, generate_summary,
    load_config, load_config_file,
};

/// py-coupling - Package coupling metrics for Python projects
#[derive(Parser, Debug)]
#[command(name = "py-coupling")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the Python project to analyze
    #[arg(long)]
    project_root: PathBuf,

    /// Name of the root package to analyze. Sources are expected in
    /// <project_root>/<package_name>; only imports inside this namespace count.
    #[arg(long)]
    package_name: String,

    /// Grouping level. Values below 1 keep full module names; with 2,
    /// "my_package.foo.bar" collapses into "my_package.foo".
    #[arg(long, allow_negative_numbers = true)]
    level: Option<i32>,

    /// Config file path (default: search for .coupling.toml from the project root)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file for the report (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit the whole result as JSON
    #[arg(long)]
    json: bool,

    /// Show summary only (averages and warning counts)
    #[arg(short, long)]
    summary: bool,

    /// Randomly vary arrow directions in the diagram
    #[arg(long)]
    vary_arrows: bool,

    /// Seed for --vary-arrows
    #[arg(long)]
    seed: Option<u64>,

    /// Leave the PlantUML diagram out of the text report
    #[arg(long)]
    no_diagram: bool,

    /// Abort on the first file that fails to parse instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Show timing information
    #[arg(long)]
    timing: bool,

    /// Number of threads for parallel parsing (default: all CPU cores)
    #[arg(long, short = 'j', value_name = "N")]
    jobs: Option<usize>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .unwrap_or_else(|e| tracing::warn!("Could not set thread count: {}", e));
    }

    let total_start = Instant::now();

    let file_config: CouplingConfig = match &args.config {
        Some(path) => load_config_file(path)?,
        None => load_config(&args.project_root)?,
    };

    let mut options = AnalysisOptions::new(&args.project_root, &args.package_name);
    if let Some(level) = args.level {
        options.level = level;
    }
    options.apply_file_config(&file_config, args.level.is_some());
    if args.strict {
        options.parse_failure = ParseFailurePolicy::Abort;
    }

    let diagram = DiagramOptions {
        vary_arrows: args.vary_arrows || file_config.diagram.vary_arrows,
        seed: args.seed.or(file_config.diagram.seed),
    };

    eprintln!(
        "Analyzing package '{}' in '{}'...",
        options.package_name,
        options.project_root.display()
    );

    let analysis_start = Instant::now();
    let metrics = analyze_project(&options, &TracingDiagnostics)?;
    let analysis_time = analysis_start.elapsed();

    if args.timing {
        eprintln!(
            "Analysis complete: {} files, {} modules (took {:.2?})\n",
            metrics.total_files,
            metrics.module_count(),
            analysis_time
        );
    } else {
        eprintln!(
            "Analysis complete: {} files, {} modules\n",
            metrics.total_files,
            metrics.module_count()
        );
    }
    if !metrics.skipped_files.is_empty() {
        eprintln!(
            "Warning: {} file(s) skipped because they could not be parsed",
            metrics.skipped_files.len()
        );
    }

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(stdout()),
    };

    if args.json {
        generate_json_output(&metrics, &diagram, &mut writer)?;
    } else if args.summary {
        generate_summary(&metrics, &mut writer)?;
    } else {
        let report_options = ReportOptions {
            diagram,
            skip_diagram: args.no_diagram,
        };
        generate_report(&metrics, &report_options, &mut writer)?;
    }
    writer.flush()?;

    if let Some(path) = &args.output {
        eprintln!("Report written to: {}", path.display());
    }

    if args.timing {
        let total_time = total_start.elapsed();
        let files_per_sec = metrics.total_files as f64 / total_time.as_secs_f64();
        eprintln!(
            "Total time: {:.2?} ({:.1} files/sec)",
            total_time, files_per_sec
        );
    }

    Ok(())
}
