//! dynload CLI
//!
//! Resolves `ServiceLoader.load` arguments over a JSON class set and writes
//! the failed-propagation and resolved-call reports.
//!
//! # Usage
//!
//! ```bash
//! # Analyze every class, reports to files
//! cargo run --bin dynload-cli --release -- analyze --input classes.json \
//!     --report failed_report.txt --resolved prop_report.txt
//!
//! # Write a config file for a preset
//! cargo run --bin dynload-cli -- config --preset thorough --output dynload.yaml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dynload_ir::features::service_loader::write_resolved_report;
use dynload_ir::{AnalysisConfig, BatchAnalyzer, ClassPool, Preset, ReportSink, TextReport};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dynload-cli")]
#[command(about = "Resolve dynamic service-loading arguments in JVM bytecode IR", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a JSON class set
    Analyze {
        /// JSON array of class documents
        #[arg(short, long)]
        input: PathBuf,

        /// YAML config file (overrides --preset)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Preset: fast, balanced, thorough
        #[arg(long, default_value = "balanced")]
        preset: String,

        /// Failed-propagation report (stderr if absent)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Resolved-call report (stdout if absent)
        #[arg(long)]
        resolved: Option<PathBuf>,

        /// Only analyze these classes
        #[arg(long = "class")]
        classes: Vec<String>,

        /// Disable the thread pool
        #[arg(long)]
        sequential: bool,

        /// Print the full result as JSON instead of the summary
        #[arg(long)]
        json: bool,
    },

    /// Write the YAML config of a preset
    Config {
        #[arg(long, default_value = "balanced")]
        preset: String,

        /// Output file (stdout if absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            input,
            config,
            preset,
            report,
            resolved,
            classes,
            sequential,
            json,
        } => {
            let mut config = match config {
                Some(path) => AnalysisConfig::from_yaml(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => AnalysisConfig::preset(preset.parse::<Preset>()?),
            };
            if sequential {
                config = config.parallel(false);
            }
            analyze(input, config, report, resolved, classes, json)
        }
        Commands::Config { preset, output } => {
            let config = AnalysisConfig::preset(preset.parse::<Preset>()?);
            match output {
                Some(path) => config.save_yaml(&path)?,
                None => print!("{}", config.to_yaml()?),
            }
            Ok(())
        }
    }
}

fn analyze(
    input: PathBuf,
    config: AnalysisConfig,
    report: Option<PathBuf>,
    resolved: Option<PathBuf>,
    classes: Vec<String>,
    json: bool,
) -> Result<()> {
    let pool = ClassPool::from_json_file(&input)
        .with_context(|| format!("reading class set {}", input.display()))?;

    let mut sink: Box<dyn ReportSink> = match &report {
        Some(path) => Box::new(TextReport::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ))?),
        None => Box::new(TextReport::new(io::stderr())?),
    };

    let batch = BatchAnalyzer::new(&pool, config);
    let result = if classes.is_empty() {
        batch.run_all(sink.as_mut())
    } else {
        let classes: Vec<_> = classes.iter().map(|c| c.as_str().into()).collect();
        batch.run(&classes, sink.as_mut())
    };
    drop(sink);

    match &resolved {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            write_resolved_report(&mut out, &result.analyses)?;
            out.flush()?;
        }
        None if !json => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_resolved_report(&mut out, &result.analyses)?;
        }
        None => {}
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let summary = &result.summary;
    eprintln!("Constant calls: {}", summary.counters.literal);
    eprintln!("Dataflow calls: {}", summary.counters.dataflow);
    eprintln!("Unresolved calls: {}", summary.counters.unresolved);
    eprintln!("Solver failures: {}", summary.counters.solver_failures);
    eprintln!(
        "Classes: {} analyzed, {} skipped ({} ms)",
        summary.classes_analyzed, summary.classes_skipped, summary.elapsed_ms
    );
    for skipped in &result.skipped {
        eprintln!("  skipped {}: {}", skipped.class, skipped.reason);
    }
    Ok(())
}
