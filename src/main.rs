//! AggBench - grouped statistics and timing over JSON node datasets
//!
//! Loads a `{ "nodes": [...] }` dataset, computes value statistics per
//! region, per region and year, and per resource, finds the weight
//! extremes, then benchmarks those computations.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, unreadable or invalid input, aggregation failure)

use aggbench::cli::{Args, OutputFormat};
use aggbench::config::{Config, CONFIG_FILE};
use aggbench::models::{self, Report, ReportMetadata};
use aggbench::{analysis, bench, loader, report};
use anyhow::{Context, Result};
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config)?;

    info!("AggBench v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    if let Err(e) = run(args, config).await {
        error!("Run failed: {:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .aggbench.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    println!("Edit it to choose subjects, weight mode, benchmark limits and report format.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` overrides the level picked from the flags.
fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Load, aggregate, benchmark and report.
async fn run(args: Args, config: Config) -> Result<()> {
    let input = args.input.clone().context("An input file is required")?;

    // Step 1: Load the dataset; nothing is aggregated until this completes
    let dataset = loader::load_dataset(&input).await?;
    let record_count = dataset.len();

    // Step 2: Run every selected subject once
    let subjects = config.analysis.subjects.clone();
    let weight_mode = config.analysis.weight_mode;
    if weight_mode == models::WeightMode::RunningExtremes {
        debug!(
            "Weight statistics track running extremes only; \
             use --weight-mode exact for true values"
        );
    }

    let start_time = Instant::now();
    let results = analysis::run_subjects(&dataset, &subjects, weight_mode)
        .with_context(|| format!("Aggregation over {} failed", input.display()))?;
    let aggregation_seconds = start_time.elapsed().as_secs_f64();

    if let Some(ref grouped) = results.by_region {
        info!("by-region: {} groups", grouped.len());
    }
    if let Some(ref nested) = results.by_region_then_year {
        info!("by-region-then-year: {} region/year groups", nested.leaf_count());
    }
    if let Some(ref grouped) = results.by_resource {
        info!("by-resource: {} groups", grouped.len());
    }
    if let Some(ref stats) = results.weight_extremes {
        info!(
            "weight-extremes: max {} min {} median {}",
            stats.max, stats.min, stats.median
        );
    }

    // Step 3: Benchmark the same subjects off the async runtime
    let benchmark = if config.benchmark.enabled {
        let options = config.benchmark.options(!args.quiet);
        let bench_subjects = subjects.clone();
        let summary = tokio::task::spawn_blocking(move || {
            bench::benchmark_subjects(&dataset, &bench_subjects, weight_mode, options)
        })
        .await
        .context("Benchmark worker failed")?;
        Some(summary)
    } else {
        debug!("Benchmark disabled");
        None
    };

    // Step 4: Build and emit the report
    let report = Report {
        metadata: ReportMetadata {
            input: input.display().to_string(),
            record_count,
            generated_at: Utc::now(),
            weight_mode,
            aggregation_seconds,
        },
        results,
        benchmark,
    };

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&report, config.report.precision)
        }
    };

    match config.report.output {
        Some(ref path) => {
            report::write_report(&output, path)?;
            info!("Report saved to {}", path.display());
        }
        None => print!("{}", output),
    }

    Ok(())
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    let mut config = if let Some(ref config_path) = args.config {
        Config::load(config_path)?
    } else {
        // Try default location
        match Config::load_default() {
            Ok(Some(config)) => config,
            Ok(None) => Config::default(),
            Err(e) => {
                // logging is not initialized yet
                eprintln!("Warning: ignoring {}: {:#}", CONFIG_FILE, e);
                Config::default()
            }
        }
    };

    config.merge_with_args(args);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
