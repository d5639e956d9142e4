//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::bench::MAX_SAMPLES_LIMIT;
use crate::models::{Subject, WeightMode};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// AggBench - grouped statistics and timing over JSON node datasets
///
/// Loads `{ "nodes": [...] }` from a file, summarizes `value` per region,
/// per region and year, and per resource, finds the weight extremes, then
/// benchmarks each of those computations.
///
/// Examples:
///   aggbench data.json
///   aggbench data.json --subjects by-region,by-resource --no-bench
///   aggbench data.json --format json --output report.json
///   aggbench data.json --weight-mode exact --bench-time-ms 250
///   aggbench --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON dataset to analyze
    #[arg(
        value_name = "FILE",
        env = "AGGBENCH_INPUT",
        required_unless_present = "init_config"
    )]
    pub input: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .aggbench.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Subjects to run (comma-separated)
    ///
    /// Values: by-region, by-region-then-year, by-resource, weight-extremes.
    /// Defaults to all four.
    #[arg(short, long, value_name = "SUBJECTS", value_delimiter = ',')]
    pub subjects: Option<Vec<Subject>>,

    /// How weight max/min/median are computed
    ///
    /// running-extremes tracks only weights that set a new max or min,
    /// scanning records in file order (the input is never sorted first, so
    /// results depend on record order); exact uses every weight.
    #[arg(long, value_name = "MODE", env = "AGGBENCH_WEIGHT_MODE")]
    pub weight_mode: Option<WeightMode>,

    /// Skip the benchmark suite
    #[arg(long)]
    pub no_bench: bool,

    /// Minimum measuring time per subject in milliseconds
    #[arg(long, value_name = "MS")]
    pub bench_time_ms: Option<u64>,

    /// Maximum timed samples per subject
    #[arg(long, value_name = "COUNT")]
    pub bench_max_samples: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .aggbench.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.bench_time_ms == Some(0) {
            return Err("Benchmark time must be at least 1 ms".to_string());
        }

        match self.bench_max_samples {
            Some(0) => return Err("Benchmark samples must be at least 1".to_string()),
            Some(n) if n > MAX_SAMPLES_LIMIT => {
                return Err(format!(
                    "Benchmark samples must be at most {}",
                    MAX_SAMPLES_LIMIT
                ))
            }
            _ => {}
        }

        if let Some(ref subjects) = self.subjects {
            if subjects.is_empty() {
                return Err("At least one subject is required".to_string());
            }
        }

        match self.input {
            Some(ref input) if !input.exists() => {
                Err(format!("Input file does not exist: {}", input.display()))
            }
            Some(ref input) if !input.is_file() => {
                Err(format!("Input path is not a file: {}", input.display()))
            }
            Some(_) => Ok(()),
            None => Err("An input file is required".to_string()),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn make_args(input: PathBuf) -> Args {
        Args {
            input: Some(input),
            config: None,
            output: None,
            format: None,
            subjects: None,
            weight_mode: None,
            no_bench: false,
            bench_time_ms: None,
            bench_max_samples: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_subject_list() {
        let args = Args::try_parse_from([
            "aggbench",
            "data.json",
            "--subjects",
            "by-region-then-year,weight-extremes",
            "--weight-mode",
            "running-extremes",
        ])
        .unwrap();

        assert_eq!(args.input, Some(PathBuf::from("data.json")));
        assert_eq!(
            args.subjects,
            Some(vec![Subject::ByRegionThenYear, Subject::WeightExtremes])
        );
        assert_eq!(args.weight_mode, Some(WeightMode::RunningExtremes));
    }

    #[test]
    fn test_init_config_needs_no_input() {
        let args = Args::try_parse_from(["aggbench", "--init-config"]).unwrap();
        assert!(args.init_config);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_ok() {
        let file = NamedTempFile::new().unwrap();
        let args = make_args(file.path().to_path_buf());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let args = make_args(dir.path().join("nope.json"));
        assert!(args.validate().is_err());

        let args = make_args(dir.path().to_path_buf());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(file.path().to_path_buf());
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_bench_limits() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(file.path().to_path_buf());
        args.bench_time_ms = Some(0);
        assert!(args.validate().is_err());

        args.bench_time_ms = Some(10);
        args.bench_max_samples = Some(0);
        assert!(args.validate().is_err());

        args.bench_max_samples = Some(4_294_967_296);
        assert!(args.validate().is_err());

        args.bench_max_samples = Some(MAX_SAMPLES_LIMIT);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(PathBuf::from("data.json"));
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
