//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.aggbench.toml` files.

use crate::bench::{BenchOptions, MAX_SAMPLES_LIMIT};
use crate::cli::{Args, OutputFormat};
use crate::models::{Subject, WeightMode};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE: &str = ".aggbench.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Benchmark settings.
    #[serde(default)]
    pub benchmark: BenchmarkConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Which subjects run and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Subjects to run, in order.
    #[serde(default = "default_subjects")]
    pub subjects: Vec<Subject>,

    /// Weight statistics mode.
    #[serde(default)]
    pub weight_mode: WeightMode,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            subjects: default_subjects(),
            weight_mode: WeightMode::default(),
        }
    }
}

fn default_subjects() -> Vec<Subject> {
    Subject::ALL.to_vec()
}

/// Benchmark harness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Run the benchmark suite after aggregating.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum measuring time per subject, in milliseconds.
    #[serde(default = "default_min_time_ms")]
    pub min_time_ms: u64,

    /// Maximum timed samples per subject.
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,

    /// Untimed runs before measuring.
    #[serde(default = "default_warmup")]
    pub warmup_iterations: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_time_ms: default_min_time_ms(),
            max_samples: default_max_samples(),
            warmup_iterations: default_warmup(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_min_time_ms() -> u64 {
    1000
}

fn default_max_samples() -> usize {
    100
}

fn default_warmup() -> usize {
    3
}

impl BenchmarkConfig {
    /// Harness options for this configuration.
    pub fn options(&self, show_progress: bool) -> BenchOptions {
        BenchOptions {
            min_time: Duration::from_millis(self.min_time_ms),
            max_samples: self.max_samples,
            warmup_iterations: self.warmup_iterations,
            show_progress,
        }
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Output file; stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Decimal places for statistics in Markdown tables.
    #[serde(default = "default_precision")]
    pub precision: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            output: None,
            precision: default_precision(),
        }
    }
}

fn default_precision() -> usize {
    2
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref subjects) = args.subjects {
            self.analysis.subjects = subjects.clone();
        }
        dedup_subjects(&mut self.analysis.subjects);
        if let Some(mode) = args.weight_mode {
            self.analysis.weight_mode = mode;
        }

        if args.no_bench {
            self.benchmark.enabled = false;
        }
        if let Some(ms) = args.bench_time_ms {
            self.benchmark.min_time_ms = ms;
        }
        if let Some(samples) = args.bench_max_samples {
            self.benchmark.max_samples = samples;
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(ref output) = args.output {
            self.report.output = Some(output.clone());
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Reject settings the benchmark harness cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.analysis.subjects.is_empty() {
            bail!("[analysis] subjects must name at least one subject");
        }
        if self.benchmark.min_time_ms == 0 {
            bail!("[benchmark] min_time_ms must be at least 1");
        }
        if !(1..=MAX_SAMPLES_LIMIT).contains(&self.benchmark.max_samples) {
            bail!(
                "[benchmark] max_samples must be between 1 and {}",
                MAX_SAMPLES_LIMIT
            );
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

/// Drop repeated subjects, keeping the first occurrence of each.
fn dedup_subjects(subjects: &mut Vec<Subject>) {
    let mut seen = BTreeSet::new();
    subjects.retain(|subject| seen.insert(*subject));
}
