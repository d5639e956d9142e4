//! Timing suite for repeated runs of the aggregation subjects.
//!
//! Each case is warmed up, calibrated to a batch size whose run time is
//! measurable, then sampled until the time budget or the sample cap is hit.

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// z-score for a 95% confidence interval.
const Z_95: f64 = 1.96;

/// Fewest samples taken before the time budget may end a case.
const MIN_SAMPLES: usize = 5;

/// Largest batch tried during calibration.
const MAX_BATCH: u64 = 1 << 20;

/// Largest accepted per-case sample cap.
pub const MAX_SAMPLES_LIMIT: usize = 1_000_000;

/// Options controlling how long each case is measured.
#[derive(Debug, Clone)]
pub struct BenchOptions {
    /// Minimum measuring time per case.
    pub min_time: Duration,
    /// Upper bound on timed samples per case, clamped to `1..=MAX_SAMPLES_LIMIT`.
    pub max_samples: usize,
    /// Untimed runs before calibration.
    pub warmup_iterations: usize,
    /// Show a spinner while a case runs.
    pub show_progress: bool,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            min_time: Duration::from_millis(1000),
            max_samples: 100,
            warmup_iterations: 3,
            show_progress: true,
        }
    }
}

/// Measurement of a single case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    pub name: String,
    /// Operations per second.
    pub hz: f64,
    /// Mean seconds per operation.
    pub mean_secs: f64,
    /// Sample standard deviation of seconds per operation.
    pub deviation_secs: f64,
    /// Relative margin of error, in percent.
    pub rme_percent: f64,
    pub samples: usize,
    /// Total timed operations.
    pub iterations: u64,
}

impl CaseResult {
    fn from_samples(name: String, per_op_secs: &[f64], iterations: u64) -> Self {
        let n = per_op_secs.len() as f64;
        let mean = per_op_secs.iter().sum::<f64>() / n;

        let variance = if per_op_secs.len() > 1 {
            per_op_secs.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0)
        } else {
            0.0
        };
        let deviation = variance.sqrt();
        let moe = deviation / n.sqrt() * Z_95;

        let (hz, rme) = if mean > 0.0 {
            (1.0 / mean, moe / mean * 100.0)
        } else {
            (f64::INFINITY, 0.0)
        };

        Self {
            name,
            hz,
            mean_secs: mean,
            deviation_secs: deviation,
            rme_percent: rme,
            samples: per_op_secs.len(),
            iterations,
        }
    }
}

/// Results of a full suite run with the fastest/slowest ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub cases: Vec<CaseResult>,
    pub fastest: Option<String>,
    pub slowest: Option<String>,
    /// `fastest.hz / slowest.hz`
    pub speedup: Option<f64>,
}

impl SuiteSummary {
    pub fn from_cases(cases: Vec<CaseResult>) -> Self {
        let fastest = cases
            .iter()
            .max_by(|a, b| a.hz.total_cmp(&b.hz))
            .cloned();
        let slowest = cases
            .iter()
            .min_by(|a, b| a.hz.total_cmp(&b.hz))
            .cloned();

        let speedup = match (&fastest, &slowest) {
            (Some(f), Some(s)) if s.hz > 0.0 => Some(f.hz / s.hz),
            _ => None,
        };

        Self {
            fastest: fastest.map(|c| c.name),
            slowest: slowest.map(|c| c.name),
            speedup,
            cases,
        }
    }

    pub fn case(&self, name: &str) -> Option<&CaseResult> {
        self.cases.iter().find(|c| c.name == name)
    }
}

struct BenchCase<'a> {
    name: String,
    routine: Box<dyn FnMut() + 'a>,
}

/// Ordered collection of named cases measured one after another.
pub struct BenchmarkSuite<'a> {
    options: BenchOptions,
    cases: Vec<BenchCase<'a>>,
}

impl<'a> BenchmarkSuite<'a> {
    pub fn new(options: BenchOptions) -> Self {
        Self {
            options,
            cases: Vec::new(),
        }
    }

    /// Register a case. Cases run in registration order.
    pub fn add<F>(mut self, name: impl Into<String>, routine: F) -> Self
    where
        F: FnMut() + 'a,
    {
        self.cases.push(BenchCase {
            name: name.into(),
            routine: Box::new(routine),
        });
        self
    }

    /// Measure every case and log a cycle line for each, then the ranking.
    pub fn run(self) -> SuiteSummary {
        let options = self.options;
        let mut results = Vec::with_capacity(self.cases.len());

        for mut case in self.cases {
            let progress = spinner(&options, &case.name);
            let result = measure(&options, case.name, &mut *case.routine);
            if let Some(pb) = progress {
                pb.finish_and_clear();
            }

            info!(
                "[CYCLE] {}: {:.0} ops/sec \u{b1}{:.2}% mean: {:.9}s ({} samples)",
                result.name, result.hz, result.rme_percent, result.mean_secs, result.samples
            );
            results.push(result);
        }

        let summary = SuiteSummary::from_cases(results);

        if let (Some(fastest), Some(speedup)) = (&summary.fastest, summary.speedup) {
            let hz = summary.case(fastest).map(|c| c.hz).unwrap_or_default();
            info!("[COMPLETE] fastest: {} ({:.0} ops/sec)", fastest, hz);
            info!("[COMPLETE] {:.1}x faster than the slowest", speedup);
        }

        summary
    }
}

fn spinner(options: &BenchOptions, name: &str) -> Option<ProgressBar> {
    if !options.show_progress {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(format!("benchmarking {}", name));
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

fn time_batch(routine: &mut dyn FnMut(), batch: u64) -> Duration {
    let start = Instant::now();
    for _ in 0..batch {
        routine();
    }
    start.elapsed()
}

fn measure(options: &BenchOptions, name: String, routine: &mut dyn FnMut()) -> CaseResult {
    for _ in 0..options.warmup_iterations {
        routine();
    }

    let max_samples = options.max_samples.clamp(1, MAX_SAMPLES_LIMIT);
    let divisor = u32::try_from(max_samples).unwrap_or(u32::MAX);
    let sample_target = (options.min_time / divisor).max(Duration::from_micros(100));

    let mut batch = 1u64;
    while batch < MAX_BATCH && time_batch(routine, batch) < sample_target {
        batch *= 2;
    }
    debug!("{}: batch size {} for {:?} samples", name, batch, sample_target);

    let started = Instant::now();
    let mut per_op_secs = Vec::new();
    let mut iterations = 0u64;

    while per_op_secs.len() < max_samples {
        let elapsed = time_batch(routine, batch);
        per_op_secs.push(elapsed.as_secs_f64() / batch as f64);
        iterations += batch;

        if per_op_secs.len() >= MIN_SAMPLES && started.elapsed() >= options.min_time {
            break;
        }
    }

    CaseResult::from_samples(name, &per_op_secs, iterations)
}
