//! Benchmark cases for the aggregation subjects.

use super::suite::{BenchOptions, BenchmarkSuite, SuiteSummary};
use crate::analysis::{by_region, by_region_then_year, by_resource, weight_extremes};
use crate::models::{Record, Subject, WeightMode};
use std::hint::black_box;
use tracing::info;

/// Time each selected subject over the same dataset.
///
/// Errors from the subjects are not reported here; the caller has already
/// run every subject once and surfaced any failure.
pub fn benchmark_subjects(
    dataset: &[Record],
    subjects: &[Subject],
    weight_mode: WeightMode,
    options: BenchOptions,
) -> SuiteSummary {
    info!(
        "Benchmarking {} subjects over {} records",
        subjects.len(),
        dataset.len()
    );

    let mut suite = BenchmarkSuite::new(options);

    for &subject in subjects {
        info!("  {}: {}", subject, subject.description());
        suite = match subject {
            Subject::ByRegion => suite.add(subject.to_string(), move || {
                let _ = black_box(by_region(black_box(dataset)));
            }),
            Subject::ByRegionThenYear => suite.add(subject.to_string(), move || {
                let _ = black_box(by_region_then_year(black_box(dataset)));
            }),
            Subject::ByResource => suite.add(subject.to_string(), move || {
                let _ = black_box(by_resource(black_box(dataset)));
            }),
            Subject::WeightExtremes => suite.add(subject.to_string(), move || {
                let _ = black_box(weight_extremes(black_box(dataset), weight_mode));
            }),
        };
    }

    suite.run()
}
