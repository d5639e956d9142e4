//! Markdown and JSON report generation.
//!
//! This module renders aggregation results and benchmark timings.

use crate::bench::SuiteSummary;
use crate::models::{GroupedStats, RegionYearStats, Report, ReportMetadata, SummaryStats};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate a complete Markdown report.
///
/// `precision` is the number of decimal places used for statistics.
pub fn generate_markdown_report(report: &Report, precision: usize) -> String {
    let mut output = String::new();

    output.push_str("# AggBench Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));

    let results = &report.results;
    if let Some(ref grouped) = results.by_region {
        output.push_str(&generate_grouped_section(
            "Value by Region",
            "Region",
            grouped,
            precision,
        ));
    }
    if let Some(ref nested) = results.by_region_then_year {
        output.push_str(&generate_nested_section(nested, precision));
    }
    if let Some(ref grouped) = results.by_resource {
        output.push_str(&generate_grouped_section(
            "Value by Resource",
            "Resource",
            grouped,
            precision,
        ));
    }
    if let Some(ref stats) = results.weight_extremes {
        output.push_str(&generate_weight_section(stats, &report.metadata, precision));
    }

    if let Some(ref summary) = report.benchmark {
        output.push_str(&generate_benchmark_section(summary));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Input:** `{}`\n", metadata.input));
    section.push_str(&format!("- **Records:** {}\n", metadata.record_count));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Aggregation Time:** {:.3}ms\n",
        metadata.aggregation_seconds * 1000.0
    ));
    section.push('\n');

    section
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

fn stats_cells(stats: &SummaryStats, precision: usize) -> String {
    format!(
        "{:.p$} | {:.p$} | {:.p$} | {} | {}",
        stats.max,
        stats.min,
        stats.median,
        fmt_opt(stats.sum, precision),
        fmt_opt(stats.avg, precision),
        p = precision
    )
}

/// Generate a table for single-level grouped statistics.
fn generate_grouped_section(
    title: &str,
    key_label: &str,
    grouped: &GroupedStats,
    precision: usize,
) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));
    section.push_str(&format!(
        "| {} | Max | Min | Median | Sum | Avg |\n",
        key_label
    ));
    section.push_str("|:---|---:|---:|---:|---:|---:|\n");

    for (key, stats) in grouped {
        section.push_str(&format!("| {} | {} |\n", key, stats_cells(stats, precision)));
    }
    section.push('\n');

    section
}

/// Generate the region/year table.
fn generate_nested_section(nested: &RegionYearStats, precision: usize) -> String {
    let mut section = String::new();

    section.push_str("## Value by Region and Year\n\n");
    section.push_str("| Region | Year | Max | Min | Median | Sum | Avg |\n");
    section.push_str("|:---|:---|---:|---:|---:|---:|---:|\n");

    for region in nested.regions() {
        for year in nested.years(region) {
            if let Some(stats) = nested.get(region, year) {
                section.push_str(&format!(
                    "| {} | {} | {} |\n",
                    region,
                    year,
                    stats_cells(stats, precision)
                ));
            }
        }
    }
    section.push('\n');

    section
}

/// Generate the weight statistics section.
fn generate_weight_section(
    stats: &SummaryStats,
    metadata: &ReportMetadata,
    precision: usize,
) -> String {
    let mut section = String::new();

    section.push_str("## Weight Extremes\n\n");
    section.push_str(&format!(
        "*Mode: {} ({})*\n\n",
        metadata.weight_mode,
        metadata.weight_mode.note()
    ));
    section.push_str("| Max | Min | Median |\n");
    section.push_str("|---:|---:|---:|\n");
    section.push_str(&format!(
        "| {:.p$} | {:.p$} | {:.p$} |\n\n",
        stats.max,
        stats.min,
        stats.median,
        p = precision
    ));

    section
}

/// Generate the benchmark section.
fn generate_benchmark_section(summary: &SuiteSummary) -> String {
    let mut section = String::new();

    section.push_str("## Benchmark\n\n");

    if summary.cases.is_empty() {
        section.push_str("No subjects were benchmarked.\n\n");
        return section;
    }

    section.push_str("| Subject | ops/sec | Mean | \u{b1} RME | Samples |\n");
    section.push_str("|:---|---:|---:|---:|---:|\n");

    for case in &summary.cases {
        section.push_str(&format!(
            "| {} | {:.0} | {:.3}\u{b5}s | {:.2}% | {} |\n",
            case.name,
            case.hz,
            case.mean_secs * 1_000_000.0,
            case.rme_percent,
            case.samples
        ));
    }
    section.push('\n');

    if let Some(ref fastest) = summary.fastest {
        section.push_str(&format!("**Fastest:** {}\n\n", fastest));
    }
    if let (Some(slowest), Some(speedup)) = (&summary.slowest, summary.speedup) {
        section.push_str(&format!(
            "**Slowest:** {} ({:.1}x slower than the fastest)\n\n",
            slowest, speedup
        ));
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by AggBench*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::CaseResult;
    use crate::models::{AggregationResults, GroupKey, WeightMode};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn full_stats(max: f64, min: f64, median: f64, sum: f64, avg: f64) -> SummaryStats {
        SummaryStats {
            max,
            min,
            sum: Some(sum),
            avg: Some(avg),
            median,
        }
    }

    fn create_test_report() -> Report {
        let mut by_region = GroupedStats::new();
        by_region.insert(GroupKey::from("A"), full_stats(20.0, 10.0, 20.0, 30.0, 15.0));
        by_region.insert(GroupKey::from("B"), full_stats(5.0, 5.0, 5.0, 5.0, 5.0));

        let mut years = GroupedStats::new();
        years.insert(GroupKey::from(2020), full_stats(20.0, 10.0, 20.0, 30.0, 15.0));
        let mut nested = BTreeMap::new();
        nested.insert(GroupKey::from("A"), years);

        Report {
            metadata: ReportMetadata {
                input: "data.json".to_string(),
                record_count: 3,
                generated_at: Utc::now(),
                weight_mode: WeightMode::RunningExtremes,
                aggregation_seconds: 0.001,
            },
            results: AggregationResults {
                by_region: Some(by_region),
                by_region_then_year: Some(RegionYearStats::new(nested)),
                by_resource: None,
                weight_extremes: Some(SummaryStats {
                    max: 3.0,
                    min: -1.0,
                    sum: None,
                    avg: None,
                    median: 3.0,
                }),
            },
            benchmark: Some(SuiteSummary::from_cases(vec![
                CaseResult {
                    name: "by-region".to_string(),
                    hz: 2000.0,
                    mean_secs: 0.0005,
                    deviation_secs: 0.0,
                    rme_percent: 1.5,
                    samples: 10,
                    iterations: 100,
                },
                CaseResult {
                    name: "weight-extremes".to_string(),
                    hz: 8000.0,
                    mean_secs: 0.000125,
                    deviation_secs: 0.0,
                    rme_percent: 0.5,
                    samples: 10,
                    iterations: 400,
                },
            ])),
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, 2);

        assert!(markdown.contains("# AggBench Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Value by Region\n"));
        assert!(markdown.contains("## Value by Region and Year"));
        assert!(!markdown.contains("## Value by Resource"));
        assert!(markdown.contains("## Weight Extremes"));
        assert!(markdown.contains("| A | 20.00 | 10.00 | 20.00 | 30.00 | 15.00 |"));
        assert!(markdown.contains("| A | 2020 | 20.00 |"));
        assert!(markdown.contains("**Fastest:** weight-extremes"));
        assert!(markdown.contains("4.0x"));
    }

    #[test]
    fn test_weight_section_has_no_sum() {
        let report = create_test_report();
        let stats = report.results.weight_extremes.unwrap();
        let section = generate_weight_section(&stats, &report.metadata, 1);

        assert!(section.contains("*Mode: running-extremes (running max/min from zero over weights in file order;"));
        assert!(section.contains("| 3.0 | -1.0 | 3.0 |"));
    }

    #[test]
    fn test_benchmark_section_without_cases() {
        let section = generate_benchmark_section(&SuiteSummary::default());
        assert!(section.contains("No subjects were benchmarked"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"record_count\": 3"));
        assert!(json.contains("\"by_region\""));
        assert!(json.contains("\"2020\""));
        assert!(!json.contains("\"by_resource\""));
        assert!(json.contains("\"fastest\": \"weight-extremes\""));
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");

        write_report("# AggBench Report\n", &path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "# AggBench Report\n"
        );
    }
}
