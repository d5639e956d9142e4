//! Grouped aggregation and summary statistics.
//!
//! This module partitions a dataset by one or two categorical fields and
//! computes summary statistics for each partition.

use crate::error::AggregateError;
use crate::models::{
    AggregationResults, Field, GroupKey, GroupedStats, Record, RegionYearStats, StatsMode,
    Subject, SummaryStats, WeightMode,
};
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// Collected items per group key, in dataset order within each group.
pub type GroupedSamples<K, V = f64> = BTreeMap<K, Vec<V>>;

/// Compute max, min, upper median and (in full mode) sum and average.
///
/// The median is the element at index `len / 2` of the ascending sorted
/// sample, so even-length samples take the upper of the two middle values.
pub fn summarize(samples: &[f64], mode: StatsMode) -> Result<SummaryStats, AggregateError> {
    if samples.is_empty() {
        return Err(AggregateError::EmptyInput);
    }

    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let median = sorted[sorted.len() / 2];

    let (sum, avg) = match mode {
        StatsMode::Full => {
            let sum: f64 = samples.iter().sum();
            (Some(sum), Some(sum / samples.len() as f64))
        }
        StatsMode::Basic => (None, None),
    };

    Ok(SummaryStats {
        max,
        min,
        sum,
        avg,
        median,
    })
}

/// Partition `(key, item)` pairs, keeping encounter order inside each group.
pub fn partition<K, V, I>(pairs: I) -> GroupedSamples<K, V>
where
    K: Ord,
    I: IntoIterator<Item = (K, V)>,
{
    let mut grouped: GroupedSamples<K, V> = BTreeMap::new();

    for (key, item) in pairs {
        grouped.entry(key).or_default().push(item);
    }

    grouped
}

/// Group records with `key_fn`, which receives each record with its index
/// and yields the partition key and the item to collect.
pub fn group_by<'a, K, V, F>(
    dataset: &'a [Record],
    mut key_fn: F,
) -> Result<GroupedSamples<K, V>, AggregateError>
where
    K: Ord,
    F: FnMut(usize, &'a Record) -> Result<(K, V), AggregateError>,
{
    let pairs = dataset
        .iter()
        .enumerate()
        .map(|(index, record)| key_fn(index, record))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(partition(pairs))
}

fn require_key(record: &Record, index: usize, field: Field) -> Result<GroupKey, AggregateError> {
    record
        .key(field)
        .cloned()
        .ok_or(AggregateError::MissingField { index, field })
}

fn require_number(record: &Record, index: usize, field: Field) -> Result<f64, AggregateError> {
    record
        .number(field)
        .ok_or(AggregateError::MissingField { index, field })
}

fn summarize_groups(grouped: GroupedSamples<GroupKey>) -> Result<GroupedStats, AggregateError> {
    grouped
        .into_iter()
        .map(|(key, samples)| -> Result<_, AggregateError> {
            Ok((key, summarize(&samples, StatsMode::Full)?))
        })
        .collect()
}

/// Group `value` by a single categorical field and summarize each group.
pub fn by_field(dataset: &[Record], field: Field) -> Result<GroupedStats, AggregateError> {
    if dataset.is_empty() {
        return Err(AggregateError::EmptyInput);
    }

    let grouped = group_by(dataset, |index, record| {
        Ok((
            require_key(record, index, field)?,
            require_number(record, index, Field::Value)?,
        ))
    })?;

    summarize_groups(grouped)
}

/// Value statistics per region.
pub fn by_region(dataset: &[Record]) -> Result<GroupedStats, AggregateError> {
    by_field(dataset, Field::Region)
}

/// Value statistics per resource.
pub fn by_resource(dataset: &[Record]) -> Result<GroupedStats, AggregateError> {
    by_field(dataset, Field::Resource)
}

/// Value statistics per year, nested within each region.
pub fn by_region_then_year(dataset: &[Record]) -> Result<RegionYearStats, AggregateError> {
    if dataset.is_empty() {
        return Err(AggregateError::EmptyInput);
    }

    let by_region = group_by(dataset, |index, record| {
        let region = require_key(record, index, Field::Region)?;
        let year = require_key(record, index, Field::Year)?;
        let value = require_number(record, index, Field::Value)?;
        Ok((region, (year, value)))
    })?;

    let nested = by_region
        .into_iter()
        .map(|(region, pairs)| -> Result<_, AggregateError> {
            Ok((region, summarize_groups(partition(pairs))?))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    Ok(RegionYearStats::new(nested))
}

/// Dataset-wide weight max, min and median.
pub fn weight_extremes(
    dataset: &[Record],
    mode: WeightMode,
) -> Result<SummaryStats, AggregateError> {
    if dataset.is_empty() {
        return Err(AggregateError::EmptyInput);
    }

    let weights = dataset
        .iter()
        .enumerate()
        .map(|(index, record)| require_number(record, index, Field::Weight))
        .collect::<Result<Vec<_>, _>>()?;

    match mode {
        WeightMode::Exact => summarize(&weights, StatsMode::Basic),
        WeightMode::RunningExtremes => Ok(running_extremes(&weights)),
    }
}

/// Max and min start at zero; the median is taken from the trail of weights
/// that set a new maximum (appended) or a new minimum (prepended).
fn running_extremes(weights: &[f64]) -> SummaryStats {
    let mut max = 0.0;
    let mut min = 0.0;
    let mut trail = VecDeque::new();

    for &weight in weights {
        if weight > max {
            max = weight;
            trail.push_back(weight);
        }
        if weight < min {
            min = weight;
            trail.push_front(weight);
        }
    }

    // An empty trail means every weight was zero.
    let median = trail.get(trail.len() / 2).copied().unwrap_or(0.0);

    SummaryStats {
        max,
        min,
        sum: None,
        avg: None,
        median,
    }
}

/// Run the selected subjects against one dataset.
pub fn run_subjects(
    dataset: &[Record],
    subjects: &[Subject],
    weight_mode: WeightMode,
) -> Result<AggregationResults, AggregateError> {
    let mut results = AggregationResults::default();

    for subject in subjects {
        debug!("Running {} over {} records", subject, dataset.len());
        match subject {
            Subject::ByRegion => results.by_region = Some(by_region(dataset)?),
            Subject::ByRegionThenYear => {
                results.by_region_then_year = Some(by_region_then_year(dataset)?)
            }
            Subject::ByResource => results.by_resource = Some(by_resource(dataset)?),
            Subject::WeightExtremes => {
                results.weight_extremes = Some(weight_extremes(dataset, weight_mode)?)
            }
        }
    }

    Ok(results)
}
