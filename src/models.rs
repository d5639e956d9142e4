//! Data models for the aggregator.
//!
//! This module contains the record, key and statistics types shared by
//! the loader, the aggregator and the report generator.

use crate::bench::SuiteSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Scalar value used to partition records into groups.
///
/// A key's identity is its textual form: `2020`, `2020.0` and `"2020"` are
/// the same group. Keys whose text is a canonical integer are held as
/// `Integer` so they order numerically and before every `Text` key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub enum GroupKey {
    Integer(i64),
    Text(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Integer(n) => write!(f, "{}", n),
            GroupKey::Text(s) => write!(f, "{}", s),
        }
    }
}

// Keys are always written as strings so they can be used as JSON object keys.
impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl TryFrom<serde_json::Value> for GroupKey {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        match value {
            Value::String(s) => Ok(GroupKey::from(s)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(GroupKey::Integer(i)),
                None => Ok(GroupKey::from_float(n.as_f64(), n.to_string())),
            },
            Value::Bool(b) => Ok(GroupKey::Text(b.to_string())),
            Value::Null => Err("group key cannot be null".to_string()),
            Value::Array(_) | Value::Object(_) => {
                Err("group key must be a string or a number".to_string())
            }
        }
    }
}

impl GroupKey {
    /// Largest magnitude at which every integral `f64` is exact.
    const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

    fn from_float(value: Option<f64>, text: String) -> Self {
        match value {
            Some(f) if f.fract() == 0.0 && f.abs() <= Self::MAX_EXACT_FLOAT => {
                GroupKey::Integer(f as i64)
            }
            _ => GroupKey::from(text),
        }
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        GroupKey::from(s.to_string())
    }
}

// "2020" parses back to the same integer; "02020", "+5" and "-0" stay text.
impl From<String> for GroupKey {
    fn from(s: String) -> Self {
        match s.parse::<i64>() {
            Ok(i) if i.to_string() == s => GroupKey::Integer(i),
            _ => GroupKey::Text(s),
        }
    }
}

impl From<i64> for GroupKey {
    fn from(n: i64) -> Self {
        GroupKey::Integer(n)
    }
}

/// One node of the input dataset.
///
/// Every field is optional at load time; an operation that needs a field
/// reports it as missing together with the record's position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<GroupKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<GroupKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<GroupKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// Named field of a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Region,
    Resource,
    Year,
    Value,
    Weight,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Region => write!(f, "region"),
            Field::Resource => write!(f, "resource"),
            Field::Year => write!(f, "year"),
            Field::Value => write!(f, "value"),
            Field::Weight => write!(f, "weight"),
        }
    }
}

impl Record {
    /// Categorical field by name, if present.
    pub fn key(&self, field: Field) -> Option<&GroupKey> {
        match field {
            Field::Region => self.region.as_ref(),
            Field::Resource => self.resource.as_ref(),
            Field::Year => self.year.as_ref(),
            Field::Value | Field::Weight => None,
        }
    }

    /// Numeric field by name, if present.
    pub fn number(&self, field: Field) -> Option<f64> {
        match field {
            Field::Value => self.value,
            Field::Weight => self.weight,
            Field::Region | Field::Resource | Field::Year => None,
        }
    }
}

/// Ordered sequence of records, read-only input to aggregation.
pub type Dataset = Vec<Record>;

/// Which statistics [`SummaryStats`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsMode {
    /// max, min, median, sum and avg
    #[default]
    Full,
    /// max, min and median only
    Basic,
}

/// Summary statistics over one numeric sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub max: f64,
    pub min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    pub median: f64,
}

/// How the dataset-wide weight statistics are computed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum WeightMode {
    /// Track only weights that set a new running max or min, starting from
    /// zero, scanning records in file order.
    #[default]
    RunningExtremes,
    /// True max, min and upper median over every weight.
    Exact,
}

impl WeightMode {
    /// One-line explanation shown next to weight statistics.
    pub fn note(&self) -> &'static str {
        match self {
            WeightMode::RunningExtremes => {
                "running max/min from zero over weights in file order; \
                 the median covers only weights that set a new extreme"
            }
            WeightMode::Exact => "max, min and upper median over every weight",
        }
    }
}

impl fmt::Display for WeightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightMode::RunningExtremes => write!(f, "running-extremes"),
            WeightMode::Exact => write!(f, "exact"),
        }
    }
}

/// Per-group statistics keyed by one categorical field.
pub type GroupedStats = BTreeMap<GroupKey, SummaryStats>;

/// Region → year → statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionYearStats(BTreeMap<GroupKey, GroupedStats>);

impl RegionYearStats {
    pub fn new(inner: BTreeMap<GroupKey, GroupedStats>) -> Self {
        Self(inner)
    }

    /// Statistics for one region/year leaf.
    pub fn get(&self, region: &GroupKey, year: &GroupKey) -> Option<&SummaryStats> {
        self.0.get(region).and_then(|years| years.get(year))
    }

    pub fn regions(&self) -> impl Iterator<Item = &GroupKey> {
        self.0.keys()
    }

    /// Year keys present for a region, in key order.
    pub fn years(&self, region: &GroupKey) -> Vec<&GroupKey> {
        self.0
            .get(region)
            .map(|years| years.keys().collect())
            .unwrap_or_default()
    }

    /// Number of region/year leaves.
    pub fn leaf_count(&self) -> usize {
        self.0.values().map(|years| years.len()).sum()
    }
}

/// One of the four derived aggregations.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Subject {
    ByRegion,
    ByRegionThenYear,
    ByResource,
    WeightExtremes,
}

impl Subject {
    pub const ALL: [Subject; 4] = [
        Subject::ByRegion,
        Subject::ByRegionThenYear,
        Subject::ByResource,
        Subject::WeightExtremes,
    ];

    /// Human readable description used in logs and reports.
    pub fn description(&self) -> &'static str {
        match self {
            Subject::ByRegion => "value statistics per region",
            Subject::ByRegionThenYear => "value statistics per region and year",
            Subject::ByResource => "value statistics per resource",
            Subject::WeightExtremes => "weight max, min and median over the dataset",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::ByRegion => write!(f, "by-region"),
            Subject::ByRegionThenYear => write!(f, "by-region-then-year"),
            Subject::ByResource => write!(f, "by-resource"),
            Subject::WeightExtremes => write!(f, "weight-extremes"),
        }
    }
}

/// Results of every subject that was run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_region: Option<GroupedStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_region_then_year: Option<RegionYearStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_resource: Option<GroupedStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_extremes: Option<SummaryStats>,
}

/// Metadata about one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the input dataset.
    pub input: String,
    /// Number of records in the dataset.
    pub record_count: usize,
    /// Date and time the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Weight statistics mode in effect.
    pub weight_mode: WeightMode,
    /// Wall time of the single aggregation pass, in seconds.
    pub aggregation_seconds: f64,
}

/// The complete aggregation and benchmark report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub results: AggregationResults,
    /// Absent when benchmarking was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<SuiteSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_key_from_json() {
        let key: GroupKey = serde_json::from_str("2020").unwrap();
        assert_eq!(key, GroupKey::Integer(2020));

        let key: GroupKey = serde_json::from_str("\"north\"").unwrap();
        assert_eq!(key, GroupKey::Text("north".to_string()));

        let key: GroupKey = serde_json::from_str("1.5").unwrap();
        assert_eq!(key, GroupKey::Text("1.5".to_string()));

        let key: GroupKey = serde_json::from_str("true").unwrap();
        assert_eq!(key, GroupKey::Text("true".to_string()));

        assert!(serde_json::from_str::<GroupKey>("[1, 2]").is_err());
    }

    #[test]
    fn test_group_key_identity_follows_text() {
        let number: GroupKey = serde_json::from_str("2020").unwrap();
        let text: GroupKey = serde_json::from_str("\"2020\"").unwrap();
        let float: GroupKey = serde_json::from_str("2020.0").unwrap();
        assert_eq!(number, text);
        assert_eq!(number, float);
        assert_eq!(text, GroupKey::Integer(2020));

        assert_eq!(GroupKey::from("-7"), GroupKey::Integer(-7));
        assert_eq!(GroupKey::from("02020"), GroupKey::Text("02020".to_string()));
        assert_eq!(GroupKey::from("+5"), GroupKey::Text("+5".to_string()));
        assert_eq!(GroupKey::from("-0"), GroupKey::Text("-0".to_string()));
    }

    #[test]
    fn test_group_key_ordering() {
        let mut keys = vec![
            GroupKey::from("b"),
            GroupKey::from(2021),
            GroupKey::from("a"),
            GroupKey::from(2019),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                GroupKey::from(2019),
                GroupKey::from(2021),
                GroupKey::from("a"),
                GroupKey::from("b"),
            ]
        );
    }

    #[test]
    fn test_record_missing_fields_deserialize_as_none() {
        let record: Record = serde_json::from_str(r#"{"region": "A", "value": 3}"#).unwrap();
        assert_eq!(record.key(Field::Region), Some(&GroupKey::from("A")));
        assert_eq!(record.number(Field::Value), Some(3.0));
        assert_eq!(record.key(Field::Year), None);
        assert_eq!(record.number(Field::Weight), None);
    }

    #[test]
    fn test_summary_stats_serialization_skips_absent() {
        let stats = SummaryStats {
            max: 2.0,
            min: 1.0,
            sum: None,
            avg: None,
            median: 2.0,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(!json.contains("sum"));
        assert!(!json.contains("avg"));
    }

    #[test]
    fn test_region_year_accessors() {
        let stats = SummaryStats {
            max: 1.0,
            min: 1.0,
            sum: Some(1.0),
            avg: Some(1.0),
            median: 1.0,
        };
        let mut years = GroupedStats::new();
        years.insert(GroupKey::from(2020), stats);
        years.insert(GroupKey::from(2021), stats);
        let mut inner = BTreeMap::new();
        inner.insert(GroupKey::from("A"), years);
        let nested = RegionYearStats::new(inner);

        assert!(nested.get(&GroupKey::from("A"), &GroupKey::from(2020)).is_some());
        assert!(nested.get(&GroupKey::from("B"), &GroupKey::from(2020)).is_none());
        assert_eq!(nested.years(&GroupKey::from("A")).len(), 2);
        assert_eq!(nested.leaf_count(), 2);

        let json = serde_json::to_string(&nested).unwrap();
        assert!(json.contains("\"A\":{\"2020\""));
    }
}
