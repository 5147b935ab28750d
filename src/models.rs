//! Data models for query results and their statistics.
//!
//! This module contains the read-only query result view consumed by the
//! aggregator, an owned snapshot implementation of it, and the statistics
//! and report structures produced from it.

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Type tag of a single data item inside a result column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataItemType {
    /// A measurable numeric value (e.g. revenue).
    Fact,
    /// A categorical/dimensional value (e.g. region).
    Attribute,
    /// Any other tag the host reports.
    Other(String),
}

impl fmt::Display for DataItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataItemType::Fact => write!(f, "fact"),
            DataItemType::Attribute => write!(f, "attribute"),
            DataItemType::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for DataItemType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "fact" => DataItemType::Fact,
            "attribute" => DataItemType::Attribute,
            other => DataItemType::Other(other.to_string()),
        }
    }
}

impl From<String> for DataItemType {
    fn from(s: String) -> Self {
        DataItemType::from(s.as_str())
    }
}

impl From<DataItemType> for String {
    fn from(t: DataItemType) -> Self {
        t.to_string()
    }
}

/// One constituent data item of a result column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    #[serde(rename = "type")]
    pub item_type: DataItemType,
    pub label: String,
}

#[cfg(test)]
impl DataItem {
    pub fn fact(label: &str) -> Self {
        Self {
            item_type: DataItemType::Fact,
            label: label.to_string(),
        }
    }

    pub fn attribute(label: &str) -> Self {
        Self {
            item_type: DataItemType::Attribute,
            label: label.to_string(),
        }
    }
}

/// A result column descriptor. Usually holds a single data item, but the
/// host may group several into one tuple column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    #[serde(rename = "dataItems", alias = "data_items")]
    pub data_items: Vec<DataItem>,
}

#[cfg(test)]
impl ResultItem {
    pub fn new(data_items: Vec<DataItem>) -> Self {
        Self { data_items }
    }
}

impl ResultItem {
    /// Label of the column: its data item labels joined with a comma.
    pub fn label(&self) -> String {
        self.data_items
            .iter()
            .map(|item| item.label.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether any constituent data item is attribute-typed.
    pub fn has_attribute(&self) -> bool {
        self.data_items
            .iter()
            .any(|item| item.item_type == DataItemType::Attribute)
    }
}

/// How a result column is treated by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Fact,
    Attribute,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Fact => write!(f, "fact"),
            ColumnKind::Attribute => write!(f, "attribute"),
        }
    }
}

/// Value of a fact cell.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactValue {
    #[serde(default)]
    pub value: Option<f64>,
}

/// A member of an attribute tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleMember {
    pub label: String,
}

/// A single cell of a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// `[{"label": ...}, ...]`
    Tuples(Vec<TupleMember>),
    /// `{"value": number|null}`
    Fact(FactValue),
}

#[cfg(test)]
impl Cell {
    pub fn fact(value: Option<f64>) -> Self {
        Cell::Fact(FactValue { value })
    }

    pub fn tuples(labels: &[&str]) -> Self {
        Cell::Tuples(
            labels
                .iter()
                .map(|l| TupleMember {
                    label: l.to_string(),
                })
                .collect(),
        )
    }
}

/// Read-only view of a fully materialized query result.
///
/// This is the only capability the aggregator needs from its host.
pub trait QueryResultView {
    /// Ordered list of column descriptors.
    fn result_items(&self) -> &[ResultItem];

    /// Number of rows.
    fn row_count(&self) -> usize;

    /// Cell at `(row, column)`. `None` when the host has no value there.
    fn value(&self, row: usize, column: usize) -> Option<&Cell>;
}

/// An owned query result snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Optional display name of the visualization the result came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Column descriptors.
    pub items: Vec<ResultItem>,
    /// Row-major cells. Rows shorter than `items` read as absent cells.
    #[serde(default)]
    pub rows: Vec<Vec<Option<Cell>>>,
}

impl QueryResultView for QueryResult {
    fn result_items(&self) -> &[ResultItem] {
        &self.items
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn value(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row)?.get(column)?.as_ref()
    }
}

/// An extreme (min or max) value and the attribute labels of its row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatValue {
    pub value: f64,
    #[serde(rename = "attributesLabel")]
    pub attributes_label: String,
}

/// Arithmetic mean of a fact column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvgValue {
    pub value: f64,
}

/// Statistics of a single fact column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactStats {
    /// Fact label. Serialized as the key of the enclosing `Stats` map.
    #[serde(skip)]
    pub label: String,
    /// Index of the column in the query result.
    pub column: usize,
    /// Number of non-null values the statistics were computed from.
    pub count: usize,
    pub min: StatValue,
    pub max: StatValue,
    pub avg: AvgValue,
}

/// Per-fact statistics in fact column discovery order.
///
/// Serializes as a map from fact label to statistics, keeping that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    entries: Vec<FactStats>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: FactStats) {
        self.entries.push(entry);
    }

    /// Look up the statistics of a fact by label.
    pub fn get(&self, label: &str) -> Option<&FactStats> {
        self.entries.iter().find(|e| e.label == label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }
}

impl Serialize for Stats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.label, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Stats {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StatsVisitor;

        impl<'de> Visitor<'de> for StatsVisitor {
            type Value = Stats;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of fact label to statistics")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Stats, A::Error> {
                let mut stats = Stats::new();
                while let Some((label, mut entry)) = map.next_entry::<String, FactStats>()? {
                    entry.label = label;
                    stats.push(entry);
                }
                Ok(stats)
            }
        }

        deserializer.deserialize_map(StatsVisitor)
    }
}

impl<'a> IntoIterator for &'a Stats {
    type Item = &'a FactStats;
    type IntoIter = std::slice::Iter<'a, FactStats>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Outcome of processing one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotReport {
    /// Display name of the snapshot.
    pub name: String,
    /// Source file path.
    pub source: String,
    /// Number of rows in the query result.
    pub row_count: usize,
    /// Computed statistics (absent when processing failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
    /// Error message if loading or aggregation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SnapshotReport {
    /// Creates a successful snapshot report.
    pub fn computed(name: String, source: String, row_count: usize, stats: Stats) -> Self {
        Self {
            name,
            source,
            row_count,
            stats: Some(stats),
            error: None,
        }
    }

    /// Creates a failed snapshot report.
    pub fn failed(name: String, source: String, error: String) -> Self {
        Self {
            name,
            source,
            row_count: 0,
            stats: None,
            error: Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Metadata about a statistics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report title.
    pub title: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of snapshots processed.
    pub snapshots: usize,
    /// Number of snapshots that failed.
    pub snapshots_failed: usize,
    /// Total number of fact columns with statistics.
    pub fact_columns: usize,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// The complete statistics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub snapshots: Vec<SnapshotReport>,
}
