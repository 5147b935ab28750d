//! Per-fact statistics over a query result.
//!
//! For every fact column this computes the minimum, maximum and average of
//! its non-null values, and annotates the extremes with the attribute labels
//! of the row they occur in.

use super::classify::{classify, ColumnIndex, LabelIndex};
use super::error::StatsError;
use crate::models::{AvgValue, Cell, ColumnKind, FactStats, FactValue, QueryResultView, StatValue, Stats};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What to do with a fact column that has no values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyColumnPolicy {
    /// Abort the whole aggregation with `StatsError::EmptyColumn`.
    #[default]
    Fail,
    /// Leave the column out of the result.
    Skip,
}

/// Options controlling the aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregatorOptions {
    pub empty_columns: EmptyColumnPolicy,
    pub reject_duplicate_labels: bool,
}

/// Non-null values of one fact column, in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct FactColumnData {
    pub label: String,
    pub column: usize,
    pub values: Vec<f64>,
    /// Original row index of each entry in `values`.
    pub rows: Vec<usize>,
}

/// Stateless statistics aggregator.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsAggregator {
    options: AggregatorOptions,
}

impl StatsAggregator {
    pub fn new(options: AggregatorOptions) -> Self {
        Self { options }
    }

    /// Compute statistics for every fact column of the query result.
    ///
    /// Entries appear in fact column discovery order. Nothing is retained
    /// between calls.
    pub fn compute_stats<V>(&self, view: &V) -> Result<Stats, StatsError>
    where
        V: QueryResultView + ?Sized,
    {
        let index = classify(view.result_items(), &self.options)?;
        if index.facts.is_empty() {
            debug!("No fact columns among {} column(s)", view.result_items().len());
            return Ok(Stats::new());
        }

        let data = extract_fact_data(view, &index.facts)?;

        let mut stats = Stats::new();
        for column in data {
            match self.column_stats(view, &index, &column)? {
                Some(entry) => stats.push(entry),
                None => warn!("Skipping fact column '{}': no data", column.label),
            }
        }

        info!(
            "Computed statistics for {} fact column(s) over {} row(s)",
            stats.len(),
            view.row_count()
        );
        Ok(stats)
    }

    fn column_stats<V>(
        &self,
        view: &V,
        index: &ColumnIndex,
        data: &FactColumnData,
    ) -> Result<Option<FactStats>, StatsError>
    where
        V: QueryResultView + ?Sized,
    {
        let (min_at, max_at) = match (first_min(&data.values), first_max(&data.values)) {
            (Some(min_at), Some(max_at)) => (min_at, max_at),
            _ => {
                return match self.options.empty_columns {
                    EmptyColumnPolicy::Fail => Err(StatsError::EmptyColumn {
                        label: data.label.clone(),
                    }),
                    EmptyColumnPolicy::Skip => Ok(None),
                }
            }
        };

        let min = StatValue {
            value: data.values[min_at],
            attributes_label: attributes_label(view, &index.attributes, data.rows[min_at])?,
        };
        let max = StatValue {
            value: data.values[max_at],
            attributes_label: attributes_label(view, &index.attributes, data.rows[max_at])?,
        };

        let avg = running_mean(&data.values).clamp(min.value, max.value);

        debug!(
            "'{}': min {} (row {}), max {} (row {}), avg {}",
            data.label, min.value, data.rows[min_at], max.value, data.rows[max_at], avg
        );

        Ok(Some(FactStats {
            label: data.label.clone(),
            column: data.column,
            count: data.values.len(),
            min,
            max,
            avg: AvgValue { value: avg },
        }))
    }
}

/// Collect the non-null values of every fact column, scanning rows in order.
pub fn extract_fact_data<V>(view: &V, facts: &LabelIndex) -> Result<Vec<FactColumnData>, StatsError>
where
    V: QueryResultView + ?Sized,
{
    let row_count = view.row_count();
    let mut data = Vec::with_capacity(facts.len());

    for (label, column) in facts.iter() {
        let mut values = Vec::with_capacity(row_count);
        let mut rows = Vec::with_capacity(row_count);

        for row in 0..row_count {
            match view.value(row, column) {
                Some(Cell::Fact(FactValue { value: Some(v) })) if !v.is_nan() => {
                    values.push(*v);
                    rows.push(row);
                }
                Some(Cell::Fact(_)) | None => {}
                Some(Cell::Tuples(_)) => {
                    return Err(StatsError::UnexpectedCell {
                        row,
                        column,
                        expected: ColumnKind::Fact,
                    })
                }
            }
        }

        data.push(FactColumnData {
            label: label.to_string(),
            column,
            values,
            rows,
        });
    }

    Ok(data)
}

/// Build the attribute label of a row.
///
/// Each attribute column contributes its tuple labels joined with a comma;
/// an absent cell contributes nothing. Column contributions are joined with
/// a comma as well.
pub fn attributes_label<V>(view: &V, attributes: &LabelIndex, row: usize) -> Result<String, StatsError>
where
    V: QueryResultView + ?Sized,
{
    let mut parts = Vec::with_capacity(attributes.len());

    for (_, column) in attributes.iter() {
        match view.value(row, column) {
            Some(Cell::Tuples(members)) => parts.push(
                members
                    .iter()
                    .map(|m| m.label.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            None => {}
            Some(Cell::Fact(_)) => {
                return Err(StatsError::UnexpectedCell {
                    row,
                    column,
                    expected: ColumnKind::Attribute,
                })
            }
        }
    }

    Ok(parts.join(","))
}

/// Arithmetic mean as a left fold of running means.
///
/// Each step adds `v/n - acc/n`, so no intermediate exceeds the magnitude
/// of the inputs and the result stays finite for any finite values.
fn running_mean(values: &[f64]) -> f64 {
    values.iter().enumerate().fold(0.0, |acc, (i, &v)| {
        let n = (i + 1) as f64;
        acc + (v / n - acc / n)
    })
}

/// Position of the first occurrence of the minimum.
fn first_min(values: &[f64]) -> Option<usize> {
    first_extreme(values, |candidate, best| candidate < best)
}

/// Position of the first occurrence of the maximum.
fn first_max(values: &[f64]) -> Option<usize> {
    first_extreme(values, |candidate, best| candidate > best)
}

fn first_extreme(values: &[f64], beats: impl Fn(f64, f64) -> bool) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some(b) if !beats(v, values[b]) => {}
            _ => best = Some(i),
        }
    }
    best
}
