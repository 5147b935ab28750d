//! Typed host capabilities.
//!
//! A dashboard host hands its plugins a set of features. Here each feature
//! is a trait, and a plugin receives the ones it needs at construction.

use crate::analysis::{AggregatorOptions, StatsAggregator, StatsError};
use crate::models::{QueryResult, QueryResultView, Stats};
use tracing::debug;

/// Access to the result of the query currently backing a visualization.
pub trait DataQueryExecution {
    type Result: QueryResultView;

    /// The current query result, if the visualization has executed one.
    fn current_query_result(&self) -> Option<&Self::Result>;
}

/// A feature that exposes data statistics of a visualization.
pub trait StatsProvider {
    /// Statistics of the current query result, or `None` if there is none.
    fn stats(&self) -> Result<Option<Stats>, StatsError>;
}

/// Data statistics feature for a visualization.
///
/// Statistics are recomputed on every call, so the result always reflects
/// the query result the host holds at that moment.
pub struct VizDataStats<Q> {
    query: Q,
    aggregator: StatsAggregator,
}

impl<Q: DataQueryExecution> VizDataStats<Q> {
    pub fn new(query: Q, options: AggregatorOptions) -> Self {
        Self {
            query,
            aggregator: StatsAggregator::new(options),
        }
    }
}

impl<Q: DataQueryExecution> StatsProvider for VizDataStats<Q> {
    fn stats(&self) -> Result<Option<Stats>, StatsError> {
        match self.query.current_query_result() {
            Some(result) => self.aggregator.compute_stats(result).map(Some),
            None => {
                debug!("No current query result; nothing to compute");
                Ok(None)
            }
        }
    }
}

/// A query capability backed by a fixed, already loaded result.
#[derive(Debug, Clone, Default)]
pub struct StaticQuery {
    result: Option<QueryResult>,
}

impl StaticQuery {
    pub fn new(result: QueryResult) -> Self {
        Self {
            result: Some(result),
        }
    }
}

impl DataQueryExecution for StaticQuery {
    type Result = QueryResult;

    fn current_query_result(&self) -> Option<&QueryResult> {
        self.result.as_ref()
    }
}

impl<T: DataQueryExecution + ?Sized> DataQueryExecution for &T {
    type Result = T::Result;

    fn current_query_result(&self) -> Option<&Self::Result> {
        (**self).current_query_result()
    }
}
