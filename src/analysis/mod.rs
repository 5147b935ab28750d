//! Query result statistics.
//!
//! Column classification, fact extraction and the min/max/average
//! aggregation built on top of them.

pub mod aggregator;
pub mod classify;
pub mod error;

pub use aggregator::{AggregatorOptions, EmptyColumnPolicy, StatsAggregator};
pub use error::StatsError;
