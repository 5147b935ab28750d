//! Errors raised while computing query result statistics.

use crate::models::ColumnKind;
use thiserror::Error;

/// Failure of a statistics computation.
///
/// The aggregator never recovers from these on its own; the caller decides
/// whether to render a fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// A fact column has no non-null values, so min/max/average are undefined.
    #[error("fact column '{label}' has no data")]
    EmptyColumn { label: String },

    /// A column classified as fact does not hold exactly one data item.
    #[error("fact column {column} ('{label}') has {data_items} data items, expected exactly 1")]
    MalformedColumn {
        column: usize,
        label: String,
        data_items: usize,
    },

    /// Two columns of the same kind share a label.
    #[error("duplicate {kind} label '{label}'")]
    DuplicateLabel { kind: ColumnKind, label: String },

    /// A cell does not match the kind of its column.
    #[error("unexpected cell at row {row}, column {column}: expected {expected} value")]
    UnexpectedCell {
        row: usize,
        column: usize,
        expected: ColumnKind,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StatsError::EmptyColumn {
            label: "Revenue".to_string(),
        };
        assert_eq!(err.to_string(), "fact column 'Revenue' has no data");

        let err = StatsError::UnexpectedCell {
            row: 3,
            column: 1,
            expected: ColumnKind::Attribute,
        };
        assert!(err.to_string().contains("expected attribute value"));
    }
}
