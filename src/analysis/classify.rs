//! Column classification.
//!
//! Splits the columns of a query result into fact and attribute columns and
//! builds a label -> column index map for each kind.

use super::aggregator::AggregatorOptions;
use super::error::StatsError;
use crate::models::{ColumnKind, ResultItem};
use tracing::{debug, warn};

/// Insertion-ordered label -> column index map.
///
/// Re-inserting a label replaces its column index but keeps the position of
/// the first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelIndex {
    entries: Vec<(String, usize)>,
}

impl LabelIndex {
    /// Insert a label, returning the column index it previously mapped to.
    pub fn insert(&mut self, label: String, column: usize) -> Option<usize> {
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => Some(std::mem::replace(&mut entry.1, column)),
            None => {
                self.entries.push((label, column));
                None
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, column)| *column)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fact and attribute index maps of a query result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnIndex {
    pub facts: LabelIndex,
    pub attributes: LabelIndex,
}

/// Classify a single column.
pub fn column_kind(item: &ResultItem) -> ColumnKind {
    if item.has_attribute() {
        ColumnKind::Attribute
    } else {
        ColumnKind::Fact
    }
}

/// Build the fact and attribute index maps for the given columns.
///
/// A fact column must hold exactly one data item.
pub fn classify(items: &[ResultItem], options: &AggregatorOptions) -> Result<ColumnIndex, StatsError> {
    let mut index = ColumnIndex::default();

    for (column, item) in items.iter().enumerate() {
        let kind = column_kind(item);
        let label = item.label();

        if kind == ColumnKind::Fact && item.data_items.len() != 1 {
            return Err(StatsError::MalformedColumn {
                column,
                label,
                data_items: item.data_items.len(),
            });
        }

        let map = match kind {
            ColumnKind::Fact => &mut index.facts,
            ColumnKind::Attribute => &mut index.attributes,
        };

        if options.reject_duplicate_labels && map.contains(&label) {
            return Err(StatsError::DuplicateLabel { kind, label });
        }

        debug!("Column {} '{}' classified as {}", column, label, kind);
        if let Some(previous) = map.insert(label.clone(), column) {
            warn!(
                "Duplicate {} label '{}': column {} replaces column {}",
                kind, label, column, previous
            );
        }
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataItem;

    fn fact(label: &str) -> ResultItem {
        ResultItem::new(vec![DataItem::fact(label)])
    }

    fn attribute(label: &str) -> ResultItem {
        ResultItem::new(vec![DataItem::attribute(label)])
    }

    #[test]
    fn test_classify_mixed_columns() {
        let items = vec![attribute("Region"), fact("Revenue"), fact("Cost")];
        let index = classify(&items, &AggregatorOptions::default()).unwrap();

        assert_eq!(index.attributes.get("Region"), Some(0));
        assert_eq!(index.facts.get("Revenue"), Some(1));
        assert_eq!(index.facts.get("Cost"), Some(2));
        let labels: Vec<_> = index.facts.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Revenue", "Cost"]);
    }

    #[test]
    fn test_any_attribute_item_makes_attribute_column() {
        let items = vec![ResultItem::new(vec![
            DataItem::fact("Revenue"),
            DataItem::attribute("Region"),
        ])];
        let index = classify(&items, &AggregatorOptions::default()).unwrap();

        assert!(index.facts.is_empty());
        assert_eq!(index.attributes.get("Revenue,Region"), Some(0));
    }

    #[test]
    fn test_multi_item_fact_column_is_malformed() {
        let items = vec![ResultItem::new(vec![
            DataItem::fact("Revenue"),
            DataItem::fact("Cost"),
        ])];
        let err = classify(&items, &AggregatorOptions::default()).unwrap_err();

        assert_eq!(
            err,
            StatsError::MalformedColumn {
                column: 0,
                label: "Revenue,Cost".to_string(),
                data_items: 2,
            }
        );
    }

    #[test]
    fn test_empty_column_descriptor_is_malformed() {
        let items = vec![ResultItem::new(vec![])];
        let err = classify(&items, &AggregatorOptions::default()).unwrap_err();
        assert!(matches!(err, StatsError::MalformedColumn { data_items: 0, .. }));
    }

    #[test]
    fn test_duplicate_label_overwrites_in_place() {
        let items = vec![fact("Revenue"), fact("Cost"), fact("Revenue")];
        let index = classify(&items, &AggregatorOptions::default()).unwrap();

        let entries: Vec<_> = index.facts.iter().collect();
        assert_eq!(entries, vec![("Revenue", 2), ("Cost", 1)]);
    }

    #[test]
    fn test_duplicate_label_rejected_when_configured() {
        let options = AggregatorOptions {
            reject_duplicate_labels: true,
            ..AggregatorOptions::default()
        };
        let items = vec![attribute("Region"), attribute("Region")];
        let err = classify(&items, &options).unwrap_err();

        assert_eq!(
            err,
            StatsError::DuplicateLabel {
                kind: ColumnKind::Attribute,
                label: "Region".to_string(),
            }
        );
    }

    #[test]
    fn test_same_label_in_both_kinds_is_not_duplicate() {
        let options = AggregatorOptions {
            reject_duplicate_labels: true,
            ..AggregatorOptions::default()
        };
        let items = vec![attribute("Year"), fact("Year")];
        let index = classify(&items, &options).unwrap();

        assert_eq!(index.attributes.get("Year"), Some(0));
        assert_eq!(index.facts.get("Year"), Some(1));
    }
}
