//! Frequency tables (value counts).

use crate::utils::{compare_values, text_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One distinct value and how often it occurs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
    /// Share of all non-missing values in the column
    pub proportion: f64,
}

/// Distinct values of a column with their counts.
///
/// Entries are ordered by count descending, ties by value ascending, unless
/// the table was re-sorted with [`FrequencyTable::sorted_by_value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyTable {
    pub column: String,
    /// Number of non-missing values
    pub total: usize,
    pub missing: usize,
    pub entries: Vec<FrequencyEntry>,
}

impl FrequencyTable {
    /// Count values. `None` counts as missing.
    pub fn from_values<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut missing = 0;
        for value in values {
            match value {
                Some(v) => *counts.entry(v.as_ref().to_string()).or_insert(0) += 1,
                None => missing += 1,
            }
        }

        let total: usize = counts.values().sum();
        let mut entries: Vec<FrequencyEntry> = counts
            .into_iter()
            .map(|(value, count)| FrequencyEntry {
                value,
                count,
                proportion: if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64
                },
            })
            .collect();
        entries.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| compare_values(&a.value, &b.value))
        });

        Self {
            column: column.into(),
            total,
            missing,
            entries,
        }
    }

    /// Number of distinct values.
    pub fn distinct(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn most_frequent(&self) -> Option<&FrequencyEntry> {
        self.entries.first()
    }

    pub fn get(&self, value: &str) -> Option<&FrequencyEntry> {
        self.entries.iter().find(|e| e.value == value)
    }

    /// The first `n` entries in the current order.
    pub fn head(&self, n: usize) -> Self {
        Self {
            entries: self.entries.iter().take(n).cloned().collect(),
            ..self.clone()
        }
    }

    /// Re-order by value (numeric order when both values are numbers).
    pub fn sorted_by_value(&self, ascending: bool) -> Self {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| {
            let ord = compare_values(&a.value, &b.value);
            if ascending { ord } else { ord.reverse() }
        });
        Self {
            entries,
            ..self.clone()
        }
    }
}

/// Frequency table of a series; values are compared by their text form.
pub fn value_counts(series: &Series) -> PolarsResult<FrequencyTable> {
    Ok(FrequencyTable::from_values(
        series.name().to_string(),
        text_values(series)?,
    ))
}

/// Number of distinct non-missing values.
pub fn distinct_count(series: &Series) -> PolarsResult<usize> {
    series.drop_nulls().n_unique()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(table: &FrequencyTable) -> Vec<&str> {
        table.entries.iter().map(|e| e.value.as_str()).collect()
    }

    #[test]
    fn test_counts_and_order() {
        let table = FrequencyTable::from_values(
            "brand",
            [Some("bmw"), Some("audi"), Some("opel"), Some("audi"), None, Some("bmw")],
        );
        assert_eq!(table.total, 5);
        assert_eq!(table.missing, 1);
        assert_eq!(table.distinct(), 3);
        // audi and bmw tie at 2, broken alphabetically
        assert_eq!(values(&table), vec!["audi", "bmw", "opel"]);
        assert!((table.get("opel").unwrap().proportion - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_sorted_by_value_is_numeric_aware() {
        let table = FrequencyTable::from_values(
            "odometer_km",
            ["150000", "5000", "150000", "90000"].map(Some),
        );
        assert_eq!(
            values(&table.sorted_by_value(false)),
            vec!["150000", "90000", "5000"]
        );
        assert_eq!(
            values(&table.sorted_by_value(true)),
            vec!["5000", "90000", "150000"]
        );
    }

    #[test]
    fn test_head() {
        let table = FrequencyTable::from_values("x", ["a", "b", "b", "c"].map(Some));
        let head = table.head(1);
        assert_eq!(values(&head), vec!["b"]);
        assert_eq!(head.total, 4);
    }

    #[test]
    fn test_value_counts_numeric_series() {
        let series = Series::new("price".into(), &[Some(0i64), Some(500), Some(0), None]);
        let table = value_counts(&series).unwrap();
        assert_eq!(table.column, "price");
        assert_eq!(table.most_frequent().unwrap().value, "0");
        assert_eq!(table.most_frequent().unwrap().count, 2);
        assert_eq!(table.missing, 1);
    }

    #[test]
    fn test_distinct_count_ignores_nulls() {
        let series = Series::new("seller".into(), &[Some("privat"), None, Some("privat")]);
        assert_eq!(distinct_count(&series).unwrap(), 1);
    }

    #[test]
    fn test_empty_table() {
        let table = FrequencyTable::from_values("x", Vec::<Option<String>>::new());
        assert!(table.is_empty());
        assert_eq!(table.most_frequent(), None);
    }
}
