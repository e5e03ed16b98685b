//! Data profiling module for listing tables.
//!
//! This module provides:
//! - Per-column descriptive statistics (numeric and categorical)
//! - Frequency tables with deterministic ordering
//! - Date distributions of timestamp columns
//! - Column explorations combining the three for outlier hunting

mod dates;
mod frequency;
mod statistics;

pub use dates::{DateDistribution, date_distribution, parse_date_prefix};
pub use frequency::{FrequencyEntry, FrequencyTable, distinct_count, value_counts};
pub use statistics::{
    CategoricalSummary, ColumnSummary, NumericSummary, SummaryStats, describe_column,
    describe_values, mean, quantile, sample_std,
};

use crate::error::{Result, ResultExt};
use crate::schema::require_columns;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Everything needed to judge whether a column holds implausible values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnExploration {
    pub column: String,
    /// Distinct non-missing values
    pub distinct: usize,
    pub summary: ColumnSummary,
    /// Most frequent values first
    pub most_frequent: FrequencyTable,
    /// Highest values first
    pub highest_values: FrequencyTable,
}

/// Data profiler for listing tables.
pub struct DataProfiler;

impl DataProfiler {
    /// Describe every column of a table, in column order.
    pub fn describe_table(df: &DataFrame) -> Result<Vec<ColumnSummary>> {
        let mut summaries = Vec::with_capacity(df.width());
        for col in df.get_columns() {
            let series = col.as_materialized_series();
            let summary = describe_column(series)
                .context(format!("Describing column '{}'", series.name()))?;
            summaries.push(summary);
        }
        debug!("Described {} columns", summaries.len());
        Ok(summaries)
    }

    /// Describe one named column.
    pub fn describe(df: &DataFrame, column: &str) -> Result<ColumnSummary> {
        let series = Self::series(df, column)?;
        Ok(describe_column(series)?)
    }

    /// Frequency table of one named column.
    pub fn value_counts(df: &DataFrame, column: &str) -> Result<FrequencyTable> {
        let series = Self::series(df, column)?;
        Ok(value_counts(series)?)
    }

    /// Summary, distinct count and both frequency views of a column.
    ///
    /// `limit` truncates the two frequency views; `None` keeps every value.
    pub fn explore(df: &DataFrame, column: &str, limit: Option<usize>) -> Result<ColumnExploration> {
        let series = Self::series(df, column)?;
        let counts = value_counts(series)?;
        let highest = counts.sorted_by_value(false);

        let (most_frequent, highest_values) = match limit {
            Some(n) => (counts.head(n), highest.head(n)),
            None => (counts.clone(), highest),
        };

        Ok(ColumnExploration {
            column: column.to_string(),
            distinct: counts.distinct(),
            summary: describe_column(series)?,
            most_frequent,
            highest_values,
        })
    }

    /// Date distribution of one named column.
    pub fn date_distribution(df: &DataFrame, column: &str, width: usize) -> Result<DateDistribution> {
        let series = Self::series(df, column)?;
        Ok(date_distribution(series, width)?)
    }

    fn series<'a>(df: &'a DataFrame, column: &str) -> Result<&'a Series> {
        require_columns(df, &[column])?;
        Ok(df.column(column)?.as_materialized_series())
    }
}
