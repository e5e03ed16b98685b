//! Descriptive statistics for single columns.

use crate::profiler::frequency::value_counts;
use crate::utils::{DtypeCategory, get_dtype_category, numeric_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// count / mean / std / min / quartiles / max of a numeric column.
///
/// Every statistic is `None` when the column has no values (and `std` also
/// when it has a single one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Most frequent value of a categorical column and how often it occurs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub top: Option<String>,
    pub freq: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryStats {
    Numeric(NumericSummary),
    Categorical(CategoricalSummary),
}

/// Summary of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub dtype: String,
    /// Non-missing values
    pub count: usize,
    pub missing: usize,
    /// Distinct non-missing values
    pub unique: usize,
    pub stats: SummaryStats,
}

impl ColumnSummary {
    pub fn numeric(&self) -> Option<&NumericSummary> {
        match &self.stats {
            SummaryStats::Numeric(summary) => Some(summary),
            SummaryStats::Categorical(_) => None,
        }
    }

    pub fn categorical(&self) -> Option<&CategoricalSummary> {
        match &self.stats {
            SummaryStats::Categorical(summary) => Some(summary),
            SummaryStats::Numeric(_) => None,
        }
    }
}

/// Describe a column: numeric statistics for numeric dtypes, top value and
/// frequency for everything else.
///
/// For numeric columns NaN counts as missing, so `count` always equals the
/// count of the numeric statistics.
pub fn describe_column(series: &Series) -> PolarsResult<ColumnSummary> {
    let (count, unique, stats) = match get_dtype_category(series.dtype()) {
        DtypeCategory::Numeric => {
            let values = numeric_values(series)?;
            let mut distinct = values.clone();
            distinct.sort_by(f64::total_cmp);
            distinct.dedup();
            (
                values.len(),
                distinct.len(),
                SummaryStats::Numeric(describe_values(&values)),
            )
        }
        _ => {
            let counts = value_counts(series)?;
            let top = counts.most_frequent();
            let stats = SummaryStats::Categorical(CategoricalSummary {
                top: top.map(|e| e.value.clone()),
                freq: top.map(|e| e.count).unwrap_or(0),
            });
            (counts.total, counts.distinct(), stats)
        }
    };

    Ok(ColumnSummary {
        column: series.name().to_string(),
        dtype: series.dtype().to_string(),
        count,
        missing: series.len() - count,
        unique,
        stats,
    })
}

/// Numeric statistics over a slice of values.
pub fn describe_values(values: &[f64]) -> NumericSummary {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    NumericSummary {
        count: sorted.len(),
        mean: mean(&sorted),
        std: sample_std(&sorted),
        min: sorted.first().copied(),
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() as f64 - 1.0);
    Some(variance.sqrt())
}

/// Quantile of sorted values, interpolating linearly between neighbours.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_describe_values_basic() {
        let summary = describe_values(&[5.0, 1.0, 3.0, 2.0, 4.0]);
        assert_eq!(summary.count, 5);
        assert!(approx(summary.mean, 3.0));
        // Variance = 10 / 4 = 2.5
        assert!(approx(summary.std, 2.5f64.sqrt()));
        assert!(approx(summary.min, 1.0));
        assert!(approx(summary.q25, 2.0));
        assert!(approx(summary.median, 3.0));
        assert!(approx(summary.q75, 4.0));
        assert!(approx(summary.max, 5.0));
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(quantile(&sorted, 0.25), 1.75));
        assert!(approx(quantile(&sorted, 0.5), 2.5));
        assert!(approx(quantile(&sorted, 0.75), 3.25));
        assert_eq!(quantile(&sorted, 1.5), None);
    }

    #[test]
    fn test_describe_empty_and_single() {
        let empty = describe_values(&[]);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.mean, None);
        assert_eq!(empty.median, None);

        let single = describe_values(&[7.0]);
        assert!(approx(single.mean, 7.0));
        assert_eq!(single.std, None);
        assert!(approx(single.q75, 7.0));
    }

    #[test]
    fn test_describe_numeric_column() {
        let series = Series::new("price".into(), &[Some(10_000i64), None, Some(20_000)]);
        let summary = describe_column(&series).unwrap();
        assert_eq!(summary.column, "price");
        assert_eq!(summary.count, 2);
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.unique, 2);
        assert!(approx(summary.numeric().unwrap().mean, 15_000.0));
    }

    #[test]
    fn test_describe_float_column_with_nan() {
        let series = Series::new("price".into(), &[Some(1.0f64), Some(f64::NAN), None, Some(3.0)]);
        let summary = describe_column(&series).unwrap();
        let numeric = summary.numeric().unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(numeric.count, summary.count);
        assert_eq!(summary.missing, 2);
        assert_eq!(summary.unique, 2);
        assert!(approx(numeric.mean, 2.0));
    }

    #[test]
    fn test_describe_categorical_column() {
        let series = Series::new(
            "brand".into(),
            &[Some("audi"), Some("bmw"), Some("audi"), None],
        );
        let summary = describe_column(&series).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.unique, 2);
        let categorical = summary.categorical().unwrap();
        assert_eq!(categorical.top.as_deref(), Some("audi"));
        assert_eq!(categorical.freq, 2);
    }
}
