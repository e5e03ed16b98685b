//! Numeric range filtering.

use crate::error::{AnalysisError, Result};
use crate::schema::require_columns;
use crate::utils::{DtypeCategory, NumericCell, get_dtype_category, numeric_cells};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// One end of a numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RangeBound {
    /// The bound value itself is accepted
    Inclusive(f64),
    /// Only values strictly beyond the bound are accepted
    Exclusive(f64),
    /// No limit on this side
    Unbounded,
}

impl RangeBound {
    fn value(self) -> Option<f64> {
        match self {
            Self::Inclusive(v) | Self::Exclusive(v) => Some(v),
            Self::Unbounded => None,
        }
    }

    fn accepts_as_lower(self, v: f64) -> bool {
        match self {
            Self::Inclusive(b) => v >= b,
            Self::Exclusive(b) => v > b,
            Self::Unbounded => true,
        }
    }

    fn accepts_as_upper(self, v: f64) -> bool {
        match self {
            Self::Inclusive(b) => v <= b,
            Self::Exclusive(b) => v < b,
            Self::Unbounded => true,
        }
    }
}

/// Where a value falls relative to a [`NumericRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePosition {
    Below,
    Within,
    Above,
}

/// A numeric interval with independently open or closed ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub lower: RangeBound,
    pub upper: RangeBound,
}

impl NumericRange {
    pub fn new(lower: RangeBound, upper: RangeBound) -> Self {
        Self { lower, upper }
    }

    /// `(lower, upper)`
    pub fn exclusive(lower: f64, upper: f64) -> Self {
        Self::new(RangeBound::Exclusive(lower), RangeBound::Exclusive(upper))
    }

    /// `[lower, upper]`
    pub fn inclusive(lower: f64, upper: f64) -> Self {
        Self::new(RangeBound::Inclusive(lower), RangeBound::Inclusive(upper))
    }

    /// Whether the range can contain any value at all.
    pub fn is_valid(&self) -> bool {
        if self.lower.value().is_some_and(f64::is_nan) || self.upper.value().is_some_and(f64::is_nan)
        {
            return false;
        }
        match (self.lower, self.upper) {
            (RangeBound::Inclusive(lo), RangeBound::Inclusive(hi)) => lo <= hi,
            (lower, upper) => match (lower.value(), upper.value()) {
                (Some(lo), Some(hi)) => lo < hi,
                _ => true,
            },
        }
    }

    /// Locate a value relative to the range.
    pub fn position(&self, v: f64) -> RangePosition {
        if !self.lower.accepts_as_lower(v) {
            RangePosition::Below
        } else if !self.upper.accepts_as_upper(v) {
            RangePosition::Above
        } else {
            RangePosition::Within
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        self.position(v) == RangePosition::Within
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lower {
            RangeBound::Inclusive(v) => write!(f, "[{v}, ")?,
            RangeBound::Exclusive(v) => write!(f, "({v}, ")?,
            RangeBound::Unbounded => write!(f, "(-inf, ")?,
        }
        match self.upper {
            RangeBound::Inclusive(v) => write!(f, "{v}]"),
            RangeBound::Exclusive(v) => write!(f, "{v})"),
            RangeBound::Unbounded => write!(f, "inf)"),
        }
    }
}

/// Row counts for one application of a [`RangeFilter`].
///
/// Every removed row is attributed to exactly one reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterReport {
    pub column: String,
    pub range: String,
    pub rows_before: usize,
    pub rows_after: usize,
    pub removed_below: usize,
    pub removed_above: usize,
    pub removed_missing: usize,
    pub removed_non_numeric: usize,
}

impl FilterReport {
    pub fn rows_removed(&self) -> usize {
        self.rows_before - self.rows_after
    }

    pub fn removed_percent(&self) -> f64 {
        if self.rows_before == 0 {
            0.0
        } else {
            self.rows_removed() as f64 / self.rows_before as f64 * 100.0
        }
    }
}

/// Keeps the rows whose value in `column` lies inside `range`.
///
/// Rows with a missing or non-numeric value are removed too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    pub column: String,
    pub range: NumericRange,
}

impl RangeFilter {
    pub fn new(column: impl Into<String>, range: NumericRange) -> Self {
        Self {
            column: column.into(),
            range,
        }
    }

    /// Price strictly between 0 and 500000.
    pub fn price() -> Self {
        Self::new("price", NumericRange::exclusive(0.0, 500_000.0))
    }

    /// Registration year between 1900 and 2017, both included.
    pub fn registration_year() -> Self {
        Self::new("registration_year", NumericRange::inclusive(1900.0, 2017.0))
    }

    /// Return the filtered copy of `df` and the removal counts.
    ///
    /// # Errors
    ///
    /// [`SchemaError::MissingColumn`](crate::error::SchemaError::MissingColumn) if the column does not exist,
    /// [`AnalysisError::UnsupportedColumn`] if it is neither numeric nor text.
    pub fn apply(&self, df: &DataFrame) -> Result<(DataFrame, FilterReport)> {
        require_columns(df, &[self.column.as_str()])?;
        let series = df.column(&self.column)?.as_materialized_series();
        if !matches!(
            get_dtype_category(series.dtype()),
            DtypeCategory::Numeric | DtypeCategory::String
        ) {
            return Err(AnalysisError::UnsupportedColumn {
                column: self.column.clone(),
                operation: "range filtering".to_string(),
                reason: format!("values of type {} are not numbers", series.dtype()),
            });
        }
        let cells = numeric_cells(series)?;

        let mut report = FilterReport {
            column: self.column.clone(),
            range: self.range.to_string(),
            rows_before: df.height(),
            rows_after: 0,
            removed_below: 0,
            removed_above: 0,
            removed_missing: 0,
            removed_non_numeric: 0,
        };

        let keep: Vec<bool> = cells
            .into_iter()
            .map(|cell| match cell {
                NumericCell::Missing => {
                    report.removed_missing += 1;
                    false
                }
                NumericCell::Invalid => {
                    report.removed_non_numeric += 1;
                    false
                }
                NumericCell::Value(v) => match self.range.position(v) {
                    RangePosition::Below => {
                        report.removed_below += 1;
                        false
                    }
                    RangePosition::Above => {
                        report.removed_above += 1;
                        false
                    }
                    RangePosition::Within => true,
                },
            })
            .collect();

        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        let filtered = df.filter(&mask)?;
        report.rows_after = filtered.height();

        info!(
            "Filter {} in {}: kept {} of {} rows (below: {}, above: {}, missing: {}, non-numeric: {})",
            report.column,
            report.range,
            report.rows_after,
            report.rows_before,
            report.removed_below,
            report.removed_above,
            report.removed_missing,
            report.removed_non_numeric
        );

        Ok((filtered, report))
    }
}
