//! Shared utilities for the analysis pipeline.
//!
//! Helpers for reading polars columns as plain Rust values and for the
//! value ordering shared by frequency tables and aggregations.

use polars::prelude::*;
use std::cmp::Ordering;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Category of a data type for statistics purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Integer or floating point numbers
    Numeric,
    /// Date or datetime types
    Datetime,
    /// Boolean type
    Boolean,
    /// String/text type
    String,
    /// Other/unknown types
    Other,
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time
    )
}

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_numeric_dtype(dtype) {
        DtypeCategory::Numeric
    } else if is_datetime_dtype(dtype) {
        DtypeCategory::Datetime
    } else if matches!(dtype, DataType::Boolean) {
        DtypeCategory::Boolean
    } else if matches!(dtype, DataType::String | DataType::Categorical(_, _)) {
        DtypeCategory::String
    } else {
        DtypeCategory::Other
    }
}

// =============================================================================
// Column Extraction
// =============================================================================

/// A single cell read as a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericCell {
    /// Null or blank
    Missing,
    /// Present but not a number
    Invalid,
    /// A finite or infinite number (NaN is reported as `Invalid`)
    Value(f64),
}

impl NumericCell {
    /// The number, if there is one.
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing | Self::Invalid => None,
        }
    }
}

/// Parse a text cell as a number without any reformatting.
pub fn parse_numeric_cell(raw: Option<&str>) -> NumericCell {
    match raw.map(str::trim) {
        None | Some("") => NumericCell::Missing,
        Some(text) => match text.parse::<f64>() {
            Ok(v) if !v.is_nan() => NumericCell::Value(v),
            _ => NumericCell::Invalid,
        },
    }
}

/// Read every cell of a series as a number.
///
/// Numeric columns are cast to `Float64`; text columns are parsed cell by
/// cell. Any other type yields `Invalid` for every present value.
pub fn numeric_cells(series: &Series) -> PolarsResult<Vec<NumericCell>> {
    match get_dtype_category(series.dtype()) {
        DtypeCategory::Numeric => {
            let floats = series.cast(&DataType::Float64)?;
            Ok(floats
                .f64()?
                .into_iter()
                .map(|v| match v {
                    None => NumericCell::Missing,
                    Some(v) if v.is_nan() => NumericCell::Invalid,
                    Some(v) => NumericCell::Value(v),
                })
                .collect())
        }
        DtypeCategory::String => {
            let text = series.cast(&DataType::String)?;
            Ok(text.str()?.into_iter().map(parse_numeric_cell).collect())
        }
        _ => {
            let nulls = series.is_null();
            Ok(nulls
                .into_iter()
                .map(|is_null| {
                    if is_null.unwrap_or(true) {
                        NumericCell::Missing
                    } else {
                        NumericCell::Invalid
                    }
                })
                .collect())
        }
    }
}

/// Collect the present numeric values of a series, dropping everything else.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<f64>> {
    Ok(numeric_cells(series)?
        .into_iter()
        .filter_map(NumericCell::value)
        .collect())
}

/// Read every cell of a series as text (`None` for nulls).
pub fn text_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let text = series.cast(&DataType::String)?;
    Ok(text
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Keep the first `width` characters of a value.
pub fn truncate_chars(value: &str, width: usize) -> &str {
    match value.char_indices().nth(width) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

// =============================================================================
// Ordering
// =============================================================================

/// Compare two cell values: numerically when both parse as numbers,
/// lexicographically otherwise.
pub fn compare_values(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

/// Compare optional floats with `None` sorted after every number.
pub fn compare_optional_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// =============================================================================
// Tests
// =============================================================================
