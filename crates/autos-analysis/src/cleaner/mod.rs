//! Data cleaning operations for listing tables.
//!
//! This module provides:
//! - Numeric range filters with per-reason removal counts
//! - Dropping of low-value columns (advisory or effective)
//!
//! Both operations take a table by reference and return a new one.

mod columns;
mod range_filter;

pub use columns::{DroppedColumns, drop_columns};
pub use range_filter::{FilterReport, NumericRange, RangeBound, RangeFilter, RangePosition};
