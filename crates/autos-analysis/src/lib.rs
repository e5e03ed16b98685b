//! Used-Car Listings Analysis Library
//!
//! Cleaning and aggregation of used-car listing tables, built on Polars.
//!
//! # Overview
//!
//! The pipeline runs once over an in-memory table:
//!
//! - **Loading**: delimited text in a single-byte encoding (Latin-1 by default)
//! - **Schema Normalization**: camelCase headers to snake_case, with named overrides
//! - **Column Drop**: low-value columns reported (and optionally removed)
//! - **Range Filtering**: price and registration year, with per-reason row counts
//! - **Profiling**: descriptive statistics, frequency tables, date distributions
//! - **Brand Aggregation**: mean price and mileage of the most frequent brands
//!
//! Every step returns a new table plus a typed result; [`reporting`] turns the
//! assembled [`AnalysisReport`] into text or JSON.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use autos_analysis::{AnalysisConfig, Pipeline};
//! use autos_analysis::reporting::{DisplayOptions, ReportFormatter};
//!
//! let result = Pipeline::builder()
//!     .config(AnalysisConfig::builder().top_brands(10).build()?)
//!     .build()?
//!     .run("autos.csv")?;
//!
//! print!("{}", ReportFormatter::render(&result.report, &DisplayOptions::default()));
//! ```
//!
//! # Individual Steps
//!
//! ```rust,ignore
//! use autos_analysis::cleaner::RangeFilter;
//! use autos_analysis::aggregation::BrandAggregator;
//!
//! let df = autos_analysis::load_table("autos.csv", "latin1")?;
//! let (df, _) = autos_analysis::schema::normalize_table(&df)?;
//! let (df, report) = RangeFilter::price().apply(&df)?;
//! println!("{} rows removed", report.rows_removed());
//!
//! let brands = BrandAggregator::new(10).aggregate(&df)?;
//! ```

pub mod aggregation;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use aggregation::{
    AggregateSort, AggregateSortKey, BrandAggregate, BrandAggregateTable, BrandAggregator,
};
pub use cleaner::{DroppedColumns, FilterReport, NumericRange, RangeBound, RangeFilter};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ColumnDropMode, ConfigValidationError};
pub use error::{AnalysisError, LoadError, Result as AnalysisResult, ResultExt, SchemaError};
pub use loader::{CsvLoader, LoadedTable, TextEncoding, load_table};
pub use pipeline::{
    AnalysisStage, ClosureProgressReporter, Pipeline, PipelineBuilder, ProgressReporter,
    ProgressUpdate,
};
pub use profiler::{ColumnSummary, DataProfiler, DateDistribution, FrequencyTable};
pub use reporting::{DisplayOptions, DisplayTable, ReportFormatter, ReportWriter};
pub use schema::{ColumnRename, normalize_column_names};
pub use types::{AnalysisReport, AnalysisOutcome, AnalysisSummary};
