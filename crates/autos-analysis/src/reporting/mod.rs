//! Report presentation.
//!
//! The pipeline produces a typed [`AnalysisReport`](crate::types::AnalysisReport);
//! this module turns it into text or JSON:
//! - [`ReportFormatter`] renders the human-readable report
//! - [`format_table_for_display`] renders a single [`DisplayTable`]
//! - [`ReportWriter`] saves the JSON report (`--emit-report` CLI flag)
//!
//! # Example
//!
//! ```rust,ignore
//! use autos_analysis::reporting::{DisplayOptions, ReportFormatter, ReportWriter};
//!
//! let result = pipeline.run("autos.csv")?;
//! print!("{}", ReportFormatter::render(&result.report, &DisplayOptions::default()));
//!
//! ReportWriter::new("outputs").write(&result.report, Path::new("autos.csv"))?;
//! ```

mod formatter;
mod writer;

pub use formatter::{Cell, DisplayOptions, DisplayTable, ReportFormatter, format_table_for_display};
pub use writer::{ReportWriter, report_stem};
