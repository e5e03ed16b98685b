//! Report types produced by the analysis pipeline.

use crate::aggregation::BrandAggregateTable;
use crate::cleaner::{DroppedColumns, FilterReport};
use crate::profiler::{ColumnExploration, ColumnSummary, DateDistribution, FrequencyTable};
use crate::schema::ColumnRename;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Everything the pipeline computed, in pipeline order.
///
/// The report holds typed values only; rendering lives in
/// [`crate::reporting`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Local time the analysis finished (RFC 3339)
    pub generated_at: String,
    pub source: String,
    pub encoding: String,
    /// Input bytes that could not be decoded and became U+FFFD
    pub replaced_characters: usize,
    pub rows_loaded: usize,
    pub columns_loaded: usize,
    pub schema: SchemaSection,
    /// `describe` of every column right after normalization
    pub initial_summary: Vec<ColumnSummary>,
    pub dropped_columns: DroppedColumnsSection,
    pub odometer: ColumnExploration,
    pub price: PriceSection,
    pub registration_year: RegistrationYearSection,
    pub date_distributions: Vec<DateDistribution>,
    pub brands: BrandSection,
    pub summary: AnalysisSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSection {
    /// One entry per source column, in order
    pub normalized: Vec<ColumnRename>,
    /// Renames applied after normalization
    pub clarity_renames: Vec<ColumnRename>,
}

impl SchemaSection {
    /// Columns whose name changed during normalization.
    pub fn changed(&self) -> impl Iterator<Item = &ColumnRename> {
        self.normalized.iter().filter(|r| r.is_changed())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroppedColumnsSection {
    pub outcome: DroppedColumns,
    /// Frequency table of each dropped column
    pub evidence: Vec<FrequencyTable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSection {
    pub before: ColumnExploration,
    pub filter: FilterReport,
    pub after: ColumnExploration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationYearSection {
    pub before: ColumnSummary,
    pub filter: FilterReport,
    /// Share of each year in the filtered table
    pub distribution: FrequencyTable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandSection {
    /// Share of every brand in the filtered table
    pub shares: FrequencyTable,
    pub aggregates: BrandAggregateTable,
}

/// Row accounting and warnings of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub rows_loaded: usize,
    pub rows_final: usize,
    pub columns_final: usize,
    pub duration_ms: u64,
    pub warnings: Vec<String>,
}

impl AnalysisSummary {
    pub fn new(rows_loaded: usize) -> Self {
        Self {
            rows_loaded,
            ..Self::default()
        }
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn rows_removed(&self) -> usize {
        self.rows_loaded.saturating_sub(self.rows_final)
    }

    /// Percentage of loaded rows removed by the filters.
    pub fn rows_removed_percentage(&self) -> f64 {
        if self.rows_loaded == 0 {
            return 0.0;
        }
        (self.rows_removed() as f64 / self.rows_loaded as f64) * 100.0
    }
}

/// Report plus the cleaned table it was computed from.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: AnalysisReport,
    pub cleaned: DataFrame,
}
