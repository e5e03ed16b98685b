//! Analysis executor module.
//!
//! Each step takes the working table by reference and returns a new table
//! together with the typed report fragment it produced.

use crate::aggregation::BrandAggregator;
use crate::cleaner::{RangeFilter, drop_columns};
use crate::config::AnalysisConfig;
use crate::error::{Result, ResultExt};
use crate::profiler::{ColumnSummary, DataProfiler, DateDistribution};
use crate::schema::{ColumnRename, normalize_table, rename_columns, require_columns};
use crate::types::{
    BrandSection, DroppedColumnsSection, PriceSection, RegistrationYearSection,
};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Values listed in the "most frequent" and "highest" price views.
pub const EXPLORATION_LIMIT: usize = 10;

/// Executes the analysis steps on a DataFrame.
#[derive(Debug, Clone)]
pub struct AnalysisExecutor {
    config: AnalysisConfig,
}

impl AnalysisExecutor {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Normalize column names to snake_case with the named overrides.
    pub fn normalize(&self, df: &DataFrame) -> Result<(DataFrame, Vec<ColumnRename>)> {
        let (normalized_df, normalized) = normalize_table(df)?;
        info!(
            "Normalized {} column names ({} changed)",
            normalized.len(),
            normalized.iter().filter(|r| r.is_changed()).count()
        );
        Ok((normalized_df, normalized))
    }

    /// Apply the configured clarity renames (`kilometer` to `odometer_km`).
    pub fn rename_for_clarity(&self, df: &DataFrame) -> Result<(DataFrame, Vec<ColumnRename>)> {
        let (renamed_df, applied) = rename_columns(df, &self.config.column_renames)?;
        debug!("Applied {} clarity renames", applied.len());
        Ok((renamed_df, applied))
    }

    /// Fail early when a column the later steps need is absent.
    pub fn check_required_columns(&self, df: &DataFrame) -> Result<()> {
        require_columns(
            df,
            &[
                self.config.price_column.as_str(),
                self.config.registration_year_column.as_str(),
                self.config.brand_column.as_str(),
                self.config.odometer_column.as_str(),
            ],
        )
        .context("Checking analysis columns")
    }

    pub fn describe(&self, df: &DataFrame) -> Result<Vec<ColumnSummary>> {
        DataProfiler::describe_table(df)
    }

    /// Record the frequency table of each low-value column, then drop them
    /// according to the configured mode.
    pub fn drop_low_value_columns(
        &self,
        df: &DataFrame,
    ) -> Result<(DataFrame, DroppedColumnsSection)> {
        let mut evidence = Vec::new();
        for column in &self.config.dropped_columns {
            if df.get_column_index(column).is_some() {
                evidence.push(DataProfiler::value_counts(df, column)?);
            }
        }

        let (table, outcome) =
            drop_columns(df, &self.config.dropped_columns, self.config.drop_mode)?;
        if !outcome.missing.is_empty() {
            warn!("Columns marked for dropping not found: {:?}", outcome.missing);
        }

        Ok((table, DroppedColumnsSection { outcome, evidence }))
    }

    pub fn explore_odometer(&self, df: &DataFrame) -> Result<crate::profiler::ColumnExploration> {
        DataProfiler::explore(df, &self.config.odometer_column, None)
    }

    /// Explore price, filter it, and explore it again.
    pub fn filter_prices(&self, df: &DataFrame) -> Result<(DataFrame, PriceSection)> {
        let column = &self.config.price_column;
        let before = DataProfiler::explore(df, column, Some(EXPLORATION_LIMIT))?;
        let (filtered, filter) =
            RangeFilter::new(column.as_str(), self.config.price_range).apply(df)?;
        let after = DataProfiler::explore(&filtered, column, Some(EXPLORATION_LIMIT))?;

        Ok((
            filtered,
            PriceSection {
                before,
                filter,
                after,
            },
        ))
    }

    /// Summarize registration years, filter them, and report the
    /// distribution of the survivors.
    pub fn filter_registration_years(
        &self,
        df: &DataFrame,
    ) -> Result<(DataFrame, RegistrationYearSection)> {
        let column = &self.config.registration_year_column;
        let before = DataProfiler::describe(df, column)?;
        let (filtered, filter) =
            RangeFilter::new(column.as_str(), self.config.registration_year_range).apply(df)?;
        let distribution = DataProfiler::value_counts(&filtered, column)?;

        Ok((
            filtered,
            RegistrationYearSection {
                before,
                filter,
                distribution,
            },
        ))
    }

    /// Date distribution of one timestamp column.
    ///
    /// Returns `None` when the column is absent.
    pub fn date_distribution(
        &self,
        df: &DataFrame,
        column: &str,
    ) -> Result<Option<DateDistribution>> {
        if df.get_column_index(column).is_none() {
            warn!("Date column '{}' not found, skipping", column);
            return Ok(None);
        }
        let dist = DataProfiler::date_distribution(df, column, self.config.date_prefix_width)?;
        debug!(
            "'{}': {} distinct dates from {:?} to {:?}",
            column,
            dist.by_date.distinct(),
            dist.earliest,
            dist.latest
        );
        Ok(Some(dist))
    }

    /// Brand shares and the aggregates of the most frequent brands.
    pub fn aggregate_brands(&self, df: &DataFrame) -> Result<BrandSection> {
        let shares = DataProfiler::value_counts(df, &self.config.brand_column)?;
        let table = BrandAggregator::from_config(&self.config).aggregate(df)?;
        let aggregates = match self.config.aggregate_sort {
            Some(sort) => table.sorted_by(sort),
            None => table,
        };
        Ok(BrandSection { shares, aggregates })
    }
}
