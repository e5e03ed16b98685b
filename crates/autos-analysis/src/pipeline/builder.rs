//! Main analysis pipeline module.
//!
//! [`Pipeline`] threads a listing table through the executor steps and
//! assembles the [`AnalysisReport`].

use crate::config::{AnalysisConfig, ConfigValidationError};
use crate::error::{Result, ResultExt};
use crate::loader::CsvLoader;
use crate::pipeline::AnalysisExecutor;
use crate::pipeline::progress::{
    AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::types::{AnalysisOutcome, AnalysisReport, AnalysisSummary, SchemaSection};
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Share of removed rows above which the summary carries a warning.
const HIGH_ROW_LOSS_PERCENT: f64 = 30.0;

/// The analysis pipeline.
///
/// Use [`Pipeline::builder()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use autos_analysis::{AnalysisConfig, Pipeline};
///
/// let result = Pipeline::builder()
///     .config(AnalysisConfig::builder().top_brands(5).build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run("autos.csv")?;
///
/// println!("{} rows survived the filters", result.cleaned.height());
/// ```
pub struct Pipeline {
    executor: AnalysisExecutor,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.executor.config()
    }

    /// Load a file and analyze it.
    pub fn run(&self, path: impl AsRef<Path>) -> Result<AnalysisOutcome> {
        let path = path.as_ref();
        self.finish(self.run_internal(path))
    }

    /// Analyze a table that is already in memory.
    ///
    /// `source` only labels the report.
    pub fn analyze(&self, df: &DataFrame, source: &str) -> Result<AnalysisOutcome> {
        let start = Instant::now();
        self.finish(self.analyze_internal(df, source, "utf-8", 0, start))
    }

    fn finish(&self, result: Result<AnalysisOutcome>) -> Result<AnalysisOutcome> {
        match result {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Analysis complete: {} of {} rows retained",
                    result.report.summary.rows_final, result.report.summary.rows_loaded
                )));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_internal(&self, path: &Path) -> Result<AnalysisOutcome> {
        let start = Instant::now();

        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Loading,
            0.0,
            format!("Loading {}", path.display()),
        ));
        let loaded = CsvLoader::from_config(self.config())?.load(path)?;
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Loading,
            1.0,
            format!("Loaded {} rows", loaded.data.height()),
        ));

        let source = path.display().to_string();
        self.analyze_internal(
            &loaded.data,
            &source,
            &loaded.encoding,
            loaded.replaced_characters,
            start,
        )
    }

    fn analyze_internal(
        &self,
        raw: &DataFrame,
        source: &str,
        encoding: &str,
        replaced_characters: usize,
        start: Instant,
    ) -> Result<AnalysisOutcome> {
        let executor = &self.executor;
        info!("Starting analysis of {} ({} rows)", source, raw.height());
        let mut summary = AnalysisSummary::new(raw.height());
        if replaced_characters > 0 {
            summary.add_warning(format!(
                "{} characters could not be decoded as {}",
                replaced_characters, encoding
            ));
        }

        // Step 1: Normalize column names
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Normalizing,
            0.0,
            "Normalizing column names...",
        ));
        let (df, normalized) = executor.normalize(raw).context("Normalizing column names")?;

        // Step 2: Describe every column
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Profiling,
            0.0,
            format!("Describing {} columns...", df.width()),
        ));
        let initial_summary = executor.describe(&df)?;

        // Step 3: Low-value columns
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::DroppingColumns,
            0.0,
            "Recording low-value columns...",
        ));
        let (df, dropped_columns) = executor.drop_low_value_columns(&df)?;
        for column in &dropped_columns.outcome.missing {
            summary.add_warning(format!("Column '{}' marked for dropping was not found", column));
        }

        // Step 4: Clarity renames
        let (df, clarity_renames) = executor
            .rename_for_clarity(&df)
            .context("Renaming columns for clarity")?;
        executor.check_required_columns(&df)?;
        let schema = SchemaSection {
            normalized,
            clarity_renames,
        };
        let odometer = executor.explore_odometer(&df)?;

        // Step 5: Range filters
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Filtering,
            0.0,
            "Filtering prices...",
        ));
        let (df, price) = executor.filter_prices(&df).context("Filtering prices")?;
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Filtering,
            0.5,
            "Filtering registration years...",
        ));
        let (df, registration_year) = executor
            .filter_registration_years(&df)
            .context("Filtering registration years")?;

        // Step 6: Date distributions
        let date_columns = &executor.config().date_columns;
        let mut date_distributions = Vec::with_capacity(date_columns.len());
        for (i, column) in date_columns.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_items(
                AnalysisStage::DateAnalysis,
                column.as_str(),
                i,
                date_columns.len(),
                format!("Date distribution of '{}'...", column),
            ));
            match executor.date_distribution(&df, column)? {
                Some(dist) => date_distributions.push(dist),
                None => summary.add_warning(format!("Date column '{}' not found", column)),
            }
        }

        // Step 7: Brands
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Aggregating,
            0.0,
            "Aggregating brands...",
        ));
        let brands = executor.aggregate_brands(&df)?;

        summary.rows_final = df.height();
        summary.columns_final = df.width();
        summary.duration_ms = start.elapsed().as_millis() as u64;
        if summary.rows_removed_percentage() > HIGH_ROW_LOSS_PERCENT {
            warn!(
                "{:.1}% of rows were removed by the filters",
                summary.rows_removed_percentage()
            );
            summary.add_warning(format!(
                "High data loss: {:.1}% of rows were removed",
                summary.rows_removed_percentage()
            ));
        }

        info!(
            "Analysis finished in {} ms: {} -> {} rows",
            summary.duration_ms, summary.rows_loaded, summary.rows_final
        );

        let report = AnalysisReport {
            generated_at: chrono::Local::now().to_rfc3339(),
            source: source.to_string(),
            encoding: encoding.to_string(),
            replaced_characters,
            rows_loaded: raw.height(),
            columns_loaded: raw.width(),
            schema,
            initial_summary,
            dropped_columns,
            odometer,
            price,
            registration_year,
            date_distributions,
            brands,
            summary,
        };

        Ok(AnalysisOutcome {
            report,
            cleaned: df,
        })
    }
}

/// Builder for a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<AnalysisConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a custom progress reporter.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline, validating the configuration.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            executor: AnalysisExecutor::new(config),
            progress_reporter: self.progress_reporter,
        })
    }
}
