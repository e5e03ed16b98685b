//! Configuration types for the listing analysis pipeline.
//!
//! Defaults reproduce the reference analysis of the used-car dataset:
//! Latin-1 input, `kilometer` renamed to `odometer_km`, price kept in
//! `(0, 500000)`, registration year kept in `[1900, 2017]` and the ten most
//! frequent brands aggregated.

use crate::aggregation::AggregateSort;
use crate::cleaner::{NumericRange, RangeBound};
use serde::{Deserialize, Serialize};

/// Upper limit for [`AnalysisConfig::float_precision`].
pub const MAX_FLOAT_PRECISION: usize = 10;

/// What to do with the low-value columns identified during exploration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDropMode {
    /// Report the columns as dropped but keep them in the working table
    #[default]
    Advisory,
    /// Remove the columns from the working table
    Remove,
}

/// Configuration for the analysis pipeline.
///
/// Use [`AnalysisConfig::builder()`] to override individual settings.
///
/// # Example
///
/// ```rust,ignore
/// use autos_analysis::config::{AnalysisConfig, ColumnDropMode};
///
/// let config = AnalysisConfig::builder()
///     .encoding("utf-8")
///     .top_brands(5)
///     .drop_mode(ColumnDropMode::Remove)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Encoding label of the input file (WHATWG label, e.g. "latin1").
    /// Default: "latin1"
    pub encoding: String,

    /// Field delimiter of the input file.
    /// Default: ','
    pub delimiter: char,

    /// Number of rows used for schema inference when loading.
    /// Default: 10000
    pub infer_schema_rows: usize,

    /// Renames applied after normalization, as (from, to) pairs.
    /// Default: [("kilometer", "odometer_km")]
    pub column_renames: Vec<(String, String)>,

    /// Columns considered low-value and dropped from the analysis.
    /// Default: ["seller", "offer_type", "num_photos"]
    pub dropped_columns: Vec<String>,

    /// Whether dropped columns leave the working table.
    /// Default: Advisory
    pub drop_mode: ColumnDropMode,

    /// Price column (normalized name).
    /// Default: "price"
    pub price_column: String,

    /// Accepted price range.
    /// Default: (0, 500000), both bounds exclusive
    pub price_range: NumericRange,

    /// Registration year column (normalized name).
    /// Default: "registration_year"
    pub registration_year_column: String,

    /// Accepted registration year range.
    /// Default: [1900, 2017], both bounds inclusive
    pub registration_year_range: NumericRange,

    /// Brand column (normalized name).
    /// Default: "brand"
    pub brand_column: String,

    /// Odometer column (name after renames).
    /// Default: "odometer_km"
    pub odometer_column: String,

    /// Number of most frequent brands to aggregate.
    /// Default: 10
    pub top_brands: usize,

    /// Optional ordering of the brand aggregate table.
    /// If None, brands stay in frequency order.
    /// Default: None
    pub aggregate_sort: Option<AggregateSort>,

    /// Timestamp-like columns analysed through their date prefix.
    /// Default: ["date_crawled", "ad_created", "last_seen"]
    pub date_columns: Vec<String>,

    /// Number of leading characters kept from timestamp values.
    /// Default: 10 (YYYY-MM-DD)
    pub date_prefix_width: usize,

    /// Digits after the decimal point in the text report.
    /// Default: 2
    pub float_precision: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            encoding: "latin1".to_string(),
            delimiter: ',',
            infer_schema_rows: 10_000,
            column_renames: vec![("kilometer".to_string(), "odometer_km".to_string())],
            dropped_columns: vec![
                "seller".to_string(),
                "offer_type".to_string(),
                "num_photos".to_string(),
            ],
            drop_mode: ColumnDropMode::default(),
            price_column: "price".to_string(),
            price_range: NumericRange::new(RangeBound::Exclusive(0.0), RangeBound::Exclusive(500_000.0)),
            registration_year_column: "registration_year".to_string(),
            registration_year_range: NumericRange::new(
                RangeBound::Inclusive(1900.0),
                RangeBound::Inclusive(2017.0),
            ),
            brand_column: "brand".to_string(),
            odometer_column: "odometer_km".to_string(),
            top_brands: 10,
            aggregate_sort: None,
            date_columns: vec![
                "date_crawled".to_string(),
                "ad_created".to_string(),
                "last_seen".to_string(),
            ],
            date_prefix_width: 10,
            float_precision: 2,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Load a configuration from a JSON document.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.delimiter.is_ascii() {
            return Err(ConfigValidationError::InvalidDelimiter(self.delimiter));
        }

        for (field, range) in [
            ("price_range", &self.price_range),
            ("registration_year_range", &self.registration_year_range),
        ] {
            if !range.is_valid() {
                return Err(ConfigValidationError::InvalidRange {
                    field: field.to_string(),
                    range: range.to_string(),
                });
            }
        }

        for (field, value) in [
            ("price_column", &self.price_column),
            ("registration_year_column", &self.registration_year_column),
            ("brand_column", &self.brand_column),
            ("odometer_column", &self.odometer_column),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigValidationError::EmptyColumnName(field.to_string()));
            }
        }

        if self.date_prefix_width == 0 {
            return Err(ConfigValidationError::InvalidDatePrefixWidth(
                self.date_prefix_width,
            ));
        }

        if self.float_precision > MAX_FLOAT_PRECISION {
            return Err(ConfigValidationError::InvalidPrecision(self.float_precision));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid range for '{field}': {range} (lower bound must not exceed upper bound)")]
    InvalidRange { field: String, range: String },

    #[error("Invalid delimiter {0:?} (must be a single ASCII character)")]
    InvalidDelimiter(char),

    #[error("Column name for '{0}' must not be empty")]
    EmptyColumnName(String),

    #[error("Invalid date prefix width: {0} (must be at least 1)")]
    InvalidDatePrefixWidth(usize),

    #[error("Invalid float precision: {0} (must be at most {MAX_FLOAT_PRECISION})")]
    InvalidPrecision(usize),
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    encoding: Option<String>,
    delimiter: Option<char>,
    infer_schema_rows: Option<usize>,
    column_renames: Option<Vec<(String, String)>>,
    dropped_columns: Option<Vec<String>>,
    drop_mode: Option<ColumnDropMode>,
    price_range: Option<NumericRange>,
    registration_year_range: Option<NumericRange>,
    brand_column: Option<String>,
    top_brands: Option<usize>,
    aggregate_sort: Option<AggregateSort>,
    date_columns: Option<Vec<String>>,
    date_prefix_width: Option<usize>,
    float_precision: Option<usize>,
}

impl AnalysisConfigBuilder {
    /// Set the encoding label of the input file.
    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }

    /// Set the field delimiter.
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Set the number of rows used for schema inference.
    pub fn infer_schema_rows(mut self, rows: usize) -> Self {
        self.infer_schema_rows = Some(rows);
        self
    }

    /// Replace the post-normalization renames.
    pub fn column_renames<I, A, B>(mut self, renames: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        self.column_renames = Some(
            renames
                .into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect(),
        );
        self
    }

    /// Replace the set of low-value columns.
    pub fn dropped_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dropped_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Choose whether dropped columns leave the working table.
    pub fn drop_mode(mut self, mode: ColumnDropMode) -> Self {
        self.drop_mode = Some(mode);
        self
    }

    /// Set the accepted price range.
    pub fn price_range(mut self, range: NumericRange) -> Self {
        self.price_range = Some(range);
        self
    }

    /// Set the accepted registration year range.
    pub fn registration_year_range(mut self, range: NumericRange) -> Self {
        self.registration_year_range = Some(range);
        self
    }

    /// Set the categorical column used for grouping.
    pub fn brand_column(mut self, column: impl Into<String>) -> Self {
        self.brand_column = Some(column.into());
        self
    }

    /// Set how many of the most frequent brands are aggregated.
    pub fn top_brands(mut self, n: usize) -> Self {
        self.top_brands = Some(n);
        self
    }

    /// Order the brand aggregate table.
    pub fn aggregate_sort(mut self, sort: AggregateSort) -> Self {
        self.aggregate_sort = Some(sort);
        self
    }

    /// Replace the list of timestamp-like columns.
    pub fn date_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the number of characters kept from timestamp values.
    pub fn date_prefix_width(mut self, width: usize) -> Self {
        self.date_prefix_width = Some(width);
        self
    }

    /// Set the number of decimals shown in the text report.
    pub fn float_precision(mut self, digits: usize) -> Self {
        self.float_precision = Some(digits);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let defaults = AnalysisConfig::default();
        let config = AnalysisConfig {
            encoding: self.encoding.unwrap_or(defaults.encoding),
            delimiter: self.delimiter.unwrap_or(defaults.delimiter),
            infer_schema_rows: self.infer_schema_rows.unwrap_or(defaults.infer_schema_rows),
            column_renames: self.column_renames.unwrap_or(defaults.column_renames),
            dropped_columns: self.dropped_columns.unwrap_or(defaults.dropped_columns),
            drop_mode: self.drop_mode.unwrap_or_default(),
            price_column: defaults.price_column,
            price_range: self.price_range.unwrap_or(defaults.price_range),
            registration_year_column: defaults.registration_year_column,
            registration_year_range: self
                .registration_year_range
                .unwrap_or(defaults.registration_year_range),
            brand_column: self.brand_column.unwrap_or(defaults.brand_column),
            odometer_column: defaults.odometer_column,
            top_brands: self.top_brands.unwrap_or(defaults.top_brands),
            aggregate_sort: self.aggregate_sort,
            date_columns: self.date_columns.unwrap_or(defaults.date_columns),
            date_prefix_width: self.date_prefix_width.unwrap_or(defaults.date_prefix_width),
            float_precision: self.float_precision.unwrap_or(defaults.float_precision),
        };

        config.validate()?;
        Ok(config)
    }
}
