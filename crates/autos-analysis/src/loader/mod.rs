//! Loading of raw listing files.
//!
//! The input is a delimited text file with a header row in a single-byte
//! encoding (Latin-1 for the reference dataset). The bytes are decoded to
//! UTF-8 up front with `encoding_rs`, then handed to the polars CSV reader.

use crate::config::AnalysisConfig;
use crate::error::LoadError;
use crate::utils::{NumericCell, numeric_cells};
use encoding_rs::Encoding;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Labels decoded as true ISO-8859-1 rather than the WHATWG windows-1252 alias.
const LATIN1_LABELS: [&str; 4] = ["latin1", "iso-8859-1", "iso8859-1", "l1"];

/// Text encoding of an input file.
///
/// Latin-1 labels map every byte to the code point of the same value;
/// every other label is resolved as a WHATWG label.
#[derive(Clone, Copy)]
pub enum TextEncoding {
    Latin1,
    Whatwg(&'static Encoding),
}

impl TextEncoding {
    /// Resolve an encoding label such as `"latin1"` or `"utf-8"`.
    pub fn from_label(label: &str) -> Result<Self, LoadError> {
        let trimmed = label.trim();
        if LATIN1_LABELS
            .iter()
            .any(|l| l.eq_ignore_ascii_case(trimmed))
        {
            return Ok(Self::Latin1);
        }
        Encoding::for_label(trimmed.as_bytes())
            .map(Self::Whatwg)
            .ok_or_else(|| LoadError::UnknownEncoding(label.to_string()))
    }

    /// Canonical name of the resolved encoding.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Latin1 => "ISO-8859-1",
            Self::Whatwg(encoding) => encoding.name(),
        }
    }

    /// Decode raw bytes, returning the text and the number of characters
    /// that had to be replaced.
    pub fn decode(&self, bytes: &[u8]) -> (String, usize) {
        match self {
            // Every byte is a valid code point
            Self::Latin1 => (encoding_rs::mem::decode_latin1(bytes).into_owned(), 0),
            Self::Whatwg(encoding) => {
                let (text, _, had_errors) = encoding.decode(bytes);
                let replaced = if had_errors {
                    text.chars().filter(|c| *c == char::REPLACEMENT_CHARACTER).count()
                } else {
                    0
                };
                (text.into_owned(), replaced)
            }
        }
    }
}

impl fmt::Debug for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TextEncoding").field(&self.name()).finish()
    }
}

/// A table read from disk together with how it was decoded.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub data: DataFrame,
    pub path: PathBuf,
    pub encoding: String,
    pub replaced_characters: usize,
}

/// CSV loader with a fixed encoding and parse settings.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    encoding: TextEncoding,
    delimiter: u8,
    infer_schema_rows: usize,
}

impl CsvLoader {
    /// Create a loader for the given encoding label with default parse settings.
    pub fn new(encoding_label: &str) -> Result<Self, LoadError> {
        Ok(Self {
            encoding: TextEncoding::from_label(encoding_label)?,
            delimiter: b',',
            infer_schema_rows: 10_000,
        })
    }

    /// Create a loader from the pipeline configuration.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, LoadError> {
        let mut loader = Self::new(&config.encoding)?;
        // validate() guarantees an ASCII delimiter
        loader.delimiter = u8::try_from(config.delimiter).unwrap_or(b',');
        loader.infer_schema_rows = config.infer_schema_rows.max(1);
        Ok(loader)
    }

    /// The encoding this loader decodes with.
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Read, decode and parse a file.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<LoadedTable, LoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());

        let (text, replaced) = self.encoding.decode(&bytes);
        if replaced > 0 {
            warn!(
                "{} characters in {} could not be decoded as {} and were replaced",
                replaced,
                path.display(),
                self.encoding.name()
            );
        }

        let data = self.parse_text(text, path)?;
        info!(
            "Loaded {} rows x {} columns from {} ({})",
            data.height(),
            data.width(),
            path.display(),
            self.encoding.name()
        );

        Ok(LoadedTable {
            data,
            path: path.to_path_buf(),
            encoding: self.encoding.name().to_string(),
            replaced_characters: replaced,
        })
    }

    /// Parse already decoded CSV text.
    ///
    /// `path` is only used in error messages.
    pub fn parse_text(&self, text: String, path: &Path) -> Result<DataFrame, LoadError> {
        if text.trim().is_empty() {
            return Err(LoadError::Empty(path.to_path_buf()));
        }

        // Strategy 1: typed parse with schema inference
        let df = match self.read(text.clone(), Some(self.infer_schema_rows)) {
            Ok(df) => df,
            Err(e) => {
                debug!("Typed loading failed: {}", e);

                // Strategy 2: everything as text, then recover numeric columns
                let df = self
                    .read(text, Some(0))
                    .map_err(|e| LoadError::Parse {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    })?;
                recover_numeric_columns(df).map_err(|e| LoadError::Parse {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
            }
        };

        if df.width() == 0 {
            return Err(LoadError::Empty(path.to_path_buf()));
        }
        Ok(df)
    }

    fn read(&self, text: String, infer_schema_length: Option<usize>) -> PolarsResult<DataFrame> {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(infer_schema_length)
            .with_parse_options(
                CsvParseOptions::default()
                    .with_separator(self.delimiter)
                    .with_quote_char(Some(b'"')),
            )
            .into_reader_with_file_handle(Cursor::new(text))
            .finish()
    }
}

/// Load a listing file with the given encoding label and default parse settings.
pub fn load_table(path: impl AsRef<Path>, encoding: &str) -> Result<DataFrame, LoadError> {
    Ok(CsvLoader::new(encoding)?.load(path)?.data)
}

/// Cast text columns whose present values are all numeric.
///
/// Columns with only whole numbers become `Int64`, the rest `Float64`.
fn recover_numeric_columns(df: DataFrame) -> PolarsResult<DataFrame> {
    let mut df = df;
    let column_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for col_name in &column_names {
        let series = df.column(col_name)?.as_materialized_series().clone();
        if series.dtype() != &DataType::String {
            continue;
        }

        let cells = numeric_cells(&series)?;
        let has_values = cells.iter().any(|c| matches!(c, NumericCell::Value(_)));
        let all_numeric = cells.iter().all(|c| !matches!(c, NumericCell::Invalid));
        if !has_values || !all_numeric {
            continue;
        }

        let values: Vec<Option<f64>> = cells.into_iter().map(NumericCell::value).collect();
        let integral = values.iter().flatten().all(|v| v.fract() == 0.0 && v.abs() < 9.0e15);

        let recovered = if integral {
            let ints: Vec<Option<i64>> = values.iter().map(|v| v.map(|v| v as i64)).collect();
            Series::new(col_name.as_str().into(), ints)
        } else {
            Series::new(col_name.as_str().into(), values)
        };
        debug!("Recovered numeric column '{}' as {}", col_name, recovered.dtype());
        df.replace(col_name, recovered)?;
    }

    Ok(df)
}
