//! Schema normalization.
//!
//! Column labels change, values never do. Every operation here returns a
//! new table and leaves its input untouched.

mod naming;

pub use naming::{COLUMN_OVERRIDES, normalize_name, to_snake_case};

use crate::error::SchemaError;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// One source column and the name it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    pub original: String,
    pub normalized: String,
}

impl ColumnRename {
    /// Whether the name actually changed.
    pub fn is_changed(&self) -> bool {
        self.original != self.normalized
    }
}

/// Normalize an ordered list of column names.
///
/// The output has the same length and order as the input.
///
/// # Errors
///
/// [`SchemaError::EmptyName`] for blank names, [`SchemaError::Collision`]
/// when two distinct inputs map to the same output.
pub fn normalize_column_names<S: AsRef<str>>(
    names: &[S],
) -> Result<Vec<ColumnRename>, SchemaError> {
    let mut seen: HashMap<String, String> = HashMap::with_capacity(names.len());
    let mut renames = Vec::with_capacity(names.len());

    for (position, name) in names.iter().enumerate() {
        let original = name.as_ref();
        if original.trim().is_empty() {
            return Err(SchemaError::EmptyName(position));
        }

        let normalized = normalize_name(original);
        if let Some(first) = seen.get(&normalized) {
            return Err(SchemaError::Collision {
                first: first.clone(),
                second: original.to_string(),
                normalized,
            });
        }
        seen.insert(normalized.clone(), original.to_string());

        renames.push(ColumnRename {
            original: original.to_string(),
            normalized,
        });
    }

    Ok(renames)
}

/// Return a copy of `df` with normalized column names, plus the mapping used.
pub fn normalize_table(df: &DataFrame) -> crate::error::Result<(DataFrame, Vec<ColumnRename>)> {
    let names = column_names(df);
    let renames = normalize_column_names(&names)?;

    let mut normalized = df.clone();
    normalized.set_column_names(renames.iter().map(|r| r.normalized.as_str()))?;

    let changed = renames.iter().filter(|r| r.is_changed()).count();
    debug!("Normalized {} of {} column names", changed, renames.len());

    Ok((normalized, renames))
}

/// Apply explicit (from, to) renames to a copy of `df`.
///
/// Renames whose source column is absent are skipped with a warning.
/// Returns the renames that were applied.
pub fn rename_columns(
    df: &DataFrame,
    renames: &[(String, String)],
) -> crate::error::Result<(DataFrame, Vec<ColumnRename>)> {
    let mut renamed = df.clone();
    let mut applied = Vec::new();

    for (from, to) in renames {
        if from == to {
            continue;
        }
        let names = column_names(&renamed);
        if !names.iter().any(|n| n == from) {
            warn!("Cannot rename '{}' to '{}': column not present", from, to);
            continue;
        }
        if names.iter().any(|n| n == to) {
            return Err(SchemaError::Collision {
                first: from.clone(),
                second: to.clone(),
                normalized: to.clone(),
            }
            .into());
        }

        renamed.rename(from, to.as_str().into())?;
        debug!("Renamed column '{}' to '{}'", from, to);
        applied.push(ColumnRename {
            original: from.clone(),
            normalized: to.clone(),
        });
    }

    Ok((renamed, applied))
}

/// Fail with [`SchemaError::MissingColumn`] for the first absent column.
pub fn require_columns<S: AsRef<str>>(df: &DataFrame, required: &[S]) -> Result<(), SchemaError> {
    let names = column_names(df);
    for column in required {
        let column = column.as_ref();
        if !names.iter().any(|n| n == column) {
            return Err(SchemaError::MissingColumn(column.to_string()));
        }
    }
    Ok(())
}

/// Column names of a table as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}
