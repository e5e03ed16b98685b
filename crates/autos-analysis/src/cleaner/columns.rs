//! Removal of low-value columns.

use crate::config::ColumnDropMode;
use crate::error::Result;
use crate::schema::column_names;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of dropping a set of columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedColumns {
    pub mode: ColumnDropMode,
    /// Requested columns present in the table
    pub dropped: Vec<String>,
    /// Requested columns the table does not have
    pub missing: Vec<String>,
}

impl DroppedColumns {
    /// Whether the working table lost the dropped columns.
    pub fn removed_from_table(&self) -> bool {
        self.mode == ColumnDropMode::Remove && !self.dropped.is_empty()
    }
}

/// Drop `columns` from a copy of `df` according to `mode`.
///
/// In [`ColumnDropMode::Advisory`] the returned table keeps every column and
/// only the report records the drop.
pub fn drop_columns(
    df: &DataFrame,
    columns: &[String],
    mode: ColumnDropMode,
) -> Result<(DataFrame, DroppedColumns)> {
    let present = column_names(df);
    let (dropped, missing): (Vec<String>, Vec<String>) = columns
        .iter()
        .cloned()
        .partition(|c| present.contains(c));

    if !missing.is_empty() {
        debug!("Columns marked for dropping but absent: {:?}", missing);
    }

    let table = match mode {
        ColumnDropMode::Remove if !dropped.is_empty() => {
            let cols_ref: Vec<PlSmallStr> = dropped.iter().map(|s| s.as_str().into()).collect();
            info!("Removing {} low-value columns: {:?}", dropped.len(), dropped);
            df.drop_many(cols_ref)
        }
        ColumnDropMode::Remove => df.clone(),
        ColumnDropMode::Advisory => {
            info!(
                "Marked {} low-value columns as dropped (advisory, table unchanged): {:?}",
                dropped.len(),
                dropped
            );
            df.clone()
        }
    };

    Ok((
        table,
        DroppedColumns {
            mode,
            dropped,
            missing,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataFrame {
        df!(
            "seller" => &["privat", "privat"],
            "offer_type" => &["Angebot", "Angebot"],
            "price" => &[100i64, 200],
        )
        .unwrap()
    }

    fn drop_set() -> Vec<String> {
        vec![
            "seller".to_string(),
            "offer_type".to_string(),
            "num_photos".to_string(),
        ]
    }

    #[test]
    fn test_advisory_keeps_columns() {
        let (df, outcome) = drop_columns(&table(), &drop_set(), ColumnDropMode::Advisory).unwrap();
        assert_eq!(df.width(), 3);
        assert_eq!(outcome.dropped, vec!["seller", "offer_type"]);
        assert_eq!(outcome.missing, vec!["num_photos"]);
        assert!(!outcome.removed_from_table());
    }

    #[test]
    fn test_remove_drops_columns() {
        let (df, outcome) = drop_columns(&table(), &drop_set(), ColumnDropMode::Remove).unwrap();
        assert_eq!(column_names(&df), vec!["price"]);
        assert!(outcome.removed_from_table());
    }

    #[test]
    fn test_remove_with_nothing_present() {
        let df = df!("price" => &[1i64]).unwrap();
        let (df, outcome) = drop_columns(&df, &drop_set(), ColumnDropMode::Remove).unwrap();
        assert_eq!(df.width(), 1);
        assert!(outcome.dropped.is_empty());
        assert!(!outcome.removed_from_table());
    }
}
