//! Date distributions of timestamp-like text columns.
//!
//! Timestamps such as `2016-03-26 17:47:46` are cut down to their calendar
//! date before counting, so the distribution shows listings per day.

use crate::profiler::frequency::{FrequencyEntry, FrequencyTable};
use crate::utils::{text_values, truncate_chars};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

/// Per-day frequency of a timestamp column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateDistribution {
    pub column: String,
    /// Number of leading characters kept
    pub width: usize,
    /// Ordered by count descending
    pub by_frequency: FrequencyTable,
    /// Ordered by calendar date ascending; unparseable prefixes last
    pub by_date: FrequencyTable,
    /// Distinct prefixes that are not calendar dates
    pub unparsed: usize,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}

/// Parse a truncated prefix as a calendar date.
pub fn parse_date_prefix(prefix: &str) -> Option<NaiveDate> {
    let prefix = prefix.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(prefix, fmt).ok())
}

/// Compute the distribution of the first `width` characters of each value.
pub fn date_distribution(series: &Series, width: usize) -> PolarsResult<DateDistribution> {
    let prefixes = text_values(series)?
        .into_iter()
        .map(|v| v.map(|v| truncate_chars(&v, width).to_string()));
    let by_frequency = FrequencyTable::from_values(series.name().to_string(), prefixes);

    let mut dated: Vec<(Option<NaiveDate>, FrequencyEntry)> = by_frequency
        .entries
        .iter()
        .map(|e| (parse_date_prefix(&e.value), e.clone()))
        .collect();
    dated.sort_by(|(da, ea), (db, eb)| match (da, db) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => ea.value.cmp(&eb.value),
    });

    let dates: Vec<NaiveDate> = dated.iter().filter_map(|(d, _)| *d).collect();
    let unparsed = dated.len() - dates.len();

    let by_date = FrequencyTable {
        entries: dated.into_iter().map(|(_, e)| e).collect(),
        ..by_frequency.clone()
    };

    Ok(DateDistribution {
        column: series.name().to_string(),
        width,
        by_frequency,
        by_date,
        unparsed,
        earliest: dates.first().copied(),
        latest: dates.last().copied(),
    })
}
