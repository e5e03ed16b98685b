//! Brand-level mean price and mileage.

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::profiler::{FrequencyEntry, value_counts};
use crate::schema::require_columns;
use crate::utils::{compare_optional_f64, numeric_cells, text_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Column of the aggregate table to order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateSortKey {
    MeanPrice,
    MeanMileage,
    Listings,
    Brand,
}

/// Ordering of a [`BrandAggregateTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSort {
    pub key: AggregateSortKey,
    pub descending: bool,
}

impl AggregateSort {
    pub fn descending(key: AggregateSortKey) -> Self {
        Self {
            key,
            descending: true,
        }
    }

    pub fn ascending(key: AggregateSortKey) -> Self {
        Self {
            key,
            descending: false,
        }
    }
}

/// Aggregates of one brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandAggregate {
    pub brand: String,
    /// Rows with this brand
    pub listings: usize,
    /// Share of all non-missing brand values
    pub share: f64,
    /// `None` when no row of the brand has a numeric price
    pub mean_price: Option<f64>,
    /// `None` when no row of the brand has a numeric odometer reading
    pub mean_mileage_km: Option<f64>,
}

/// Brand aggregates, one row per selected brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandAggregateTable {
    pub brand_column: String,
    pub rows: Vec<BrandAggregate>,
}

impl BrandAggregateTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, brand: &str) -> Option<&BrandAggregate> {
        self.rows.iter().find(|r| r.brand == brand)
    }

    /// A sorted copy. Missing means sort last in either direction.
    pub fn sorted_by(&self, sort: AggregateSort) -> Self {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            let directed = |ord: std::cmp::Ordering| {
                if sort.descending { ord.reverse() } else { ord }
            };
            match sort.key {
                AggregateSortKey::MeanPrice => {
                    compare_missing_last(a.mean_price, b.mean_price, sort.descending)
                }
                AggregateSortKey::MeanMileage => {
                    compare_missing_last(a.mean_mileage_km, b.mean_mileage_km, sort.descending)
                }
                AggregateSortKey::Listings => directed(a.listings.cmp(&b.listings)),
                AggregateSortKey::Brand => directed(a.brand.cmp(&b.brand)),
            }
            .then_with(|| a.brand.cmp(&b.brand))
        });
        Self {
            brand_column: self.brand_column.clone(),
            rows,
        }
    }

    /// The table as a DataFrame with columns brand, mean_price, mean_mileage_km.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let brands: Vec<&str> = self.rows.iter().map(|r| r.brand.as_str()).collect();
        let prices: Vec<Option<f64>> = self.rows.iter().map(|r| r.mean_price).collect();
        let mileage: Vec<Option<f64>> = self.rows.iter().map(|r| r.mean_mileage_km).collect();

        df!(
            self.brand_column.as_str() => brands,
            "mean_price" => prices,
            "mean_mileage_km" => mileage,
        )
    }
}

fn compare_missing_last(a: Option<f64>, b: Option<f64>, descending: bool) -> std::cmp::Ordering {
    match (a, b) {
        (Some(x), Some(y)) if descending => y.total_cmp(&x),
        _ => compare_optional_f64(a, b),
    }
}

/// The `n` most frequent non-missing values of a series.
///
/// Ties in frequency are broken by value so the selection is deterministic.
pub fn top_values(series: &Series, n: usize) -> PolarsResult<Vec<FrequencyEntry>> {
    Ok(value_counts(series)?.head(n).entries)
}

/// Computes [`BrandAggregateTable`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandAggregator {
    pub brand_column: String,
    pub price_column: String,
    pub mileage_column: String,
    pub top_n: usize,
}

impl Default for BrandAggregator {
    fn default() -> Self {
        Self {
            brand_column: "brand".to_string(),
            price_column: "price".to_string(),
            mileage_column: "odometer_km".to_string(),
            top_n: 10,
        }
    }
}

impl BrandAggregator {
    pub fn new(top_n: usize) -> Self {
        Self {
            top_n,
            ..Self::default()
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            brand_column: config.brand_column.clone(),
            price_column: config.price_column.clone(),
            mileage_column: config.odometer_column.clone(),
            top_n: config.top_brands,
        }
    }

    /// Aggregate the `top_n` most frequent brands of `df`.
    ///
    /// Rows come out in frequency order.
    pub fn aggregate(&self, df: &DataFrame) -> Result<BrandAggregateTable> {
        require_columns(
            df,
            &[
                self.brand_column.as_str(),
                self.price_column.as_str(),
                self.mileage_column.as_str(),
            ],
        )?;

        let brand_series = df.column(&self.brand_column)?.as_materialized_series();
        let top = top_values(brand_series, self.top_n)?;
        debug!(
            "Top {} values of '{}': {:?}",
            self.top_n,
            self.brand_column,
            top.iter().map(|e| e.value.as_str()).collect::<Vec<_>>()
        );

        let brands = text_values(brand_series)?;
        let prices = numeric_cells(df.column(&self.price_column)?.as_materialized_series())?;
        let mileage = numeric_cells(df.column(&self.mileage_column)?.as_materialized_series())?;

        let mut sums: HashMap<&str, MeanAccumulator> = top
            .iter()
            .map(|e| (e.value.as_str(), MeanAccumulator::default()))
            .collect();

        for ((brand, price), km) in brands.iter().zip(prices).zip(mileage) {
            let Some(acc) = brand.as_deref().and_then(|b| sums.get_mut(b)) else {
                continue;
            };
            acc.price.add(price.value());
            acc.mileage.add(km.value());
        }

        let rows: Vec<BrandAggregate> = top
            .iter()
            .map(|entry| {
                let acc = sums.get(entry.value.as_str()).copied().unwrap_or_default();
                BrandAggregate {
                    brand: entry.value.clone(),
                    listings: entry.count,
                    share: entry.proportion,
                    mean_price: acc.price.mean(),
                    mean_mileage_km: acc.mileage.mean(),
                }
            })
            .collect();

        info!("Aggregated {} brands by '{}'", rows.len(), self.brand_column);

        Ok(BrandAggregateTable {
            brand_column: self.brand_column.clone(),
            rows,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct RunningMean {
    sum: f64,
    n: usize,
}

impl RunningMean {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.n += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct MeanAccumulator {
    price: RunningMean,
    mileage: RunningMean,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn listings() -> DataFrame {
        df!(
            "brand" => &[Some("audi"), Some("audi"), Some("bmw"), Some("opel"), Some("bmw"), Some("fiat"), None],
            "price" => &[Some(10_000i64), Some(20_000), Some(8_000), Some(1_500), None, Some(900), Some(3_000)],
            "odometer_km" => &[150_000i64, 125_000, 150_000, 90_000, 70_000, 150_000, 5_000],
        )
        .unwrap()
    }

    fn brands(table: &BrandAggregateTable) -> Vec<&str> {
        table.rows.iter().map(|r| r.brand.as_str()).collect()
    }

    #[test]
    fn test_mean_price_per_brand() {
        let table = BrandAggregator::new(10).aggregate(&listings()).unwrap();
        let audi = table.get("audi").unwrap();
        assert_eq!(audi.mean_price, Some(15_000.0));
        assert_eq!(audi.mean_mileage_km, Some(137_500.0));
        assert_eq!(audi.listings, 2);

        // Missing price is skipped, mileage still counted
        let bmw = table.get("bmw").unwrap();
        assert_eq!(bmw.mean_price, Some(8_000.0));
        assert_eq!(bmw.mean_mileage_km, Some(110_000.0));
    }

    #[test]
    fn test_top_n_with_alphabetical_ties() {
        let table = BrandAggregator::new(3).aggregate(&listings()).unwrap();
        // audi and bmw have 2 listings; fiat and opel tie at 1
        assert_eq!(brands(&table), vec!["audi", "bmw", "fiat"]);
        assert!((table.rows[0].share - 2.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_top_zero_and_oversized() {
        assert!(BrandAggregator::new(0).aggregate(&listings()).unwrap().is_empty());
        assert_eq!(BrandAggregator::new(50).aggregate(&listings()).unwrap().len(), 4);
    }

    #[test]
    fn test_sorted_by_mean_price() {
        let table = BrandAggregator::new(10).aggregate(&listings()).unwrap();
        let sorted = table.sorted_by(AggregateSort::descending(AggregateSortKey::MeanPrice));
        assert_eq!(brands(&sorted), vec!["audi", "bmw", "opel", "fiat"]);

        let sorted = table.sorted_by(AggregateSort::ascending(AggregateSortKey::MeanMileage));
        assert_eq!(brands(&sorted), vec!["opel", "bmw", "audi", "fiat"]);
    }

    #[test]
    fn test_missing_means_sort_last() {
        let table = BrandAggregateTable {
            brand_column: "brand".to_string(),
            rows: vec![
                BrandAggregate {
                    brand: "lada".to_string(),
                    listings: 1,
                    share: 0.5,
                    mean_price: None,
                    mean_mileage_km: None,
                },
                BrandAggregate {
                    brand: "saab".to_string(),
                    listings: 1,
                    share: 0.5,
                    mean_price: Some(1.0),
                    mean_mileage_km: Some(1.0),
                },
            ],
        };
        for sort in [
            AggregateSort::descending(AggregateSortKey::MeanPrice),
            AggregateSort::ascending(AggregateSortKey::MeanPrice),
        ] {
            assert_eq!(brands(&table.sorted_by(sort)), vec!["saab", "lada"]);
        }
    }

    #[test]
    fn test_to_dataframe() {
        let table = BrandAggregator::new(2).aggregate(&listings()).unwrap();
        let df = table.to_dataframe().unwrap();
        assert_eq!(df.shape(), (2, 3));
        assert_eq!(
            df.column("mean_price").unwrap().f64().unwrap().get(0),
            Some(15_000.0)
        );
    }

    #[test]
    fn test_missing_column() {
        let df = df!("brand" => &["audi"], "price" => &[1i64]).unwrap();
        let err = BrandAggregator::default().aggregate(&df).unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }
}
