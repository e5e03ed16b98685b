//! Grouped aggregation of listing tables.
//!
//! Only the brand aggregation is needed by the pipeline: the most frequent
//! brands with their mean price and mean odometer reading.

mod brand;

pub use brand::{
    AggregateSort, AggregateSortKey, BrandAggregate, BrandAggregateTable, BrandAggregator,
    top_values,
};
