//! Transformation pipeline for expense ledgers.
//!
//! Parses raw delimited text into records, derives the month/category
//! catalog, applies the multi-select filter and aggregates the filtered set
//! into the series, totals and drill-down graph the chart renderers consume.

pub mod aggregator;
pub mod breakdown;
pub mod catalog;
pub mod dashboard;
pub mod filter;
pub mod parser;
pub mod query;

pub use lens_core as core;
