//! Batch feature engineering for store sales forecasting.
//!
//! Reads the train, stores, oil, holidays and transactions tables from a
//! directory, joins them onto the train table, derives calendar and per-series
//! lag/rolling features, encodes categorical columns and writes one flat
//! feature file.

pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod pipeline;
pub mod prelude;
pub mod schema;

pub use pipeline::{preprocess, run, transform};
