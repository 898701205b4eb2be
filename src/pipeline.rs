use std::{path::PathBuf, time::Instant};

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::PipelineConfig,
    error::SalesPrepResult,
    features::{
        calendar::add_time_features,
        encode::{CategoryCodes, encode_categoricals},
        fill::fill_missing,
        lags::add_lag_features,
        merge::merge_tables,
    },
    io::{RawTables, read_category_codes, write_category_codes, write_csv},
};

/// The encoded feature table and the family mapping used to build it.
#[derive(Debug, Clone)]
pub struct Processed {
    pub df: DataFrame,
    pub codes: CategoryCodes,
}

/// Outcome of a completed [`run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub rows: usize,
    pub columns: usize,
    pub output_path: PathBuf,
    pub family_codes: usize,
}

/// Loads the source tables and builds the feature table without writing it.
///
/// If `category_codes_path` points at an existing mapping, it is reused so
/// family codes match earlier runs.
#[tracing::instrument(skip_all, fields(data_dir = %cfg.data_dir.display()))]
pub fn preprocess(cfg: &PipelineConfig) -> SalesPrepResult<Processed> {
    cfg.validate()?;
    let tables = timed("load", || RawTables::load(&cfg.data_dir))?;

    let saved = match &cfg.category_codes_path {
        Some(path) if path.is_file() => {
            info!(path = %path.display(), "Reusing saved category codes");
            Some(read_category_codes(path)?)
        }
        _ => None,
    };

    transform(&tables, cfg, saved.as_ref())
}

/// Runs every transformation step over already loaded tables.
///
/// Steps: merge, calendar features, lag/rolling features, categorical
/// encoding, then the configured fill policy.
pub fn transform(
    tables: &RawTables,
    cfg: &PipelineConfig,
    codes: Option<&CategoryCodes>,
) -> SalesPrepResult<Processed> {
    let df = timed("merge", || merge_tables(tables))?;
    let df = timed("calendar", || add_time_features(df))?;
    let df = timed("lags", || add_lag_features(df, &cfg.lags, &cfg.windows))?;
    let (df, codes) = timed("encode", || encode_categoricals(df, codes))?;
    let df = timed("fill", || fill_missing(df, cfg.fill_policy))?;

    Ok(Processed { df, codes })
}

/// Builds the feature table and writes it to `cfg.output_path`.
pub fn run(cfg: &PipelineConfig) -> SalesPrepResult<PipelineSummary> {
    let Processed { mut df, codes } = preprocess(cfg)?;

    timed("write", || write_csv(&mut df, &cfg.output_path, cfg.separator))?;
    if let Some(path) = &cfg.category_codes_path {
        write_category_codes(&codes, path)?;
    }

    let summary = PipelineSummary {
        rows: df.height(),
        columns: df.width(),
        output_path: cfg.output_path.clone(),
        family_codes: codes.len(),
    };
    info!(
        rows = summary.rows,
        columns = summary.columns,
        output = %summary.output_path.display(),
        "Feature table written"
    );
    Ok(summary)
}

fn timed<T>(stage: &'static str, f: impl FnOnce() -> SalesPrepResult<T>) -> SalesPrepResult<T> {
    let start = Instant::now();
    let out = f()?;
    debug!(
        stage,
        elapsed = %humantime::format_duration(start.elapsed()),
        "Stage complete"
    );
    Ok(out)
}
