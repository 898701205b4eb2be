use polars::prelude::{DataFrame, Expr, FillNullStrategy, IntoLazy, col};
use tracing::info;

use crate::{
    config::FillPolicy,
    error::{SalesPrepError, SalesPrepResult, polars_to_sales_prep_error},
    features::polars_ext::{DataFrameExt, LazyFrameExt},
    schema::{SalesCol, series_keys},
};

/// Fills the missing cells left in `df` according to `policy`.
pub fn fill_missing(df: DataFrame, policy: FillPolicy) -> SalesPrepResult<DataFrame> {
    let missing_before = null_cells(&df);
    let names = columns_with_nulls(&df);

    let df = match policy {
        FillPolicy::Keep => df,
        FillPolicy::GlobalBackward => df
            .lazy()
            .with_columns(backward_fill_exprs(&names, false))
            .collect()
            .map_err(convert_err)?,
        FillPolicy::PerSeriesBackward => {
            df.lazy()
                .in_date_order()
                .with_columns(backward_fill_exprs(&names, true))
                .in_row_order()
                .collect()
                .and_then(|df| df.without_row_index())
                .map_err(convert_err)?
        }
    };

    info!(
        policy = %policy,
        missing_before,
        missing_after = null_cells(&df),
        "Filled missing values"
    );
    Ok(df)
}

fn backward_fill_exprs(names: &[String], per_series: bool) -> Vec<Expr> {
    let keys = [SalesCol::StoreNbr.as_str(), SalesCol::Family.as_str()];
    names
        .iter()
        .filter(|name| !per_series || !keys.contains(&name.as_str()))
        .map(|name| {
            let filled =
                col(name.as_str()).fill_null_with_strategy(FillNullStrategy::Backward(None));
            if per_series {
                filled.over(series_keys()).alias(name.as_str())
            } else {
                filled.alias(name.as_str())
            }
        })
        .collect()
}

// Complete columns, the categorical store label among them, are left untouched.
fn columns_with_nulls(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| c.null_count() > 0)
        .map(|c| c.name().to_string())
        .collect()
}

fn null_cells(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|c| c.null_count()).sum()
}

fn convert_err(e: polars::error::PolarsError) -> SalesPrepError {
    polars_to_sales_prep_error("filling missing values", e)
}
