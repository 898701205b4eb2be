use polars::prelude::{DataFrame, DataType, Expr, IntoLazy, RollingOptionsFixedWindow, lit};
use tracing::info;

use crate::{
    config::validate_periods,
    error::{ConfigError, SalesPrepError, SalesPrepResult, polars_to_sales_prep_error},
    features::polars_ext::{DataFrameExt, LazyFrameExt},
    schema::{SalesCol, lag_col, rolling_mean_col, rolling_std_col, series_keys},
};

/// Appends lagged and trailing-window statistics of `sales`, computed within
/// each (store, family) series in date order.
///
/// For every `k` in `lags`, `lag_{k}` holds the sales value `k` rows earlier in
/// the series. For every `w` in `windows`, `rolling_mean_{w}` and
/// `rolling_std_{w}` aggregate the `w` rows strictly before the current one;
/// the current row never enters its own window. Both stay missing until the
/// series has enough history.
///
/// Row order of `df` is preserved.
pub fn add_lag_features(
    df: DataFrame,
    lags: &[u16],
    windows: &[u16],
) -> SalesPrepResult<DataFrame> {
    validate_periods(lags, "lag", ConfigError::InvalidLag)?;
    validate_periods(windows, "window", ConfigError::InvalidWindow)?;

    let mut exprs = Vec::with_capacity(lags.len() + 2 * windows.len());
    exprs.extend(lags.iter().map(|&k| lag_expr(k)));
    for &w in windows {
        exprs.push(rolling_mean_expr(w));
        exprs.push(rolling_std_expr(w));
    }

    let df = df
        .lazy()
        .in_date_order()
        .with_columns(exprs)
        .in_row_order()
        .collect()
        .and_then(|df| df.without_row_index())
        .map_err(convert_err)?;

    info!(?lags, ?windows, columns = df.width(), "Derived lag and rolling features");
    Ok(df)
}

pub fn lag_expr(lag: u16) -> Expr {
    SalesCol::Sales
        .expr()
        .shift(lit(lag as i64))
        .over(series_keys())
        .alias(lag_col(lag))
}

pub fn rolling_mean_expr(window: u16) -> Expr {
    prior_sales()
        .rolling_mean(window_options(window))
        .over(series_keys())
        .alias(rolling_mean_col(window))
}

/// Sample standard deviation (ddof = 1).
pub fn rolling_std_expr(window: u16) -> Expr {
    prior_sales()
        .rolling_std(window_options(window))
        .over(series_keys())
        .alias(rolling_std_col(window))
}

/// Sales shifted by one row, so a window ending here covers only the past.
fn prior_sales() -> Expr {
    SalesCol::Sales
        .expr()
        .cast(DataType::Float64)
        .shift(lit(1))
}

fn window_options(window: u16) -> RollingOptionsFixedWindow {
    RollingOptionsFixedWindow {
        window_size: window as usize,
        min_periods: window as usize, // Full window required
        weights: None,
        center: false,
        fn_params: None,
    }
}

fn convert_err(e: polars::error::PolarsError) -> SalesPrepError {
    polars_to_sales_prep_error("deriving lag features", e)
}
