use polars::prelude::{DataFrame, DataType, Expr, IntoLazy, lit};
use strum::IntoEnumIterator;
use tracing::info;

use crate::{
    error::{SalesPrepError, SalesPrepResult, polars_to_sales_prep_error},
    schema::{SalesCol, TimeFeature},
};

/// Appends every [`TimeFeature`] column, derived from `date`.
///
/// Rows with a missing date get missing calendar values.
pub fn add_time_features(df: DataFrame) -> SalesPrepResult<DataFrame> {
    let exprs = TimeFeature::iter()
        .map(|f| time_feature_expr(f).alias(f.as_str()))
        .collect::<Vec<_>>();

    let df = df.lazy().with_columns(exprs).collect().map_err(convert_err)?;

    info!(
        features = TimeFeature::iter().count(),
        columns = df.width(),
        "Derived calendar features"
    );
    Ok(df)
}

pub fn time_feature_expr(feature: TimeFeature) -> Expr {
    match feature {
        TimeFeature::DayOfWeek => day_of_week(),
        TimeFeature::WeekdayName => date().dt().to_string("%A"),
        TimeFeature::Month => month(),
        TimeFeature::Year => date().dt().year(),
        TimeFeature::WeekOfYear => date().dt().week().cast(DataType::Int32),
        TimeFeature::DayOfMonth | TimeFeature::Day => day_of_month(),
        TimeFeature::IsWeekend => day_of_week().gt_eq(lit(5)).cast(DataType::Int32),
        TimeFeature::IsMonthStart => is_month_start(),
        TimeFeature::IsMonthEnd => is_month_end(),
        TimeFeature::IsQuarterStart => {
            is_month_start().and(((month() - lit(1)) % lit(3)).eq(lit(0)))
        }
        TimeFeature::IsQuarterEnd => is_month_end().and((month() % lit(3)).eq(lit(0))),
        TimeFeature::NDaysFromStart => {
            (epoch_days() - epoch_days().min()).cast(DataType::Int64)
        }
    }
}

// ================================================================================================
// Helper Functions
// ================================================================================================

fn date() -> Expr {
    SalesCol::Date.expr()
}

/// Monday = 0 .. Sunday = 6.
fn day_of_week() -> Expr {
    date().dt().weekday().cast(DataType::Int32) - lit(1)
}

fn month() -> Expr {
    date().dt().month().cast(DataType::Int32)
}

fn day_of_month() -> Expr {
    date().dt().day().cast(DataType::Int32)
}

fn epoch_days() -> Expr {
    date().cast(DataType::Int32)
}

fn is_month_start() -> Expr {
    day_of_month().eq(lit(1))
}

/// The following day opens a new month.
fn is_month_end() -> Expr {
    (epoch_days() + lit(1))
        .cast(DataType::Date)
        .dt()
        .day()
        .eq(lit(1))
}

fn convert_err(e: polars::error::PolarsError) -> SalesPrepError {
    polars_to_sales_prep_error("deriving calendar features", e)
}
