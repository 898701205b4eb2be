use polars::prelude::{
    DataFrame, IntoLazy, JoinArgs, JoinType, LazyFrame, SortMultipleOptions, UniqueKeepStrategy,
    lit,
};
use tracing::{debug, info};

use crate::{
    error::{DataError, SalesPrepError, SalesPrepResult, polars_to_sales_prep_error},
    features::polars_ext::DataFrameExt,
    io::RawTables,
    schema::{ROW_INDEX, SalesCol},
};

/// Left-joins store metadata, transaction counts, oil prices and a holiday
/// flag onto the train table.
///
/// The result has exactly one row per train row, in train order. The holiday
/// table contributes only its distinct dates: `is_holiday` is `1` on those
/// dates and `0` everywhere else.
///
/// # Errors
/// [`DataError::RowCountMismatch`] if a right-hand table repeats a join key
/// (other than holiday dates, which are deduplicated).
pub fn merge_tables(tables: &RawTables) -> SalesPrepResult<DataFrame> {
    let expected = tables.train.height();
    let store = SalesCol::StoreNbr.expr();
    let date = SalesCol::Date.expr();

    let df = tables
        .train
        .clone()
        .lazy()
        .with_row_index(ROW_INDEX, None)
        .join(
            tables.stores.clone().lazy(),
            [store.clone()],
            [store.clone()],
            left(),
        )
        .join(
            tables.transactions.clone().lazy(),
            [date.clone(), store.clone()],
            [date.clone(), store],
            left(),
        )
        .join(tables.oil.clone().lazy(), [date.clone()], [date.clone()], left())
        .join(holiday_dates(&tables.holidays), [date.clone()], [date], left())
        .with_column(
            SalesCol::IsHoliday
                .expr()
                .fill_null(lit(0i32))
                .alias(SalesCol::IsHoliday.as_str()),
        )
        .sort([ROW_INDEX], SortMultipleOptions::default())
        .collect()
        .and_then(|df| df.without_row_index())
        .map_err(convert_err)?;

    if df.height() != expected {
        return Err(SalesPrepError::Data(DataError::RowCountMismatch {
            expected,
            actual: df.height(),
        }));
    }

    info!(rows = df.height(), columns = df.width(), "Merged source tables");
    Ok(df)
}

/// Distinct holiday dates tagged with a constant `is_holiday = 1`.
fn holiday_dates(holidays: &DataFrame) -> LazyFrame {
    debug!(rows = holidays.height(), "Reducing holiday calendar to distinct dates");
    holidays
        .clone()
        .lazy()
        .select([SalesCol::Date.expr()])
        .unique(None, UniqueKeepStrategy::Any)
        .with_column(lit(1i32).alias(SalesCol::IsHoliday.as_str()))
}

fn left() -> JoinArgs {
    JoinArgs::new(JoinType::Left)
}

fn convert_err(e: polars::error::PolarsError) -> SalesPrepError {
    polars_to_sales_prep_error("merging source tables", e)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use polars::{df, prelude::DataType};

    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2017, 1, day).expect("valid date")
    }

    fn tables() -> RawTables {
        RawTables {
            train: df![
                "id" => &[0i64, 1, 2, 3, 4, 5],
                "date" => &[d(1), d(1), d(2), d(2), d(3), d(3)],
                "store_nbr" => &[1i64, 2, 1, 2, 1, 2],
                "family" => &[
                    "AUTOMOTIVE", "BEAUTY", "AUTOMOTIVE", "BEAUTY", "AUTOMOTIVE", "BEAUTY"
                ],
                "sales" => &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
            ]
            .expect("train"),
            stores: df![
                "store_nbr" => &[1i64, 2],
                "city" => &["Quito", "Guayaquil"],
                "type" => &["D", "A"],
                "cluster" => &[13i64, 6]
            ]
            .expect("stores"),
            oil: df![
                "date" => &[d(1), d(3)],
                "dcoilwtico" => &[Some(93.1), None]
            ]
            .expect("oil"),
            holidays: df![
                // 2017-01-02 listed twice, 2017-01-09 never traded
                "date" => &[d(2), d(2), d(9)],
                "type" => &["Holiday", "Transfer", "Event"]
            ]
            .expect("holidays"),
            transactions: df![
                "date" => &[d(1), d(2), d(2)],
                "store_nbr" => &[1i64, 1, 2],
                "transactions" => &[770i64, 2111, 2358]
            ]
            .expect("transactions"),
        }
    }

    #[test]
    fn test_merge_preserves_anchor_rows_and_order() {
        let merged = merge_tables(&tables()).expect("Merge failed");

        assert_eq!(merged.height(), 6, "Left joins must not add or drop rows");
        let ids: Vec<_> = merged
            .column("id")
            .expect("id")
            .i64()
            .expect("i64")
            .into_no_null_iter()
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5], "Train order must be kept");
        assert!(
            merged.column(ROW_INDEX).is_err(),
            "Private row index must not leak"
        );
    }

    #[test]
    fn test_merge_attaches_store_and_daily_columns() {
        let merged = merge_tables(&tables()).expect("Merge failed");

        let city = merged.column("city").expect("city").str().expect("str");
        assert_eq!(city.get(1), Some("Guayaquil"));

        let tx = merged
            .column("transactions")
            .expect("transactions")
            .i64()
            .expect("i64");
        assert_eq!(tx.get(0), Some(770));
        assert_eq!(tx.get(1), None, "No count for store 2 on day 1");
        assert_eq!(tx.get(3), Some(2358));

        let oil = merged
            .column("dcoilwtico")
            .expect("oil")
            .f64()
            .expect("f64");
        assert_eq!(oil.get(0), Some(93.1));
        assert_eq!(oil.get(2), None, "No oil price on day 2");
    }

    #[test]
    fn test_holiday_flag_is_binary_and_deduplicated() {
        let merged = merge_tables(&tables()).expect("Merge failed");

        let flag = merged
            .column(SalesCol::IsHoliday.as_str())
            .expect("is_holiday");
        assert_eq!(flag.dtype(), &DataType::Int32);
        assert_eq!(flag.null_count(), 0);

        let flags: Vec<_> = flag.i32().expect("i32").into_no_null_iter().collect();
        assert_eq!(flags, vec![0, 0, 1, 1, 0, 0]);
    }

    #[test]
    fn test_duplicate_store_rows_are_rejected() {
        let mut t = tables();
        t.stores = df![
            "store_nbr" => &[1i64, 1, 2],
            "city" => &["Quito", "Quito", "Guayaquil"],
            "type" => &["D", "D", "A"],
            "cluster" => &[13i64, 13, 6]
        ]
        .expect("stores");

        let result = merge_tables(&t);
        assert!(matches!(
            result,
            Err(SalesPrepError::Data(DataError::RowCountMismatch {
                expected: 6,
                actual: 9
            }))
        ));
    }
}
