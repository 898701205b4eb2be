use polars::prelude::{DataFrame, LazyFrame, PolarsResult, SortMultipleOptions};

use crate::schema::{ROW_INDEX, SalesCol};

pub trait LazyFrameExt {
    /// Tags every row with its current position and sorts by date.
    ///
    /// Rows sharing a date keep their relative order, so window expressions
    /// partitioned by series see each series in chronological order.
    fn in_date_order(self) -> Self;

    /// Undoes [`in_date_order`](LazyFrameExt::in_date_order).
    fn in_row_order(self) -> Self;
}

impl LazyFrameExt for LazyFrame {
    fn in_date_order(self) -> Self {
        self.with_row_index(ROW_INDEX, None).sort(
            [SalesCol::Date.as_str(), ROW_INDEX],
            SortMultipleOptions::default().with_maintain_order(true),
        )
    }

    fn in_row_order(self) -> Self {
        self.sort([ROW_INDEX], SortMultipleOptions::default())
    }
}

pub trait DataFrameExt {
    fn without_row_index(self) -> PolarsResult<DataFrame>;
}

impl DataFrameExt for DataFrame {
    fn without_row_index(self) -> PolarsResult<DataFrame> {
        self.drop(ROW_INDEX)
    }
}
