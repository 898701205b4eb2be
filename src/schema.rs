use polars::prelude::{Expr, PlSmallStr, col};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The five input tables and the fixed file names they are read from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum SourceTable {
    /// Transaction-level sales records; the anchor of every join.
    Train,
    /// Store metadata keyed by store number.
    Stores,
    /// Daily oil price index.
    Oil,
    /// Holiday and event calendar.
    HolidaysEvents,
    /// Daily transaction counts per store.
    Transactions,
}

impl SourceTable {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Train => "train.csv",
            Self::Stores => "stores.csv",
            Self::Oil => "oil.csv",
            Self::HolidaysEvents => "holidays_events.csv",
            Self::Transactions => "transactions.csv",
        }
    }

    /// Whether the table carries a `date` column that must be parsed.
    pub fn has_date(&self) -> bool {
        !matches!(self, Self::Stores)
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Columns the pipeline reads or writes by name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum SalesCol {
    // === Keys ===
    Date,
    StoreNbr,
    Family,

    // === Measures ===
    Sales,
    Transactions,

    // === Flags ===
    IsHoliday,
}

impl From<SalesCol> for PlSmallStr {
    fn from(value: SalesCol) -> Self {
        value.as_str().into()
    }
}

impl SalesCol {
    pub fn name(&self) -> PlSmallStr {
        (*self).into()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn expr(&self) -> Expr {
        col(self.as_str())
    }
}

/// Calendar columns derived from the date.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum TimeFeature {
    #[strum(serialize = "dayofweek")]
    DayOfWeek,
    #[strum(serialize = "weekday_name")]
    WeekdayName,
    #[strum(serialize = "month")]
    Month,
    #[strum(serialize = "year")]
    Year,
    #[strum(serialize = "weekofyear")]
    WeekOfYear,
    #[strum(serialize = "dayofmonth")]
    DayOfMonth,
    #[strum(serialize = "is_weekend")]
    IsWeekend,
    #[strum(serialize = "is_month_start")]
    IsMonthStart,
    #[strum(serialize = "is_month_end")]
    IsMonthEnd,
    #[strum(serialize = "is_quarter_start")]
    IsQuarterStart,
    #[strum(serialize = "is_quarter_end")]
    IsQuarterEnd,
    #[strum(serialize = "n_days_from_start")]
    NDaysFromStart,
    /// Same value as `dayofmonth`.
    #[strum(serialize = "day")]
    Day,
}

impl From<TimeFeature> for PlSmallStr {
    fn from(value: TimeFeature) -> Self {
        value.as_str().into()
    }
}

impl TimeFeature {
    pub fn name(&self) -> PlSmallStr {
        (*self).into()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

pub fn lag_col(lag: u16) -> String {
    format!("lag_{lag}")
}

pub fn rolling_mean_col(window: u16) -> String {
    format!("rolling_mean_{window}")
}

pub fn rolling_std_col(window: u16) -> String {
    format!("rolling_std_{window}")
}

/// Columns identifying a series.
pub fn series_keys() -> [Expr; 2] {
    [SalesCol::StoreNbr.expr(), SalesCol::Family.expr()]
}

/// Private row index used to restore the anchor order after reordering steps.
pub(crate) const ROW_INDEX: &str = "__row_nr";
