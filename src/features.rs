pub mod calendar;
pub mod encode;
pub mod fill;
pub mod lags;
pub mod merge;
pub(crate) mod polars_ext;
