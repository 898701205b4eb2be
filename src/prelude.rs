// 1. Pipeline
pub use crate::pipeline::{PipelineSummary, Processed, preprocess, run, transform};

// 2. Configuration
pub use crate::config::{FillPolicy, PipelineConfig};

// 3. Steps
pub use crate::features::{
    calendar::add_time_features,
    encode::{CategoryCodes, UNKNOWN_CODE, encode_categoricals},
    fill::fill_missing,
    lags::add_lag_features,
    merge::merge_tables,
};
pub use crate::io::{RawTables, load_table, read_csv, write_csv};

// 4. Vocabulary
pub use crate::schema::{SalesCol, SourceTable, TimeFeature};

// 5. Errors
pub use crate::error::{ConfigError, DataError, IoError, SalesPrepError, SalesPrepResult};
