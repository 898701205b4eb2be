use thiserror::Error;

pub type SalesPrepResult<T> = Result<T, SalesPrepError>;

#[derive(Debug, Error)]
pub enum SalesPrepError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors raised while validating or loading a [`PipelineConfig`](crate::config::PipelineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid lag offset {0}: lags must be at least 1")]
    InvalidLag(u16),

    #[error("Invalid rolling window {0}: windows must be at least 1")]
    InvalidWindow(u16),

    #[error("Duplicate {kind} value {value}")]
    Duplicate { kind: &'static str, value: u16 },

    #[error("Invalid separator byte {0:#04x}")]
    InvalidSeparator(u8),

    #[error("Failed to read config file '{path}': {msg}")]
    Unreadable { path: String, msg: String },

    #[error("Failed to parse config file")]
    Parse(#[from] serde_json::Error),
}

/// Errors related to table contents, parsing and dataframe execution.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Failed to parse dates in '{table}': {msg}")]
    DateParse { table: String, msg: String },

    #[error("Missing column '{column}' in '{table}'")]
    MissingColumn { table: String, column: String },

    #[error("Row count changed while merging: expected {expected}, found {actual}")]
    RowCountMismatch { expected: usize, actual: usize },

    #[error("Data frame error: {0}")]
    DataFrame(String),
}

/// Errors related to file I/O and serialization.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("IO operation failed")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed")]
    Json(#[from] serde_json::Error),

    #[error("Required input '{table}' not found at {path}")]
    MissingFile { table: String, path: String },

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Failed to read data: {0}")]
    ReadFailed(String),

    #[error("Failed to write data: {0}")]
    WriteFailed(String),
}

pub(crate) fn polars_to_sales_prep_error(
    stage: &str,
    e: polars::error::PolarsError,
) -> SalesPrepError {
    SalesPrepError::Data(DataError::DataFrame(format!("Error while {stage}: {e}")))
}
