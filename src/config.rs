use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::{ConfigError, SalesPrepResult};

pub const DEFAULT_DATA_DIR: &str = "data/store-sales-time-series-forecasting/";
pub const DEFAULT_OUTPUT_PATH: &str = "data/processed_train.csv";

/// How missing cells left after feature derivation are filled.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
    Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FillPolicy {
    /// Each missing cell takes the next non-missing value below it in table order.
    ///
    /// Ignores series boundaries: the head of one series can be filled from
    /// the data of the series that follows it.
    #[default]
    GlobalBackward,

    /// Backward fill restricted to each (store, family) series in date order.
    /// Cells with no later value in their own series stay missing.
    PerSeriesBackward,

    /// Leave missing cells untouched; they are written as empty fields.
    Keep,
}

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory containing the five input files.
    pub data_dir: PathBuf,

    /// Destination of the feature table.
    pub output_path: PathBuf,

    /// Lag offsets, in periods of the series.
    pub lags: Vec<u16>,

    /// Rolling window sizes, in periods of the series.
    pub windows: Vec<u16>,

    pub fill_policy: FillPolicy,

    /// Field separator of the output file.
    pub separator: u8,

    /// Where to persist the family-to-code mapping. Not written when `None`.
    pub category_codes_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            lags: vec![1],
            windows: vec![7],
            fill_policy: FillPolicy::default(),
            separator: b',',
            category_codes_path: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> SalesPrepResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            msg: e.to_string(),
        })?;
        let cfg: Self = serde_json::from_str(&raw).map_err(ConfigError::Parse)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_data_dir(self, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..self
        }
    }

    pub fn with_output_path(self, output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            ..self
        }
    }

    pub fn with_lags(self, lags: impl IntoIterator<Item = u16>) -> Self {
        Self {
            lags: lags.into_iter().collect(),
            ..self
        }
    }

    pub fn with_windows(self, windows: impl IntoIterator<Item = u16>) -> Self {
        Self {
            windows: windows.into_iter().collect(),
            ..self
        }
    }

    pub fn with_fill_policy(self, fill_policy: FillPolicy) -> Self {
        Self {
            fill_policy,
            ..self
        }
    }

    pub fn with_separator(self, separator: u8) -> Self {
        Self { separator, ..self }
    }

    pub fn with_category_codes_path(self, path: impl Into<PathBuf>) -> Self {
        Self {
            category_codes_path: Some(path.into()),
            ..self
        }
    }

    /// Rejects zero or repeated lags/windows and separators that would break the CSV layout.
    pub fn validate(&self) -> SalesPrepResult<()> {
        validate_periods(&self.lags, "lag", ConfigError::InvalidLag)?;
        validate_periods(&self.windows, "window", ConfigError::InvalidWindow)?;

        if matches!(self.separator, b'"' | b'\n' | b'\r') {
            return Err(ConfigError::InvalidSeparator(self.separator).into());
        }
        Ok(())
    }
}

pub(crate) fn validate_periods(
    values: &[u16],
    kind: &'static str,
    invalid: fn(u16) -> ConfigError,
) -> SalesPrepResult<()> {
    let mut seen = BTreeSet::new();
    for &value in values {
        if value == 0 {
            return Err(invalid(value).into());
        }
        if !seen.insert(value) {
            return Err(ConfigError::Duplicate { kind, value }.into());
        }
    }
    Ok(())
}
