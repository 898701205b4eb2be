use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
    time::Instant,
};

use polars::prelude::{
    CsvWriter, DataFrame, DataType, IntoLazy, LazyCsvReader, LazyFileListReader, PlPath,
    SerWriter, StrptimeOptions,
};
use tracing::{debug, info};

use crate::{
    error::{DataError, IoError, SalesPrepResult},
    features::encode::CategoryCodes,
    schema::{SalesCol, SourceTable},
};

/// Format of every `date` column in the input files.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const INFER_SCHEMA_ROWS: usize = 10_000;
const WRITE_BUFFER_SIZE: usize = 128 * 1024;

// ================================================================================================
// Loader
// ================================================================================================

/// The five source tables of one run, with `date` columns parsed to `Date`.
#[derive(Debug, Clone)]
pub struct RawTables {
    pub train: DataFrame,
    pub stores: DataFrame,
    pub oil: DataFrame,
    pub holidays: DataFrame,
    pub transactions: DataFrame,
}

impl RawTables {
    pub fn load(dir: impl AsRef<Path>) -> SalesPrepResult<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            train: load_table(dir, SourceTable::Train)?,
            stores: load_table(dir, SourceTable::Stores)?,
            oil: load_table(dir, SourceTable::Oil)?,
            holidays: load_table(dir, SourceTable::HolidaysEvents)?,
            transactions: load_table(dir, SourceTable::Transactions)?,
        })
    }
}

/// Reads one source table from `dir`.
///
/// # Errors
/// - [`IoError::MissingFile`] if the file does not exist.
/// - [`DataError::MissingColumn`] if a dated table has no `date` column.
/// - [`DataError::DateParse`] if a non-empty `date` value is not `YYYY-MM-DD`.
pub fn load_table(dir: &Path, table: SourceTable) -> SalesPrepResult<DataFrame> {
    let start = Instant::now();
    let path = dir.join(table.file_name());
    if !path.is_file() {
        return Err(IoError::MissingFile {
            table: table.to_string(),
            path: path.display().to_string(),
        }
        .into());
    }

    let df = read_csv(&path, b',')?;
    let df = if table.has_date() {
        parse_dates(df, table)?
    } else {
        df
    };

    info!(
        table = %table,
        rows = df.height(),
        columns = df.width(),
        elapsed = %humantime::format_duration(start.elapsed()),
        "Loaded table"
    );
    Ok(df)
}

/// Reads a delimited file with a header row, inferring column types.
pub fn read_csv(path: &Path, separator: u8) -> SalesPrepResult<DataFrame> {
    let uri = path.to_str().ok_or_else(|| {
        IoError::FileSystem(format!(
            "Path contains invalid UTF-8 characters: {}",
            path.display()
        ))
    })?;

    LazyCsvReader::new(PlPath::new(uri))
        .with_has_header(true)
        .with_separator(separator)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|e| IoError::ReadFailed(format!("{}: {e}", path.display())).into())
}

fn parse_dates(df: DataFrame, table: SourceTable) -> SalesPrepResult<DataFrame> {
    let date = SalesCol::Date;
    let dtype = df
        .column(date.as_str())
        .map_err(|_| DataError::MissingColumn {
            table: table.to_string(),
            column: date.to_string(),
        })?
        .dtype()
        .clone();

    if dtype == DataType::Date {
        return Ok(df);
    }

    // Integer-typed or other non-text columns cannot hold ISO dates.
    if dtype != DataType::String {
        return Err(DataError::DateParse {
            table: table.to_string(),
            msg: format!("expected text dates, found column of type {dtype}"),
        }
        .into());
    }

    let options = StrptimeOptions {
        format: Some(DATE_FORMAT.into()),
        strict: true,
        exact: true,
        cache: true,
    };

    df.lazy()
        .with_column(date.expr().str().to_date(options).alias(date.as_str()))
        .collect()
        .map_err(|e| {
            DataError::DateParse {
                table: table.to_string(),
                msg: e.to_string(),
            }
            .into()
        })
}

// ================================================================================================
// Writer
// ================================================================================================

/// Writes `df` as a delimited file with one header row and no index column.
///
/// Missing parent directories are created. Existing files are overwritten.
pub fn write_csv(
    df: &mut DataFrame,
    path: impl AsRef<Path>,
    separator: u8,
) -> SalesPrepResult<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, create_file(path)?);

    CsvWriter::new(&mut writer)
        .include_header(true)
        .with_separator(separator)
        .finish(df)
        .map_err(|e| IoError::WriteFailed(format!("{}: {e}", path.display())))?;
    // Buffered bytes must reach storage before success is reported.
    writer.flush().map_err(IoError::Io)?;

    debug!(path = %path.display(), rows = df.height(), "Wrote feature table");
    Ok(())
}

/// Persists a family-to-code mapping as pretty JSON.
pub fn write_category_codes(
    codes: &CategoryCodes,
    path: impl AsRef<Path>,
) -> SalesPrepResult<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(create_file(path)?);
    serde_json::to_writer_pretty(&mut writer, codes).map_err(IoError::Json)?;
    writer.flush().map_err(IoError::Io)?;
    debug!(path = %path.display(), codes = codes.len(), "Wrote category codes");
    Ok(())
}

/// Loads a mapping previously written by [`write_category_codes`].
pub fn read_category_codes(path: impl AsRef<Path>) -> SalesPrepResult<CategoryCodes> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .map_err(|e| IoError::ReadFailed(format!("{}: {e}", path.display())))?;
    let codes = serde_json::from_str(&raw).map_err(IoError::Json)?;
    Ok(codes)
}

fn create_file(path: &Path) -> SalesPrepResult<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                IoError::FileSystem(format!(
                    "Failed to create directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }
    }

    File::create(path).map_err(|e| {
        IoError::WriteFailed(format!("Failed to create {}: {}", path.display(), e)).into()
    })
}

#[cfg(test)]
mod tests {
    use polars::df;
    use tempfile::TempDir;

    use crate::error::SalesPrepError;

    use super::*;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).expect("Failed to write fixture");
    }

    #[test]
    fn test_load_table_parses_dates() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        write_file(
            dir.path(),
            "oil.csv",
            "date,dcoilwtico\n2013-01-01,\n2013-01-02,93.14\n",
        );

        let df = load_table(dir.path(), SourceTable::Oil).expect("Oil should load");
        assert_eq!(df.height(), 2);
        assert_eq!(
            df.column("date").expect("date column").dtype(),
            &DataType::Date
        );
        assert_eq!(
            df.column("dcoilwtico")
                .expect("price column")
                .null_count(),
            1,
            "Empty price field should load as missing"
        );
    }

    #[test]
    fn test_load_table_without_date_column() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        write_file(
            dir.path(),
            "stores.csv",
            "store_nbr,city,state,type,cluster\n1,Quito,Pichincha,D,13\n",
        );

        let df = load_table(dir.path(), SourceTable::Stores).expect("Stores should load");
        assert_eq!(df.shape(), (1, 5));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let result = load_table(dir.path(), SourceTable::Transactions);

        match result {
            Err(SalesPrepError::Io(IoError::MissingFile { table, path })) => {
                assert_eq!(table, "transactions");
                assert!(path.ends_with("transactions.csv"), "path was {path}");
            }
            other => panic!("Expected MissingFile, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_date_fails() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        write_file(
            dir.path(),
            "holidays_events.csv",
            "date,type\n2013-01-01,Holiday\nnot-a-date,Event\n",
        );

        let result = load_table(dir.path(), SourceTable::HolidaysEvents);
        assert!(
            matches!(
                result,
                Err(SalesPrepError::Data(DataError::DateParse { .. }))
            ),
            "Expected DateParse, got {result:?}"
        );
    }

    #[test]
    fn test_missing_date_column_fails() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        write_file(dir.path(), "oil.csv", "day,dcoilwtico\n2013-01-01,93.1\n");

        let result = load_table(dir.path(), SourceTable::Oil);
        assert!(matches!(
            result,
            Err(SalesPrepError::Data(DataError::MissingColumn { .. }))
        ));
    }

    #[test]
    fn test_write_csv_creates_parent_and_omits_index() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("nested/out/features.csv");
        let mut df = df![
            "store_nbr" => &["1", "2"],
            "sales" => &[1.5, 2.0]
        ]
        .expect("Failed to create DF");

        write_csv(&mut df, &path, b',').expect("Write should succeed");

        let text = fs::read_to_string(&path).expect("Output should exist");
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("store_nbr,sales"));
        assert_eq!(lines.count(), 2, "One data line per row");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_failures_reach_the_caller() {
        let mut df = df![
            "a" => &[1i64, 2]
        ]
        .expect("Failed to create DF");

        let csv = write_csv(&mut df, "/dev/full", b',');
        assert!(
            matches!(csv, Err(SalesPrepError::Io(_))),
            "Expected an IO error from a full device, got {csv:?}"
        );

        let codes = CategoryCodes::from_values(["BEVERAGES", "PRODUCE"]);
        let json = write_category_codes(&codes, "/dev/full");
        assert!(
            matches!(json, Err(SalesPrepError::Io(_))),
            "Expected an IO error from a full device, got {json:?}"
        );
    }

    #[test]
    fn test_read_category_codes_names_missing_path() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("family_codes.json");

        match read_category_codes(&path) {
            Err(SalesPrepError::Io(IoError::ReadFailed(msg))) => {
                assert!(msg.contains("family_codes.json"), "message was {msg}");
            }
            other => panic!("Expected ReadFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_write_csv_with_custom_separator() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("features.tsv");
        let mut df = df![
            "a" => &[1, 2],
            "b" => &[3, 4]
        ]
        .expect("Failed to create DF");

        write_csv(&mut df, &path, b'\t').expect("Write should succeed");
        let reloaded = read_csv(&path, b'\t').expect("Read should succeed");
        assert_eq!(reloaded.shape(), (2, 2));
    }
}
