//! Dataset and report serialization: JSON, CSV and YAML.

pub mod csv;
pub mod format;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, TmError};
use crate::model::record::EmailRecord;

pub use self::csv::CsvRow;
pub use self::format::OutputFormat;

/// Options shared by every writer.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    pub format: OutputFormat,
    /// Field separator for CSV output.
    pub csv_separator: char,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            csv_separator: ',',
        }
    }
}

/// Write a sequence of rows (records or flattened report rows).
pub fn write_rows<T>(rows: &[T], path: &Path, opts: WriteOptions) -> Result<()>
where
    T: Serialize + CsvRow,
{
    debug!(path = %path.display(), format = %opts.format, count = rows.len(), "Writing rows");
    match opts.format {
        OutputFormat::Csv => csv::write_csv(rows, path, opts.csv_separator),
        OutputFormat::Json | OutputFormat::Yaml => write_document(rows, path, opts.format),
    }
}

/// Write a dataset in the chosen format.
pub fn write_dataset(records: &[EmailRecord], path: &Path, opts: WriteOptions) -> Result<()> {
    write_rows(records, path, opts)
}

/// Write a structured (nested) document as JSON or YAML.
///
/// Nested reports have no single-level form, so CSV is rejected here;
/// callers flatten them and use [`write_rows`] instead.
pub fn write_document<T: Serialize + ?Sized>(
    value: &T,
    path: &Path,
    format: OutputFormat,
) -> Result<()> {
    if format == OutputFormat::Csv {
        return Err(TmError::UnsupportedFormat(
            "csv cannot represent a nested document".to_string(),
        ));
    }
    let file = File::create(path).map_err(|e| TmError::io(path, e))?;
    let mut out = BufWriter::new(file);
    if format == OutputFormat::Yaml {
        serde_yaml::to_writer(&mut out, value)?;
    } else {
        serde_json::to_writer_pretty(&mut out, value)?;
        out.write_all(b"\n").map_err(|e| TmError::io(path, e))?;
    }
    out.flush().map_err(|e| TmError::io(path, e))
}

/// Read a dataset written as JSON or YAML.
///
/// The format is taken from the extension; unknown extensions are read as JSON.
/// Fields missing from a stored record take their empty defaults.
pub fn read_dataset(path: &Path) -> Result<Vec<EmailRecord>> {
    let format = OutputFormat::from_path(path).unwrap_or(OutputFormat::Json);
    let file = File::open(path).map_err(|e| TmError::io(path, e))?;
    let reader = BufReader::new(file);
    let records: Vec<EmailRecord> = match format {
        OutputFormat::Json => serde_json::from_reader(reader)?,
        OutputFormat::Yaml => serde_yaml::from_reader(reader)?,
        OutputFormat::Csv => {
            return Err(TmError::UnsupportedFormat(format!(
                "cannot read a dataset from CSV: {}",
                path.display()
            )))
        }
    };
    debug!(path = %path.display(), count = records.len(), "Loaded dataset");
    Ok(records)
}
