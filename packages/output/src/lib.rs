#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV output for derived report rows.
//!
//! Rows are written in [`COLUMNS`] order. A new file gets the header; an
//! existing file is appended to only if its header matches.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use monthly_report_extract_models::{COLUMNS, OutputRow};

/// Prefix of generated output file names.
pub const OUTPUT_PREFIX: &str = "monthly_report_data";

/// Errors from writing the output file.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// The file could not be opened or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Output path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The CSV writer or reader failed.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// Output path.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// The existing file's header differs from [`COLUMNS`].
    #[error("Cannot append to {path}: header is [{found}], expected [{expected}]")]
    HeaderMismatch {
        /// Output path.
        path: String,
        /// Header found in the file.
        found: String,
        /// Expected header.
        expected: String,
    },
}

/// How the output file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create (or truncate) the file and write the header.
    Create,
    /// Append to the file, writing the header only if it is new or empty.
    Append,
}

/// Output file name for a run started at `at`.
#[must_use]
pub fn versioned_file_name(at: DateTime<Local>) -> String {
    format!("{OUTPUT_PREFIX}_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// Output path in `dir` for a run started now.
#[must_use]
pub fn versioned_output_path(dir: &Path) -> PathBuf {
    dir.join(versioned_file_name(Local::now()))
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> OutputError + '_ {
    move |source| OutputError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> OutputError + '_ {
    move |source| OutputError::Csv {
        path: path.display().to_string(),
        source,
    }
}

/// Reads the first record of an existing file. `None` if the file is
/// missing or empty.
fn existing_header(path: &Path) -> Result<Option<Vec<String>>, OutputError> {
    if !path.exists() {
        return Ok(None);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error(path))?;

    let mut record = csv::StringRecord::new();
    if reader.read_record(&mut record).map_err(csv_error(path))? {
        Ok(Some(record.iter().map(str::to_owned).collect()))
    } else {
        Ok(None)
    }
}

/// Writes `rows` to `path`. Returns the number of rows written.
///
/// # Errors
///
/// * [`OutputError::HeaderMismatch`] when appending to a file with a
///   different header
/// * [`OutputError::Io`] or [`OutputError::Csv`] if writing fails
pub fn write_rows(path: &Path, rows: &[OutputRow], mode: WriteMode) -> Result<usize, OutputError> {
    let write_header = match mode {
        WriteMode::Create => true,
        WriteMode::Append => match existing_header(path)? {
            None => true,
            Some(found) if found == COLUMNS => false,
            Some(found) => {
                return Err(OutputError::HeaderMismatch {
                    path: path.display().to_string(),
                    found: found.join(","),
                    expected: COLUMNS.join(","),
                });
            }
        },
    };

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(mode == WriteMode::Append)
        .truncate(mode == WriteMode::Create)
        .open(path)
        .map_err(io_error(path))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if write_header {
        writer.write_record(COLUMNS).map_err(csv_error(path))?;
    }

    for row in rows {
        writer.write_record(row.cells()).map_err(csv_error(path))?;
    }

    writer.flush().map_err(io_error(path))?;

    log::info!(
        "{} {} row(s) to {}",
        if write_header { "Wrote" } else { "Appended" },
        rows.len(),
        path.display()
    );

    Ok(rows.len())
}
