#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch driver for monthly report extraction.
//!
//! Resolves inputs into PDF documents, runs the extraction pipeline on
//! each one in turn, sorts the resulting rows by school and writes them to
//! the CSV sink. A failing document is recorded in the [`BatchSummary`]
//! and never stops the batch.

pub mod inputs;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use monthly_report_extract::progress::ProgressCallback;
use monthly_report_extract::{DocumentError, DocumentResult, ExtractOptions, Pipeline};
use monthly_report_extract_models::OutputRow;
use monthly_report_output::{OutputError, WriteMode};
use monthly_report_pdf::{PopplerTools, TesseractRecognizer, TextRecognizer};
use serde::Serialize;

pub use inputs::Inputs;

/// Errors that abort a whole batch.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// An input path does not exist.
    #[error("Input not found: {0}")]
    NotFound(String),

    /// A file or directory could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A ZIP archive could not be opened.
    #[error("ZIP error in {path}: {source}")]
    Zip {
        /// Archive path.
        path: String,
        /// Underlying ZIP error.
        source: zip::result::ZipError,
    },

    /// The output file could not be written.
    #[error(transparent)]
    Output(#[from] OutputError),

    /// The inputs contained no PDF documents.
    #[error("No PDF documents found in the given inputs")]
    NoDocuments,
}

/// One document that produced no rows.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentFailure {
    /// Document name.
    pub document: String,
    /// Why it failed.
    pub error: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    /// Documents attempted.
    pub total: usize,
    /// Documents that produced rows.
    pub succeeded: usize,
    /// Documents that did not.
    pub failed: Vec<DocumentFailure>,
    /// Rows from every successful document, sorted by school.
    pub rows: Vec<OutputRow>,
    /// Where the rows were written, once written.
    pub output: Option<PathBuf>,
}

/// Settings for [`ingest`].
#[derive(Debug, Clone)]
pub struct IngestRequest {
    /// PDFs, directories and ZIP archives to process.
    pub inputs: Vec<PathBuf>,
    /// Output file. Defaults to a timestamped file in the current directory.
    pub output: Option<PathBuf>,
    /// Append to `output` instead of replacing it.
    pub append: bool,
    /// Extraction tunables.
    pub options: ExtractOptions,
    /// Poppler tool locations.
    pub tools: PopplerTools,
    /// Tesseract program.
    pub tesseract: PathBuf,
}

/// Sorts rows by school name, keeping the relative order of equal names.
pub fn sort_rows(rows: &mut [OutputRow]) {
    rows.sort_by(|a, b| a.school.cmp(&b.school));
}

/// Runs `process` over every document, isolating failures.
pub fn run_batch<F>(
    documents: &[PathBuf],
    mut process: F,
    progress: &Arc<dyn ProgressCallback>,
) -> BatchSummary
where
    F: FnMut(&Path) -> Result<DocumentResult, DocumentError>,
{
    let start = Instant::now();
    let mut summary = BatchSummary {
        total: documents.len(),
        ..BatchSummary::default()
    };

    progress.set_total(documents.len() as u64);

    for path in documents {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        progress.set_message(name.clone());

        match process(path) {
            Ok(result) => {
                summary.succeeded += 1;
                summary.rows.extend(result.rows);
            }
            Err(e) => {
                log::error!("Skipping {name}: {e}");
                summary.failed.push(DocumentFailure {
                    document: name,
                    error: e.to_string(),
                });
            }
        }

        progress.inc(1);
    }

    sort_rows(&mut summary.rows);

    progress.finish(format!(
        "{}/{} document(s) processed",
        summary.succeeded, summary.total
    ));
    log::info!(
        "Processed {} document(s) in {:.1}s: {} succeeded, {} failed, {} row(s)",
        summary.total,
        start.elapsed().as_secs_f64(),
        summary.succeeded,
        summary.failed.len(),
        summary.rows.len()
    );

    summary
}

/// Resolves inputs, extracts every document and writes the output file.
///
/// # Errors
///
/// Returns [`IngestError`] if inputs cannot be resolved, contain no
/// documents, or the output cannot be written. Individual document
/// failures are reported in the summary instead.
pub fn ingest(
    request: &IngestRequest,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<BatchSummary, IngestError> {
    let inputs = Inputs::collect(&request.inputs)?;
    if inputs.is_empty() {
        return Err(IngestError::NoDocuments);
    }

    let recognizer = TesseractRecognizer::new(&request.tesseract);
    let recognizer: Option<&dyn TextRecognizer> = Some(&recognizer);
    let pipeline = Pipeline::new(request.options, recognizer);

    let mut summary = run_batch(
        inputs.documents(),
        |path| pipeline.process_file(path, &request.tools),
        progress,
    );

    let output = request
        .output
        .clone()
        .unwrap_or_else(|| monthly_report_output::versioned_output_path(Path::new(".")));
    let mode = if request.append {
        WriteMode::Append
    } else {
        WriteMode::Create
    };

    monthly_report_output::write_rows(&output, &summary.rows, mode)?;
    summary.output = Some(output);

    Ok(summary)
}
