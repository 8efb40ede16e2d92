#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Field extraction and normalization for monthly compliance reports.
//!
//! A report's first page is read through [`monthly_report_pdf::PageSource`]
//! and turned into a [`SchoolRecord`] by:
//!
//! - [`name`]: the school name from a fixed layout block
//! - [`layout_index`]: fields at fixed offsets in the plain text's digit runs
//! - [`ocr_fields`] + [`corrections`]: fields recognized from a rendered
//!   image, with catalogued misreadings fixed up
//! - [`record`]: picking the better extraction and freezing the record
//!
//! [`rows`] then derives one or two [`OutputRow`]s per record.
//! [`pipeline::Pipeline`] wires all of it together for one document, and
//! [`progress::ProgressCallback`] lets a batch driver report its progress.

pub mod corrections;
pub mod layout_index;
pub mod name;
pub mod ocr_fields;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod registry;
pub mod rows;
pub mod strategy;

pub use monthly_report_extract_models::{
    FieldLabel, FieldMap, FieldValue, OutputRow, SchoolRecord,
};
pub use pipeline::{DocumentResult, Pipeline};

use monthly_report_pdf::PdfError;

/// Index of the layout block that holds the school name.
pub const NAME_BLOCK_INDEX: usize = 18;

/// Number of leading digit runs in the plain text that are template
/// boilerplate.
pub const BOILERPLATE_NUMBERS: usize = 37;

/// Linear scale at which pages are rendered for OCR.
pub const RENDER_SCALE: f32 = 2.0;

/// Tunables for one extraction run. [`Default`] matches the report
/// template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractOptions {
    /// See [`NAME_BLOCK_INDEX`].
    pub name_block_index: usize,
    /// See [`BOILERPLATE_NUMBERS`].
    pub boilerplate_numbers: usize,
    /// See [`RENDER_SCALE`].
    pub render_scale: f32,
    /// Whether the OCR strategy runs at all.
    pub use_ocr: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            name_block_index: NAME_BLOCK_INDEX,
            boilerplate_numbers: BOILERPLATE_NUMBERS,
            render_scale: RENDER_SCALE,
            use_ocr: true,
        }
    }
}

/// Why a document produced no record.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The document or its first page could not be read.
    #[error(transparent)]
    Open(#[from] PdfError),

    /// Neither strategy found a single field.
    #[error("No fields could be extracted from {document}")]
    ExtractionEmpty {
        /// Document name.
        document: String,
    },
}
