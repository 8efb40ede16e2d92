#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! First-page access for monthly report PDFs.
//!
//! The extraction pipeline needs three views of a report's first page:
//! plain text, a block/line/span layout tree, and a rendered raster for
//! OCR. [`PageSource`] abstracts those views so the pipeline can be
//! driven by fakes in tests. [`PopplerPage`] is the real implementation,
//! combining pure-Rust text extraction ([`pdf_extract`]) with the Poppler
//! command-line tools for layout and rendering.
//!
//! Text recognition lives behind [`TextRecognizer`], implemented by
//! [`TesseractRecognizer`].

pub mod layout;
pub mod ocr;
pub mod poppler;

mod tool;

pub use layout::{Block, Line, Span};
pub use ocr::{OcrError, TesseractRecognizer, TextRecognizer};
pub use poppler::{PopplerPage, PopplerTools};

/// Errors specific to PDF page access.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// The document file could not be read.
    #[error("Failed to open {path}: {source}")]
    Open {
        /// Path of the document.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// An external tool failed or is not installed.
    #[error("{tool} failed: {message}")]
    Tool {
        /// Program name (e.g. `pdftoppm`).
        tool: String,
        /// Exit status or stderr output.
        message: String,
    },

    /// The structured layout output could not be interpreted.
    #[error("Layout error: {0}")]
    Layout(String),

    /// An I/O operation on a temporary file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A rendered page image.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// PNG-encoded raster.
    pub png: Vec<u8>,
    /// Linear scale relative to the page's native 72 DPI.
    pub scale: f32,
}

/// The three views of a document's first page.
pub trait PageSource {
    /// Plain text of the first page, in content-stream order.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the text cannot be extracted.
    fn plain_text(&self) -> Result<String, PdfError>;

    /// Structured layout of the first page.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the layout cannot be produced or parsed.
    fn layout(&self) -> Result<Vec<Block>, PdfError>;

    /// Renders the first page at `scale` times its native resolution.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if rendering fails.
    fn render(&self, scale: f32) -> Result<RenderedPage, PdfError>;
}
