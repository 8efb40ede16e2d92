//! Text recognition over rendered pages.

use std::ffi::OsStr;
use std::path::PathBuf;

use crate::{PdfError, RenderedPage, tool};

/// Errors raised by a recognition engine.
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    /// Writing the image for the engine failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine failed or is not installed.
    #[error("OCR engine error: {message}")]
    Engine {
        /// Description of what went wrong.
        message: String,
    },
}

impl From<PdfError> for OcrError {
    fn from(e: PdfError) -> Self {
        Self::Engine {
            message: e.to_string(),
        }
    }
}

/// Converts a raster into text.
pub trait TextRecognizer {
    /// Recognizes all text in `image`.
    ///
    /// # Errors
    ///
    /// Returns [`OcrError`] if recognition fails.
    fn recognize(&self, image: &RenderedPage) -> Result<String, OcrError>;
}

/// [`TextRecognizer`] that runs the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    program: PathBuf,
}

impl TesseractRecognizer {
    /// Creates a recognizer using the given `tesseract` executable.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &RenderedPage) -> Result<String, OcrError> {
        let image_path = tool::temp_path("png");
        std::fs::write(&image_path, &image.png)?;

        let result = tool::run(
            &self.program,
            &[image_path.as_os_str(), OsStr::new("stdout")],
        );
        std::fs::remove_file(&image_path).ok();

        let text = String::from_utf8_lossy(&result?).into_owned();

        log::debug!("Recognized {} characters of text", text.len());

        Ok(text)
    }
}
