//! The two extraction strategies.
//!
//! [`OcrStrategy`] is preferred; [`IndexBasedStrategy`] is the fallback
//! when OCR is disabled, fails, or finds nothing. Selection between their
//! results happens in [`crate::record`].

use monthly_report_extract_models::FieldMap;
use monthly_report_pdf::{OcrError, PageSource, PdfError, TextRecognizer};

use crate::corrections::CorrectionEngine;
use crate::{BOILERPLATE_NUMBERS, RENDER_SCALE, layout_index, ocr_fields};

/// Failure inside a single strategy.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    /// A page view could not be produced.
    #[error(transparent)]
    Page(#[from] PdfError),

    /// The text recognizer failed.
    #[error(transparent)]
    Ocr(#[from] OcrError),
}

/// A way of turning a page into field values.
pub trait ExtractionStrategy {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Extracts whatever fields this strategy can find.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError`] if the page view the strategy relies on
    /// is unavailable.
    fn extract(&self, page: &dyn PageSource) -> Result<FieldMap, StrategyError>;
}

/// Fixed offsets into the plain text's digit runs.
#[derive(Debug, Clone, Copy)]
pub struct IndexBasedStrategy {
    /// Leading digit runs to drop.
    pub skip: usize,
}

impl Default for IndexBasedStrategy {
    fn default() -> Self {
        Self {
            skip: BOILERPLATE_NUMBERS,
        }
    }
}

impl IndexBasedStrategy {
    /// Reads the page's plain text and picks fields at the fixed offsets.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the plain text is unavailable.
    pub fn fields(&self, page: &dyn PageSource) -> Result<FieldMap, PdfError> {
        let text = page.plain_text()?;
        Ok(layout_index::extract_with_skip(&text, self.skip))
    }
}

impl ExtractionStrategy for IndexBasedStrategy {
    fn name(&self) -> &'static str {
        "layout-index"
    }

    fn extract(&self, page: &dyn PageSource) -> Result<FieldMap, StrategyError> {
        Ok(self.fields(page)?)
    }
}

/// Render, recognize, match patterns, then correct.
pub struct OcrStrategy<'a> {
    recognizer: &'a dyn TextRecognizer,
    engine: &'a CorrectionEngine,
    scale: f32,
}

impl<'a> OcrStrategy<'a> {
    /// Creates a strategy rendering at [`RENDER_SCALE`].
    #[must_use]
    pub fn new(recognizer: &'a dyn TextRecognizer, engine: &'a CorrectionEngine) -> Self {
        Self {
            recognizer,
            engine,
            scale: RENDER_SCALE,
        }
    }

    /// Overrides the render scale.
    #[must_use]
    pub const fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Runs recognition and returns the raw recognized text alongside the
    /// corrected fields.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError`] if rendering or recognition fails.
    pub fn recognize(&self, page: &dyn PageSource) -> Result<(String, FieldMap), StrategyError> {
        let image = page.render(self.scale)?;
        log::debug!(
            "Rendered page at {}x ({} bytes)",
            image.scale,
            image.png.len()
        );

        let text = self.recognizer.recognize(&image)?;
        let raw = ocr_fields::extract(&text);
        let corrected = self.engine.correct(raw, &text);

        Ok((text, corrected))
    }
}

impl ExtractionStrategy for OcrStrategy<'_> {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn extract(&self, page: &dyn PageSource) -> Result<FieldMap, StrategyError> {
        self.recognize(page).map(|(_, fields)| fields)
    }
}
