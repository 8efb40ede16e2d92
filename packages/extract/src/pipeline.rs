//! Per-document extraction pipeline.
//!
//! Reads the page, locates the name, runs both strategies, freezes the
//! record and derives its rows. Layout and OCR failures are recovered
//! here; only an unreadable document or an empty extraction surfaces as a
//! [`DocumentError`].

use std::path::Path;

use monthly_report_extract_models::{FieldMap, OutputRow, SchoolRecord, UNKNOWN_SCHOOL};
use monthly_report_pdf::{PageSource, PopplerPage, PopplerTools, TextRecognizer};
use serde::Serialize;

use crate::corrections::CorrectionEngine;
use crate::record::{FieldSource, SchoolRecordBuilder, select_fields};
use crate::registry::{SchoolRegistry, registry};
use crate::strategy::{ExtractionStrategy as _, IndexBasedStrategy, OcrStrategy};
use crate::{DocumentError, ExtractOptions, name, rows};

/// Everything produced for one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResult {
    /// Document name (usually the file name).
    pub document: String,
    /// The frozen record.
    pub record: SchoolRecord,
    /// Strategy the record's values came from.
    pub source: FieldSource,
    /// Derived output rows.
    pub rows: Vec<OutputRow>,
}

/// Runs extraction for one document at a time. Holds no per-document
/// state, so one instance serves a whole batch.
pub struct Pipeline<'a> {
    options: ExtractOptions,
    registry: &'a SchoolRegistry,
    engine: CorrectionEngine,
    recognizer: Option<&'a dyn TextRecognizer>,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline over the embedded school registry. OCR runs only
    /// when `recognizer` is given and `options.use_ocr` is set.
    #[must_use]
    pub fn new(options: ExtractOptions, recognizer: Option<&'a dyn TextRecognizer>) -> Self {
        Self::with_registry(options, registry(), recognizer)
    }

    /// Like [`Pipeline::new`] with an explicit registry.
    #[must_use]
    pub fn with_registry(
        options: ExtractOptions,
        registry: &'a SchoolRegistry,
        recognizer: Option<&'a dyn TextRecognizer>,
    ) -> Self {
        Self {
            options,
            registry,
            engine: CorrectionEngine::standard(registry),
            recognizer: recognizer.filter(|_| options.use_ocr),
        }
    }

    /// The options this pipeline was built with.
    #[must_use]
    pub const fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Opens the PDF at `path` and processes its first page.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::process`].
    pub fn process_file(
        &self,
        path: &Path,
        tools: &PopplerTools,
    ) -> Result<DocumentResult, DocumentError> {
        let document = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let page = PopplerPage::open(path, tools.clone())?;
        self.process(&page, &document)
    }

    /// Processes one page.
    ///
    /// # Errors
    ///
    /// * [`DocumentError::Open`] if the page's plain text cannot be read
    /// * [`DocumentError::ExtractionEmpty`] if neither strategy found a field
    pub fn process(
        &self,
        page: &dyn PageSource,
        document: &str,
    ) -> Result<DocumentResult, DocumentError> {
        let primary = self.layout_index_fields(page)?;
        let school = self.school_name(page, document);
        let ocr = self.ocr_fields(page, document);

        let (source, _) = select_fields(&primary, &ocr);
        let record = SchoolRecordBuilder::new(self.registry).build(&school, &primary, &ocr);

        if record.populated_count() == 0 {
            return Err(DocumentError::ExtractionEmpty {
                document: document.to_owned(),
            });
        }

        let rows = rows::derive(&record);
        log::info!(
            "{document}: {} via {source}, {} field(s), {} row(s)",
            record.name(),
            record.populated_count(),
            rows.len()
        );

        Ok(DocumentResult {
            document: document.to_owned(),
            record,
            source,
            rows,
        })
    }

    fn layout_index_fields(&self, page: &dyn PageSource) -> Result<FieldMap, DocumentError> {
        let strategy = IndexBasedStrategy {
            skip: self.options.boilerplate_numbers,
        };
        Ok(strategy.fields(page)?)
    }

    fn school_name(&self, page: &dyn PageSource, document: &str) -> String {
        let school = match page.layout() {
            Ok(blocks) => name::locate_at(&blocks, self.options.name_block_index),
            Err(e) => {
                log::warn!("{document}: layout unavailable ({e})");
                UNKNOWN_SCHOOL.to_owned()
            }
        };

        if school == UNKNOWN_SCHOOL {
            log::warn!("{document}: school name not found, using '{UNKNOWN_SCHOOL}'");
        }

        school
    }

    fn ocr_fields(&self, page: &dyn PageSource, document: &str) -> FieldMap {
        let Some(recognizer) = self.recognizer else {
            return FieldMap::new();
        };

        let strategy =
            OcrStrategy::new(recognizer, &self.engine).with_scale(self.options.render_scale);

        match strategy.extract(page) {
            Ok(fields) => {
                if fields.is_empty() {
                    log::warn!("{document}: OCR matched no fields, falling back to layout index");
                }
                fields
            }
            Err(e) => {
                log::warn!("{document}: OCR failed ({e}), falling back to layout index");
                FieldMap::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monthly_report_extract_models::{FieldLabel, FieldValue};
    use monthly_report_pdf::{Block, Line, OcrError, PdfError, RenderedPage, Span};
    use std::fmt::Write as _;

    struct FakePage {
        text: Option<String>,
        blocks: Option<Vec<Block>>,
        renders: bool,
    }

    impl PageSource for FakePage {
        fn plain_text(&self) -> Result<String, PdfError> {
            self.text
                .clone()
                .ok_or_else(|| PdfError::Extraction("no content stream".to_owned()))
        }

        fn layout(&self) -> Result<Vec<Block>, PdfError> {
            self.blocks.clone().ok_or_else(|| PdfError::Tool {
                tool: "pdftotext".to_owned(),
                message: "not installed".to_owned(),
            })
        }

        fn render(&self, scale: f32) -> Result<RenderedPage, PdfError> {
            if self.renders {
                Ok(RenderedPage {
                    png: vec![0x89, b'P', b'N', b'G'],
                    scale,
                })
            } else {
                Err(PdfError::Tool {
                    tool: "pdftoppm".to_owned(),
                    message: "not installed".to_owned(),
                })
            }
        }
    }

    struct FakeRecognizer(Result<&'static str, &'static str>);

    impl TextRecognizer for FakeRecognizer {
        fn recognize(&self, _image: &RenderedPage) -> Result<String, OcrError> {
            self.0.map(str::to_owned).map_err(|m| OcrError::Engine {
                message: m.to_owned(),
            })
        }
    }

    fn layout_named(school: &str) -> Vec<Block> {
        let mut blocks = vec![Block::default(); crate::NAME_BLOCK_INDEX];
        blocks.push(Block {
            lines: vec![Line {
                spans: vec![Span {
                    text: school.to_owned(),
                }],
            }],
        });
        blocks
    }

    /// Plain text whose post-boilerplate digit runs are `values`.
    fn plain_text(values: &[u64]) -> String {
        let mut text = String::new();
        for i in 0..crate::BOILERPLATE_NUMBERS {
            writeln!(text, "Header {i}").unwrap();
        }
        for v in values {
            writeln!(text, "{v}").unwrap();
        }
        text
    }

    fn page(school: &str, values: &[u64]) -> FakePage {
        FakePage {
            text: Some(plain_text(values)),
            blocks: Some(layout_named(school)),
            renders: true,
        }
    }

    const OCR_TEXT: &str = "\
Ohio Virtual Academy
Number of substitute teachers: 2
IS serving grades K-8: 1
IS serving grades 9-12: 45
Number of SWD K-8: 1
Number of SWD 9-12: 1
OSS of SWD 9-12: go
Emergency removals: 0
";

    #[test]
    fn ocr_result_is_corrected_and_split() {
        let recognizer = FakeRecognizer(Ok(OCR_TEXT));
        let pipeline = Pipeline::new(ExtractOptions::default(), Some(&recognizer));

        let result = pipeline
            .process(&page("Ohio Virtual Academy", &[0, 7]), "ohva.pdf")
            .unwrap();

        assert_eq!(result.source, FieldSource::Ocr);
        assert!(result.record.is_both());
        assert_eq!(result.record.get(FieldLabel::IsK8), Some(FieldValue::Fte(11.0)));
        assert_eq!(result.record.get(FieldLabel::Is912), Some(FieldValue::Fte(4.5)));
        assert_eq!(result.record.get(FieldLabel::SwdK8), Some(FieldValue::Count(1432)));
        assert_eq!(result.record.get(FieldLabel::Swd912), Some(FieldValue::Count(1431)));
        assert_eq!(result.record.get(FieldLabel::Oss912), Some(FieldValue::Count(60)));

        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].school, "Ohio Virtual Academy ES");
        assert_eq!(result.rows[1].school, "Ohio Virtual Academy HS");
        assert_eq!(result.rows[1].oss, Some(FieldValue::Count(60)));
        assert_eq!(result.rows[0].er, None);
    }

    #[test]
    fn recognizer_failure_falls_back_to_layout_index() {
        let recognizer = FakeRecognizer(Err("tesseract crashed"));
        let pipeline = Pipeline::new(ExtractOptions::default(), Some(&recognizer));

        let result = pipeline
            .process(&page("Lincoln Community School", &[9, 5, 7, 3, 12, 0]), "lcs.pdf")
            .unwrap();

        assert_eq!(result.source, FieldSource::LayoutIndex);
        assert_eq!(result.record.get(FieldLabel::Sub), Some(FieldValue::Count(5)));
        assert_eq!(result.record.get(FieldLabel::Is912), Some(FieldValue::Fte(7.0)));
        assert_eq!(result.record.get(FieldLabel::SwdK8), Some(FieldValue::Count(12)));
        assert_eq!(result.record.get(FieldLabel::Swd912), Some(FieldValue::Count(0)));

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].school, "Lincoln Community School");
        assert_eq!(result.rows[0].students, Some(FieldValue::Count(12)));
    }

    #[test]
    fn render_failure_falls_back_to_layout_index() {
        let recognizer = FakeRecognizer(Ok(OCR_TEXT));
        let pipeline = Pipeline::new(ExtractOptions::default(), Some(&recognizer));
        let mut fake = page("Lincoln Community School", &[9, 5]);
        fake.renders = false;

        let result = pipeline.process(&fake, "lcs.pdf").unwrap();
        assert_eq!(result.source, FieldSource::LayoutIndex);
    }

    #[test]
    fn disabled_ocr_never_calls_recognizer() {
        let recognizer = FakeRecognizer(Ok(OCR_TEXT));
        let options = ExtractOptions {
            use_ocr: false,
            ..ExtractOptions::default()
        };
        let pipeline = Pipeline::new(options, Some(&recognizer));

        let result = pipeline
            .process(&page("Lincoln Community School", &[9, 5]), "lcs.pdf")
            .unwrap();
        assert_eq!(result.source, FieldSource::LayoutIndex);
        assert_eq!(result.record.get(FieldLabel::Sub), Some(FieldValue::Count(5)));
    }

    #[test]
    fn missing_layout_yields_placeholder_name() {
        let pipeline = Pipeline::new(ExtractOptions::default(), None);
        let mut fake = page("ignored", &[9, 5]);
        fake.blocks = None;

        let result = pipeline.process(&fake, "x.pdf").unwrap();
        assert_eq!(result.record.name(), UNKNOWN_SCHOOL);
    }

    #[test]
    fn unreadable_text_is_an_open_error() {
        let pipeline = Pipeline::new(ExtractOptions::default(), None);
        let mut fake = page("Lincoln Community School", &[]);
        fake.text = None;

        let err = pipeline.process(&fake, "x.pdf").unwrap_err();
        assert!(matches!(err, DocumentError::Open(PdfError::Extraction(_))));
    }

    #[test]
    fn nothing_found_is_extraction_empty() {
        let recognizer = FakeRecognizer(Ok("unrelated text"));
        let pipeline = Pipeline::new(ExtractOptions::default(), Some(&recognizer));

        let err = pipeline
            .process(&page("Lincoln Community School", &[]), "blank.pdf")
            .unwrap_err();

        match err {
            DocumentError::ExtractionEmpty { document } => assert_eq!(document, "blank.pdf"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pipeline_is_reusable_across_documents() {
        let recognizer = FakeRecognizer(Err("offline"));
        let pipeline = Pipeline::new(ExtractOptions::default(), Some(&recognizer));

        let first = pipeline.process(&page("A School", &[1, 2]), "a.pdf").unwrap();
        let second = pipeline.process(&page("B School", &[1, 3]), "b.pdf").unwrap();

        assert_eq!(first.record.name(), "A School");
        assert_eq!(second.record.name(), "B School");
        assert_eq!(second.record.get(FieldLabel::Sub), Some(FieldValue::Count(3)));
    }
}
