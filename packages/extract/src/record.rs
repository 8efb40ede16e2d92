//! Freezing an extraction into a [`SchoolRecord`].

use monthly_report_extract_models::{FieldMap, SchoolRecord};
use serde::Serialize;

use crate::registry::SchoolRegistry;

/// Which strategy a record's values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldSource {
    /// Rendered image, recognized and corrected.
    Ocr,
    /// Fixed offsets into the plain text.
    LayoutIndex,
}

impl std::fmt::Display for FieldSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Ocr => "ocr",
            Self::LayoutIndex => "layout-index",
        })
    }
}

/// Picks the OCR fields when they hold at least one value, otherwise the
/// layout-index fields.
#[must_use]
pub fn select_fields<'a>(primary: &'a FieldMap, ocr: &'a FieldMap) -> (FieldSource, &'a FieldMap) {
    if ocr.is_empty() {
        (FieldSource::LayoutIndex, primary)
    } else {
        (FieldSource::Ocr, ocr)
    }
}

/// Builds the record from whichever extraction [`select_fields`] prefers.
#[must_use]
pub fn build(name: &str, is_both: bool, primary: &FieldMap, ocr: &FieldMap) -> SchoolRecord {
    let (source, fields) = select_fields(primary, ocr);
    log::debug!("{name}: using {source} fields ({} populated)", fields.len());
    SchoolRecord::new(name, is_both, fields)
}

/// Builds records, deciding `is_both` from the combined-school roster.
#[derive(Debug, Clone, Copy)]
pub struct SchoolRecordBuilder<'a> {
    registry: &'a SchoolRegistry,
}

impl<'a> SchoolRecordBuilder<'a> {
    /// Creates a builder over `registry`.
    #[must_use]
    pub const fn new(registry: &'a SchoolRegistry) -> Self {
        Self { registry }
    }

    /// See [`build`]. `is_both` is true iff `name` is on the roster.
    #[must_use]
    pub fn build(&self, name: &str, primary: &FieldMap, ocr: &FieldMap) -> SchoolRecord {
        build(name, self.registry.is_combined(name), primary, ocr)
    }
}
