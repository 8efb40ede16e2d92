//! Layout-index extraction.
//!
//! Every maximal digit run in the page's plain text is collected in
//! document order. The first [`BOILERPLATE_NUMBERS`] runs are template
//! boilerplate (page numbers, dates, identifiers) and are dropped; each
//! field then sits at a fixed offset in what remains.
//!
//! Any drift in the template silently shifts every offset, so this is
//! only the fallback when OCR yields nothing.

use std::sync::LazyLock;

use monthly_report_extract_models::{FieldLabel, FieldMap};
use regex::Regex;

use crate::BOILERPLATE_NUMBERS;

static DIGIT_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

/// Offset of each field in the digit-run sequence after the boilerplate
/// has been dropped.
pub const OFFSETS: [(FieldLabel, usize); 11] = [
    (FieldLabel::Sub, 1),
    (FieldLabel::IsK8, 15),
    (FieldLabel::Is912, 2),
    (FieldLabel::SwdK8, 4),
    (FieldLabel::Swd912, 5),
    (FieldLabel::OssK8, 9),
    (FieldLabel::Oss912, 10),
    (FieldLabel::ExK8, 11),
    (FieldLabel::Ex912, 12),
    (FieldLabel::Er, 13),
    (FieldLabel::Mdm, 14),
];

/// Returns every maximal digit run in `text` as an integer. Runs too long
/// for a `u64` saturate rather than being dropped so later offsets stay
/// aligned.
#[must_use]
pub fn digit_runs(text: &str) -> Vec<u64> {
    DIGIT_RUN_RE
        .find_iter(text)
        .map(|m| m.as_str().parse().unwrap_or(u64::MAX))
        .collect()
}

/// Extracts fields from `text` using the template's offset table.
#[must_use]
pub fn extract(text: &str) -> FieldMap {
    extract_with_skip(text, BOILERPLATE_NUMBERS)
}

/// Like [`extract`] with an explicit boilerplate count.
#[must_use]
pub fn extract_with_skip(text: &str, skip: usize) -> FieldMap {
    let numbers: Vec<u64> = digit_runs(text).into_iter().skip(skip).collect();

    log::debug!("{} digit run(s) remain after skipping {skip}", numbers.len());

    let highest = OFFSETS.iter().map(|(_, i)| *i).max().unwrap_or(0);
    if numbers.len() <= highest {
        log::warn!(
            "Only {} digit run(s) after boilerplate, expected at least {}; \
             some fields will be missing",
            numbers.len(),
            highest + 1
        );
    }

    OFFSETS
        .iter()
        .filter_map(|&(label, offset)| {
            numbers
                .get(offset)
                .map(|&n| (label, label.value_from_count(n)))
        })
        .collect()
}
