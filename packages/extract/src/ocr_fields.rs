//! Field extraction from OCR output.
//!
//! Each label has an ordered list of case-insensitive patterns, most
//! specific first. The first pattern that matches and parses wins. IS
//! fields capture decimals so fractional FTE counts survive; every other
//! field captures an integer.

use std::sync::LazyLock;

use monthly_report_extract_models::{FieldLabel, FieldMap, FieldValue};
use regex::{Regex, RegexBuilder};

/// A single recognition pattern for a field.
#[derive(Debug)]
enum FieldPattern {
    /// Capture group 1 holds the number.
    Number(Regex),
    /// A known misreading that stands for a fixed value.
    Literal { regex: Regex, value: FieldValue },
}

const K8: &str = r"k\s*[-–]?\s*8";
const HS: &str = r"9\s*[-–]?\s*12";
const SEP: &str = r"\s*[:=\-]?\s*";
const INT: &str = r"([0-9]+)";
const DEC: &str = r"([0-9]+(?:\.[0-9]+)?)";

fn compile(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid field pattern '{pattern}': {e}"))
}

/// Label text preceding either IS field, with the same spacing tolerance
/// as the field patterns.
pub static IS_CONTEXT: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\bis\s+serving\s+grades\b"));

/// Label text preceding the IS K-8 field.
pub static IS_K8_CONTEXT: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"\bis\s+serving\s+grades\s+{K8}")));

fn number(pattern: &str) -> FieldPattern {
    FieldPattern::Number(compile(pattern))
}

static PATTERNS: LazyLock<Vec<(FieldLabel, Vec<FieldPattern>)>> = LazyLock::new(|| {
    vec![
        (
            FieldLabel::Sub,
            vec![
                number(&format!(r"substitute\s+teachers?[^0-9\n]{{0,20}}{INT}")),
                number(&format!(r"^\s*subs?\b{SEP}{INT}")),
            ],
        ),
        (
            FieldLabel::IsK8,
            vec![
                number(&format!(r"\bis\s+serving\s+grades\s+{K8}{SEP}{DEC}")),
                number(&format!(r"\bis\s+{K8}{SEP}{DEC}")),
            ],
        ),
        (
            FieldLabel::Is912,
            vec![
                number(&format!(r"\bis\s+serving\s+grades\s+{HS}{SEP}{DEC}")),
                number(&format!(r"\bis\s+{HS}{SEP}{DEC}")),
            ],
        ),
        (
            FieldLabel::SwdK8,
            vec![
                number(&format!(r"number\s+of\s+swd\s*{K8}{SEP}{INT}")),
                number(&format!(r"^\s*swd\s*{K8}{SEP}{INT}")),
            ],
        ),
        (
            FieldLabel::Swd912,
            vec![
                number(&format!(r"number\s+of\s+swd\s*{HS}{SEP}{INT}")),
                number(&format!(r"^\s*swd\s*{HS}{SEP}{INT}")),
            ],
        ),
        (
            FieldLabel::OssK8,
            vec![
                number(&format!(r"\boss\s+of\s+swd\s*{K8}{SEP}{INT}")),
                number(&format!(r"^\s*oss\s*{K8}{SEP}{INT}")),
            ],
        ),
        (
            FieldLabel::Oss912,
            vec![
                // "60" is read as "go" on this line.
                FieldPattern::Literal {
                    regex: compile(&format!(r"\boss\s+of\s+swd\s*{HS}{SEP}go\b")),
                    value: FieldValue::Count(60),
                },
                number(&format!(r"\boss\s+of\s+swd\s*{HS}{SEP}{INT}")),
                number(&format!(r"^\s*oss\s*{HS}{SEP}{INT}")),
            ],
        ),
        (
            FieldLabel::ExK8,
            vec![
                number(&format!(r"\bex\s+of\s+swd\s*{K8}{SEP}{INT}")),
                number(&format!(r"^\s*ex\s*{K8}{SEP}{INT}")),
            ],
        ),
        (
            FieldLabel::Ex912,
            vec![
                number(&format!(r"\bex\s+of\s+swd\s*{HS}{SEP}{INT}")),
                number(&format!(r"^\s*ex\s*{HS}{SEP}{INT}")),
            ],
        ),
        (
            FieldLabel::Er,
            vec![
                number(&format!(r"emergency\s+removals?[^0-9\n]{{0,20}}{INT}")),
                number(&format!(r"^\s*er\b{SEP}{INT}")),
            ],
        ),
        (
            FieldLabel::Mdm,
            vec![
                number(&format!(
                    r"manifestation\s+determination\s+meetings?[^0-9\n]{{0,20}}{INT}"
                )),
                number(&format!(r"\bmdms?\b[^0-9\n]{{0,15}}{INT}")),
            ],
        ),
    ]
});

/// Parses a captured number into the value kind `label` holds.
fn parse_value(label: FieldLabel, raw: &str) -> Option<FieldValue> {
    if label.is_fte() {
        raw.parse::<f64>()
            .ok()
            .filter(|x| x.is_finite() && *x >= 0.0)
            .map(FieldValue::Fte)
    } else {
        raw.parse::<u64>().ok().map(FieldValue::Count)
    }
}

/// Applies one pattern list to `text`.
fn match_field(label: FieldLabel, patterns: &[FieldPattern], text: &str) -> Option<FieldValue> {
    patterns.iter().find_map(|pattern| match pattern {
        FieldPattern::Literal { regex, value } => regex.is_match(text).then_some(*value),
        FieldPattern::Number(regex) => regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| parse_value(label, m.as_str())),
    })
}

/// Extracts every field whose patterns match `text`. Labels with no match
/// are absent from the result.
#[must_use]
pub fn extract(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();

    for (label, patterns) in PATTERNS.iter() {
        if let Some(value) = match_field(*label, patterns, text) {
            log::debug!("OCR {label}: {value}");
            fields.insert(*label, value);
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\
School Leader Monthly Report 2025-26
Ohio Virtual Academy
Number of substitute teachers: 3
IS serving grades K-8: 4.5
IS serving grades 9-12: 2
Number of SWD K-8: 120
Number of SWD 9-12: 45
OSS of SWD K-8: 2
OSS of SWD 9-12: 1
EX of SWD K-8: 0
EX of SWD 9-12: 0
Emergency removals of SWD: 4
Manifestation determination meetings held: 1
";

    #[test]
    fn every_pattern_compiles() {
        assert_eq!(PATTERNS.len(), FieldLabel::all().len());
    }

    #[test]
    fn extracts_full_report() {
        let fields = extract(REPORT);

        assert_eq!(fields.len(), FieldLabel::all().len());
        assert_eq!(fields[&FieldLabel::Sub], FieldValue::Count(3));
        assert_eq!(fields[&FieldLabel::IsK8], FieldValue::Fte(4.5));
        assert_eq!(fields[&FieldLabel::Is912], FieldValue::Fte(2.0));
        assert_eq!(fields[&FieldLabel::SwdK8], FieldValue::Count(120));
        assert_eq!(fields[&FieldLabel::Swd912], FieldValue::Count(45));
        assert_eq!(fields[&FieldLabel::OssK8], FieldValue::Count(2));
        assert_eq!(fields[&FieldLabel::Oss912], FieldValue::Count(1));
        assert_eq!(fields[&FieldLabel::ExK8], FieldValue::Count(0));
        assert_eq!(fields[&FieldLabel::Ex912], FieldValue::Count(0));
        assert_eq!(fields[&FieldLabel::Er], FieldValue::Count(4));
        assert_eq!(fields[&FieldLabel::Mdm], FieldValue::Count(1));
    }

    #[test]
    fn go_misreading_means_sixty() {
        let fields = extract("OSS of SWD9-12: go");
        assert_eq!(fields[&FieldLabel::Oss912], FieldValue::Count(60));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let fields = extract("NUMBER OF SWD K-8: 17\noss of swd k-8: 3");
        assert_eq!(fields[&FieldLabel::SwdK8], FieldValue::Count(17));
        assert_eq!(fields[&FieldLabel::OssK8], FieldValue::Count(3));
    }

    #[test]
    fn swd_pattern_does_not_steal_discipline_counts() {
        let fields = extract("OSS of SWD K-8: 3\nEX of SWD 9-12: 1");
        assert!(!fields.contains_key(&FieldLabel::SwdK8));
        assert!(!fields.contains_key(&FieldLabel::Swd912));
        assert_eq!(fields[&FieldLabel::OssK8], FieldValue::Count(3));
        assert_eq!(fields[&FieldLabel::Ex912], FieldValue::Count(1));
    }

    #[test]
    fn falls_back_to_short_labels() {
        let fields = extract("SWD K-8 25\nIS 9-12: 1.5\nMDM 2");
        assert_eq!(fields[&FieldLabel::SwdK8], FieldValue::Count(25));
        assert_eq!(fields[&FieldLabel::Is912], FieldValue::Fte(1.5));
        assert_eq!(fields[&FieldLabel::Mdm], FieldValue::Count(2));
    }

    #[test]
    fn unmatched_labels_are_absent() {
        assert!(extract("nothing recognizable here").is_empty());
    }
}
