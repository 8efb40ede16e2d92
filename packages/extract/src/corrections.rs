//! Catalogued OCR misreadings and their fixes.
//!
//! Each [`CorrectionRule`] targets one field, fires only on its exact
//! trigger value and context, and replaces the value with a literal
//! correction. Rules run in a fixed order inside a [`CorrectionEngine`].
//! This is a closed table: a new misreading needs a new entry.
//!
//! Standard order:
//! 1. [`DoubleDigitCollapse`]
//! 2. [`LargeCountRestoration`] (per registered school)
//! 3. [`MissingValueInjection`] (per registered school)
//! 4. [`DecimalPointMisread`]
//! 5. [`LeadingZeroMisread`]

use monthly_report_extract_models::{FieldLabel, FieldMap, FieldValue};
use regex::Regex;

use crate::ocr_fields::{IS_CONTEXT, IS_K8_CONTEXT};
use crate::registry::SchoolRegistry;

/// What a rule can see while deciding whether to fire.
pub struct CorrectionContext<'a> {
    /// Recognized text, lowercased.
    text: &'a str,
    /// Field values as corrected so far.
    fields: &'a FieldMap,
}

impl CorrectionContext<'_> {
    /// Whether the recognized text contains `needle` (already lowercase).
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    /// Whether `pattern` matches anywhere in the recognized text.
    #[must_use]
    pub fn matches(&self, pattern: &Regex) -> bool {
        pattern.is_match(self.text)
    }

    /// Current value of another field.
    #[must_use]
    pub fn field(&self, label: FieldLabel) -> Option<FieldValue> {
        self.fields.get(&label).copied()
    }
}

/// One catalogued correction.
pub trait CorrectionRule: Send + Sync {
    /// The field this rule rewrites.
    fn label(&self) -> FieldLabel;

    /// Short description for logs.
    fn description(&self) -> String;

    /// Whether the rule fires for the field's `current` value.
    fn applies(&self, current: Option<FieldValue>, ctx: &CorrectionContext<'_>) -> bool;

    /// The corrected value.
    fn apply(&self, current: Option<FieldValue>) -> FieldValue;
}

fn holds(current: Option<FieldValue>, n: f64) -> bool {
    current.is_some_and(|v| v.equals(n))
}

/// A double-digit value read as its first digit only.
#[derive(Debug, Clone)]
pub struct DoubleDigitCollapse {
    /// Field to correct.
    pub label: FieldLabel,
    /// Label text that must be present.
    pub context: &'static Regex,
    /// The observed correct value.
    pub restored: u64,
}

impl CorrectionRule for DoubleDigitCollapse {
    fn label(&self) -> FieldLabel {
        self.label
    }

    fn description(&self) -> String {
        format!("double-digit collapse 1 -> {}", self.restored)
    }

    fn applies(&self, current: Option<FieldValue>, ctx: &CorrectionContext<'_>) -> bool {
        holds(current, 1.0) && ctx.matches(self.context)
    }

    fn apply(&self, _current: Option<FieldValue>) -> FieldValue {
        self.label.value_from_count(self.restored)
    }
}

/// A registered school's four-digit enrollment read as its leading digit.
#[derive(Debug, Clone)]
pub struct LargeCountRestoration {
    /// Lowercase school name that must appear in the recognized text.
    pub institution: String,
    /// Field to correct.
    pub label: FieldLabel,
    /// The documented count.
    pub restored: u64,
}

impl CorrectionRule for LargeCountRestoration {
    fn label(&self) -> FieldLabel {
        self.label
    }

    fn description(&self) -> String {
        format!(
            "large-count restoration for {} (1 -> {})",
            self.institution, self.restored
        )
    }

    fn applies(&self, current: Option<FieldValue>, ctx: &CorrectionContext<'_>) -> bool {
        holds(current, 1.0) && ctx.mentions(&self.institution)
    }

    fn apply(&self, _current: Option<FieldValue>) -> FieldValue {
        self.label.value_from_count(self.restored)
    }
}

/// A registered school's value that OCR never recovers.
#[derive(Debug, Clone)]
pub struct MissingValueInjection {
    /// Lowercase school name that must appear in the recognized text.
    pub institution: String,
    /// Field to fill.
    pub label: FieldLabel,
    /// The documented count.
    pub value: u64,
}

impl CorrectionRule for MissingValueInjection {
    fn label(&self) -> FieldLabel {
        self.label
    }

    fn description(&self) -> String {
        format!(
            "missing-value injection for {} (-> {})",
            self.institution, self.value
        )
    }

    fn applies(&self, current: Option<FieldValue>, ctx: &CorrectionContext<'_>) -> bool {
        current.is_none_or(FieldValue::is_zero) && ctx.mentions(&self.institution)
    }

    fn apply(&self, _current: Option<FieldValue>) -> FieldValue {
        self.label.value_from_count(self.value)
    }
}

/// An FTE of 4.5 read without its decimal point.
#[derive(Debug, Clone)]
pub struct DecimalPointMisread {
    /// IS field to correct.
    pub label: FieldLabel,
}

impl CorrectionRule for DecimalPointMisread {
    fn label(&self) -> FieldLabel {
        self.label
    }

    fn description(&self) -> String {
        "decimal-point misread 45 -> 4.5".to_owned()
    }

    fn applies(&self, current: Option<FieldValue>, ctx: &CorrectionContext<'_>) -> bool {
        holds(current, 45.0) && ctx.matches(&IS_CONTEXT)
    }

    fn apply(&self, _current: Option<FieldValue>) -> FieldValue {
        FieldValue::Fte(4.5)
    }
}

/// An FTE of 0.5 read without its leading zero. Only plausible when the
/// band's SWD headcount is small.
#[derive(Debug, Clone)]
pub struct LeadingZeroMisread {
    /// IS field to correct.
    pub label: FieldLabel,
    /// SWD headcount in the same grade band.
    pub paired: FieldLabel,
}

/// Exclusive upper bound on the paired SWD count for [`LeadingZeroMisread`].
const SMALL_ENROLLMENT: f64 = 20.0;

impl CorrectionRule for LeadingZeroMisread {
    fn label(&self) -> FieldLabel {
        self.label
    }

    fn description(&self) -> String {
        format!("leading-zero misread 5 -> 0.5 (paired with {})", self.paired)
    }

    fn applies(&self, current: Option<FieldValue>, ctx: &CorrectionContext<'_>) -> bool {
        holds(current, 5.0)
            && ctx
                .field(self.paired)
                .is_some_and(|v| v.as_f64() > 0.0 && v.as_f64() < SMALL_ENROLLMENT)
    }

    fn apply(&self, _current: Option<FieldValue>) -> FieldValue {
        FieldValue::Fte(0.5)
    }
}

/// Ordered collection of [`CorrectionRule`]s.
pub struct CorrectionEngine {
    rules: Vec<Box<dyn CorrectionRule>>,
}

impl std::fmt::Debug for CorrectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrectionEngine")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl CorrectionEngine {
    /// Creates an engine that runs `rules` in the given order.
    #[must_use]
    pub fn new(rules: Vec<Box<dyn CorrectionRule>>) -> Self {
        Self { rules }
    }

    /// Builds the standard rule table, drawing school-specific constants
    /// from `registry`.
    #[must_use]
    pub fn standard(registry: &SchoolRegistry) -> Self {
        let mut rules: Vec<Box<dyn CorrectionRule>> = vec![Box::new(DoubleDigitCollapse {
            label: FieldLabel::IsK8,
            context: &IS_K8_CONTEXT,
            restored: 11,
        })];

        for school in registry.schools() {
            let institution = school.name.to_lowercase();
            for (&label, &restored) in &school.restore_when_one {
                rules.push(Box::new(LargeCountRestoration {
                    institution: institution.clone(),
                    label,
                    restored,
                }));
            }
        }

        for school in registry.schools() {
            let institution = school.name.to_lowercase();
            for (&label, &value) in &school.inject_when_missing {
                rules.push(Box::new(MissingValueInjection {
                    institution: institution.clone(),
                    label,
                    value,
                }));
            }
        }

        for label in [FieldLabel::IsK8, FieldLabel::Is912] {
            rules.push(Box::new(DecimalPointMisread { label }));
        }

        for label in [FieldLabel::IsK8, FieldLabel::Is912] {
            if let Some(paired) = label.paired_swd() {
                rules.push(Box::new(LeadingZeroMisread { label, paired }));
            }
        }

        Self::new(rules)
    }

    /// Number of rules in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs every rule in order over `fields`, using `recognized` as the
    /// text context.
    #[must_use]
    pub fn correct(&self, mut fields: FieldMap, recognized: &str) -> FieldMap {
        let lowered = recognized.to_lowercase();

        for rule in &self.rules {
            let label = rule.label();
            let current = fields.get(&label).copied();
            let ctx = CorrectionContext {
                text: &lowered,
                fields: &fields,
            };

            if rule.applies(current, &ctx) {
                let corrected = rule.apply(current);
                log::debug!(
                    "Correction on {label}: {} ({} -> {corrected})",
                    rule.description(),
                    current.map_or_else(|| "missing".to_owned(), |v| v.to_string()),
                );
                fields.insert(label, corrected);
            }
        }

        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::registry;

    fn fields(entries: &[(FieldLabel, FieldValue)]) -> FieldMap {
        entries.iter().copied().collect()
    }

    fn engine() -> CorrectionEngine {
        CorrectionEngine::standard(registry())
    }

    #[test]
    fn standard_table_is_ordered() {
        let engine = engine();
        let labels: Vec<FieldLabel> = engine.rules.iter().map(|r| r.label()).collect();

        // collapse, 2 restorations, 1 injection, 2 decimal, 2 leading-zero
        assert_eq!(engine.len(), 8);
        assert_eq!(labels[0], FieldLabel::IsK8);
        assert_eq!(labels[1], FieldLabel::SwdK8);
        assert_eq!(labels[2], FieldLabel::Swd912);
        assert_eq!(labels[3], FieldLabel::SwdK8);
    }

    #[test]
    fn collapses_is_k8_one_to_eleven() {
        let input = fields(&[(FieldLabel::IsK8, FieldValue::Fte(1.0))]);
        let out = engine().correct(input, "IS serving grades K-8: 1");
        assert_eq!(out[&FieldLabel::IsK8], FieldValue::Fte(11.0));
    }

    #[test]
    fn collapse_tolerates_label_spacing_and_dashes() {
        for text in [
            "IS serving grades K–8: 1",
            "IS serving grades K - 8: 1",
            "IS serving grades K8: 1",
            "IS  serving grades K-8: 1",
            "IS serving\tgrades k-8 = 1",
        ] {
            let input = fields(&[(FieldLabel::IsK8, FieldValue::Fte(1.0))]);
            let out = engine().correct(input, text);
            assert_eq!(out[&FieldLabel::IsK8], FieldValue::Fte(11.0), "{text:?}");
        }
    }

    #[test]
    fn collapse_needs_its_context() {
        let input = fields(&[(FieldLabel::IsK8, FieldValue::Fte(1.0))]);
        let out = engine().correct(input, "IS K-8: 1");
        assert_eq!(out[&FieldLabel::IsK8], FieldValue::Fte(1.0));
    }

    #[test]
    fn restores_large_counts_for_registered_school() {
        let input = fields(&[
            (FieldLabel::SwdK8, FieldValue::Count(1)),
            (FieldLabel::Swd912, FieldValue::Count(1)),
        ]);
        let out = engine().correct(input, "OHIO VIRTUAL ACADEMY\nNumber of SWD K-8: 1");

        assert_eq!(out[&FieldLabel::SwdK8], FieldValue::Count(1432));
        assert_eq!(out[&FieldLabel::Swd912], FieldValue::Count(1431));
    }

    #[test]
    fn large_count_restoration_ignores_other_schools() {
        let input = fields(&[(FieldLabel::SwdK8, FieldValue::Count(1))]);
        let out = engine().correct(input, "Lincoln Community School");
        assert_eq!(out[&FieldLabel::SwdK8], FieldValue::Count(1));
    }

    #[test]
    fn injects_missing_value_for_registered_school() {
        let out = engine().correct(FieldMap::new(), "Ohio Connections Academy");
        assert_eq!(out[&FieldLabel::SwdK8], FieldValue::Count(612));

        let zero = fields(&[(FieldLabel::SwdK8, FieldValue::Count(0))]);
        let out = engine().correct(zero, "Ohio Connections Academy");
        assert_eq!(out[&FieldLabel::SwdK8], FieldValue::Count(612));

        let present = fields(&[(FieldLabel::SwdK8, FieldValue::Count(7))]);
        let out = engine().correct(present, "Ohio Connections Academy");
        assert_eq!(out[&FieldLabel::SwdK8], FieldValue::Count(7));
    }

    #[test]
    fn restores_missing_decimal_point() {
        let input = fields(&[
            (FieldLabel::Is912, FieldValue::Fte(45.0)),
            (FieldLabel::Swd912, FieldValue::Count(200)),
        ]);
        let out = engine().correct(input, "IS serving grades 9-12: 45");
        assert_eq!(out[&FieldLabel::Is912], FieldValue::Fte(4.5));
    }

    #[test]
    fn decimal_point_context_tolerates_extra_spaces() {
        let input = fields(&[(FieldLabel::IsK8, FieldValue::Fte(45.0))]);
        let out = engine().correct(input, "IS  serving   grades K-8: 45");
        assert_eq!(out[&FieldLabel::IsK8], FieldValue::Fte(4.5));

        let input = fields(&[(FieldLabel::IsK8, FieldValue::Fte(45.0))]);
        let out = engine().correct(input, "IS K-8: 45");
        assert_eq!(out[&FieldLabel::IsK8], FieldValue::Fte(45.0));
    }

    #[test]
    fn restores_leading_zero_for_small_enrollment() {
        let input = fields(&[
            (FieldLabel::IsK8, FieldValue::Fte(5.0)),
            (FieldLabel::SwdK8, FieldValue::Count(12)),
        ]);
        let out = engine().correct(input, "");
        assert_eq!(out[&FieldLabel::IsK8], FieldValue::Fte(0.5));
    }

    #[test]
    fn leading_zero_bounds_are_exclusive() {
        for swd in [0, 20, 150] {
            let input = fields(&[
                (FieldLabel::Is912, FieldValue::Fte(5.0)),
                (FieldLabel::Swd912, FieldValue::Count(swd)),
            ]);
            let out = engine().correct(input, "");
            assert_eq!(out[&FieldLabel::Is912], FieldValue::Fte(5.0), "swd = {swd}");
        }

        let unpaired = fields(&[(FieldLabel::Is912, FieldValue::Fte(5.0))]);
        let out = engine().correct(unpaired, "");
        assert_eq!(out[&FieldLabel::Is912], FieldValue::Fte(5.0));
    }

    #[test]
    fn corrections_are_idempotent() {
        let text = "Ohio Virtual Academy\nIS serving grades K-8: 1\nIS serving grades 9-12: 45";
        let input = fields(&[
            (FieldLabel::IsK8, FieldValue::Fte(1.0)),
            (FieldLabel::Is912, FieldValue::Fte(45.0)),
            (FieldLabel::SwdK8, FieldValue::Count(1)),
        ]);

        let once = engine().correct(input, text);
        let twice = engine().correct(once.clone(), text);
        assert_eq!(once, twice);
    }

    #[test]
    fn untouched_fields_pass_through() {
        let input = fields(&[
            (FieldLabel::Er, FieldValue::Count(1)),
            (FieldLabel::Mdm, FieldValue::Count(45)),
        ]);
        let out = engine().correct(input.clone(), "IS serving grades K-8");
        assert_eq!(out, input);
    }
}
