#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Field, record, and output row types for monthly report extraction.
//!
//! A monthly compliance report carries a fixed set of numeric fields
//! ([`FieldLabel`]). Extraction produces a partial [`FieldMap`], which is
//! frozen into a [`SchoolRecord`] (one value slot per label) and finally
//! presented as one or two [`OutputRow`]s.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Column order of the tabular output.
pub const COLUMNS: [&str; 8] = [
    "School", "Students", "Teachers", "Sub", "OSS", "EX", "ER", "MDM",
];

/// School name used when the name block cannot be read.
pub const UNKNOWN_SCHOOL: &str = "Unknown School";

/// Grade band a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GradeBand {
    /// Grades K through 8 (elementary).
    K8,
    /// Grades 9 through 12 (high school).
    HighSchool,
}

impl GradeBand {
    /// Suffix appended to the school name when a record is split.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::K8 => "ES",
            Self::HighSchool => "HS",
        }
    }
}

/// Every numeric field on the report template.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
pub enum FieldLabel {
    /// Substitute-teacher count.
    #[serde(rename = "Sub")]
    #[strum(serialize = "Sub")]
    Sub,
    /// Intervention specialist FTE serving grades K-8.
    #[serde(rename = "IS K-8")]
    #[strum(serialize = "IS K-8")]
    IsK8,
    /// Intervention specialist FTE serving grades 9-12.
    #[serde(rename = "IS 9-12")]
    #[strum(serialize = "IS 9-12")]
    Is912,
    /// Students with disabilities enrolled in grades K-8.
    #[serde(rename = "SWD K-8")]
    #[strum(serialize = "SWD K-8")]
    SwdK8,
    /// Students with disabilities enrolled in grades 9-12.
    #[serde(rename = "SWD 9-12")]
    #[strum(serialize = "SWD 9-12")]
    Swd912,
    /// Out-of-school suspensions of SWD in grades K-8.
    #[serde(rename = "OSS K-8")]
    #[strum(serialize = "OSS K-8")]
    OssK8,
    /// Out-of-school suspensions of SWD in grades 9-12.
    #[serde(rename = "OSS 9-12")]
    #[strum(serialize = "OSS 9-12")]
    Oss912,
    /// Expulsions of SWD in grades K-8.
    #[serde(rename = "EX K-8")]
    #[strum(serialize = "EX K-8")]
    ExK8,
    /// Expulsions of SWD in grades 9-12.
    #[serde(rename = "EX 9-12")]
    #[strum(serialize = "EX 9-12")]
    Ex912,
    /// Emergency removals.
    #[serde(rename = "ER")]
    #[strum(serialize = "ER")]
    Er,
    /// Manifestation determination meetings.
    #[serde(rename = "MDM")]
    #[strum(serialize = "MDM")]
    Mdm,
}

impl FieldLabel {
    /// Returns all labels in declaration order.
    #[must_use]
    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }

    /// Whether the field holds a (possibly fractional) FTE count rather
    /// than an integer.
    #[must_use]
    pub const fn is_fte(self) -> bool {
        matches!(self, Self::IsK8 | Self::Is912)
    }

    /// The SWD headcount in the same grade band as an IS field.
    #[must_use]
    pub const fn paired_swd(self) -> Option<Self> {
        match self {
            Self::IsK8 => Some(Self::SwdK8),
            Self::Is912 => Some(Self::Swd912),
            _ => None,
        }
    }

    /// Wraps a raw integer in the value kind this label holds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn value_from_count(self, n: u64) -> FieldValue {
        if self.is_fte() {
            FieldValue::Fte(n as f64)
        } else {
            FieldValue::Count(n)
        }
    }
}

/// A non-negative field value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Integer headcount or event count.
    Count(u64),
    /// Full-time-equivalent staffing, may be fractional.
    Fte(f64),
}

impl FieldValue {
    /// Returns the value as a float regardless of kind.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(self) -> f64 {
        match self {
            Self::Count(n) => n as f64,
            Self::Fte(x) => x,
        }
    }

    /// Whether the value equals zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }

    /// Whether the value equals `n` exactly.
    #[must_use]
    pub fn equals(self, n: f64) -> bool {
        (self.as_f64() - n).abs() < f64::EPSILON
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Fte(x) => write!(f, "{x}"),
        }
    }
}

/// Partial extraction result. A missing key means nothing was found for
/// that label.
pub type FieldMap = BTreeMap<FieldLabel, FieldValue>;

/// Canonical per-document record. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolRecord {
    name: String,
    is_both: bool,
    fields: BTreeMap<FieldLabel, Option<FieldValue>>,
}

impl SchoolRecord {
    /// Creates a record holding exactly one slot per [`FieldLabel`].
    #[must_use]
    pub fn new(name: impl Into<String>, is_both: bool, extracted: &FieldMap) -> Self {
        let fields = FieldLabel::iter()
            .map(|label| (label, extracted.get(&label).copied()))
            .collect();

        Self {
            name: name.into(),
            is_both,
            fields,
        }
    }

    /// School name as printed on the report.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the school reports combined K-8 and 9-12 data.
    #[must_use]
    pub const fn is_both(&self) -> bool {
        self.is_both
    }

    /// Raw value for `label`.
    #[must_use]
    pub fn get(&self, label: FieldLabel) -> Option<FieldValue> {
        self.fields.get(&label).copied().flatten()
    }

    /// Iterates every label with its (possibly absent) value.
    pub fn fields(&self) -> impl Iterator<Item = (FieldLabel, Option<FieldValue>)> + '_ {
        self.fields.iter().map(|(label, value)| (*label, *value))
    }

    /// Number of labels that carry a value.
    #[must_use]
    pub fn populated_count(&self) -> usize {
        self.fields.values().filter(|v| v.is_some()).count()
    }
}

/// One row of tabular output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    /// School name, suffixed with `ES`/`HS` when the record was split.
    #[serde(rename = "School")]
    pub school: String,
    /// SWD headcount.
    #[serde(rename = "Students")]
    pub students: Option<FieldValue>,
    /// Intervention specialist FTE.
    #[serde(rename = "Teachers")]
    pub teachers: Option<FieldValue>,
    /// Substitute-teacher count.
    #[serde(rename = "Sub")]
    pub sub: Option<FieldValue>,
    /// Out-of-school suspensions.
    #[serde(rename = "OSS")]
    pub oss: Option<FieldValue>,
    /// Expulsions.
    #[serde(rename = "EX")]
    pub ex: Option<FieldValue>,
    /// Emergency removals.
    #[serde(rename = "ER")]
    pub er: Option<FieldValue>,
    /// Manifestation determination meetings.
    #[serde(rename = "MDM")]
    pub mdm: Option<FieldValue>,
}

impl OutputRow {
    /// Renders the row as text cells in [`COLUMNS`] order. Absent values
    /// become empty cells.
    #[must_use]
    pub fn cells(&self) -> [String; 8] {
        let cell = |v: Option<FieldValue>| v.map(|v| v.to_string()).unwrap_or_default();

        [
            self.school.clone(),
            cell(self.students),
            cell(self.teachers),
            cell(self.sub),
            cell(self.oss),
            cell(self.ex),
            cell(self.er),
            cell(self.mdm),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    #[test]
    fn label_round_trips_through_template_text() {
        for label in FieldLabel::all() {
            let parsed = FieldLabel::from_str(label.as_ref()).unwrap();
            assert_eq!(parsed, label);
        }
        assert_eq!(FieldLabel::Oss912.to_string(), "OSS 9-12");
    }

    #[test]
    fn record_holds_one_slot_per_label() {
        let mut extracted = FieldMap::new();
        extracted.insert(FieldLabel::Sub, FieldValue::Count(4));

        let record = SchoolRecord::new("Test Academy", false, &extracted);

        assert_eq!(record.fields().count(), FieldLabel::all().len());
        assert_eq!(record.populated_count(), 1);
        assert_eq!(record.get(FieldLabel::Sub), Some(FieldValue::Count(4)));
        assert_eq!(record.get(FieldLabel::Mdm), None);
    }

    #[test]
    fn is_labels_hold_fte_values() {
        assert_eq!(FieldLabel::IsK8.value_from_count(3), FieldValue::Fte(3.0));
        assert_eq!(FieldLabel::SwdK8.value_from_count(3), FieldValue::Count(3));
        assert_eq!(FieldLabel::Is912.paired_swd(), Some(FieldLabel::Swd912));
        assert_eq!(FieldLabel::Er.paired_swd(), None);
    }

    #[test]
    fn values_render_in_shortest_form() {
        assert_eq!(FieldValue::Fte(4.5).to_string(), "4.5");
        assert_eq!(FieldValue::Fte(11.0).to_string(), "11");
        assert_eq!(FieldValue::Count(1432).to_string(), "1432");
    }

    #[test]
    fn cells_leave_absent_values_empty() {
        let row = OutputRow {
            school: "Test Academy".to_owned(),
            students: Some(FieldValue::Count(30)),
            teachers: Some(FieldValue::Fte(0.0)),
            sub: None,
            oss: None,
            ex: None,
            er: Some(FieldValue::Count(2)),
            mdm: None,
        };

        assert_eq!(
            row.cells(),
            ["Test Academy", "30", "0", "", "", "", "2", ""].map(str::to_owned)
        );
    }
}
