//! Deriving output rows from a record.
//!
//! A record becomes one row, two rows (split into `ES` and `HS`), or a
//! single placeholder row carrying only the school-wide counts. Zero
//! values read as absent here, except for the IS (teacher) fields where 0
//! is a real count. The record itself is never modified.

use monthly_report_extract_models::{
    FieldLabel, FieldValue, GradeBand, OutputRow, SchoolRecord,
};
use serde::Serialize;

/// How a record is laid out as rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowLayout {
    /// `<name> ES` and `<name> HS`.
    Split,
    /// One row with K-8 values.
    K8,
    /// One row with 9-12 values.
    HighSchool,
    /// Both bands have data but the record is not split; K-8 values win.
    K8TieBreak,
    /// No band data; only Sub, ER and MDM.
    Placeholder,
}

/// Labels feeding one band's columns.
struct BandLabels {
    students: FieldLabel,
    teachers: FieldLabel,
    oss: FieldLabel,
    ex: FieldLabel,
}

const fn band_labels(band: GradeBand) -> BandLabels {
    match band {
        GradeBand::K8 => BandLabels {
            students: FieldLabel::SwdK8,
            teachers: FieldLabel::IsK8,
            oss: FieldLabel::OssK8,
            ex: FieldLabel::ExK8,
        },
        GradeBand::HighSchool => BandLabels {
            students: FieldLabel::Swd912,
            teachers: FieldLabel::Is912,
            oss: FieldLabel::Oss912,
            ex: FieldLabel::Ex912,
        },
    }
}

/// One band's values after zero-collapsing.
#[derive(Debug, Clone, Copy)]
struct Band {
    students: Option<FieldValue>,
    teachers: Option<FieldValue>,
    oss: Option<FieldValue>,
    ex: Option<FieldValue>,
}

fn collapsed(record: &SchoolRecord, label: FieldLabel) -> Option<FieldValue> {
    if label.is_fte() {
        return record.get(label);
    }
    record.get(label).filter(|v| !v.is_zero())
}

fn positive(value: Option<FieldValue>) -> bool {
    value.is_some_and(|v| v.as_f64() > 0.0)
}

impl Band {
    fn of(record: &SchoolRecord, band: GradeBand) -> Self {
        let labels = band_labels(band);
        Self {
            students: collapsed(record, labels.students),
            teachers: collapsed(record, labels.teachers),
            oss: collapsed(record, labels.oss),
            ex: collapsed(record, labels.ex),
        }
    }

    fn present(&self) -> bool {
        positive(self.students)
            || positive(self.teachers)
            || self.oss.is_some()
            || self.ex.is_some()
    }

    fn meaningful(&self) -> bool {
        positive(self.students)
    }
}

/// Decides how `record` is laid out.
#[must_use]
pub fn layout(record: &SchoolRecord) -> RowLayout {
    let k8 = Band::of(record, GradeBand::K8);
    let hs = Band::of(record, GradeBand::HighSchool);

    if record.is_both() || (k8.meaningful() && hs.meaningful()) {
        return RowLayout::Split;
    }

    match (k8.present(), hs.present()) {
        (true, false) => RowLayout::K8,
        (false, true) => RowLayout::HighSchool,
        (true, true) => RowLayout::K8TieBreak,
        (false, false) => RowLayout::Placeholder,
    }
}

/// Derives the output rows for `record`. Always one or two rows.
#[must_use]
pub fn derive(record: &SchoolRecord) -> Vec<OutputRow> {
    let name = record.name();
    let sub = collapsed(record, FieldLabel::Sub);
    let er = collapsed(record, FieldLabel::Er);
    let mdm = collapsed(record, FieldLabel::Mdm);

    let row = |school: String, band: Option<Band>| OutputRow {
        school,
        students: band.and_then(|b| b.students),
        teachers: band.and_then(|b| b.teachers),
        sub,
        oss: band.and_then(|b| b.oss),
        ex: band.and_then(|b| b.ex),
        er,
        mdm,
    };

    let k8 = Band::of(record, GradeBand::K8);
    let hs = Band::of(record, GradeBand::HighSchool);
    let layout = layout(record);

    log::debug!("{name}: row layout {layout:?}");

    match layout {
        RowLayout::Split => vec![
            row(format!("{name} {}", GradeBand::K8.suffix()), Some(k8)),
            row(format!("{name} {}", GradeBand::HighSchool.suffix()), Some(hs)),
        ],
        RowLayout::K8 => vec![row(name.to_owned(), Some(k8))],
        RowLayout::HighSchool => vec![row(name.to_owned(), Some(hs))],
        RowLayout::K8TieBreak => {
            log::warn!(
                "{name}: has both K-8 and 9-12 values but is not split; \
                 9-12 values are dropped"
            );
            vec![row(name.to_owned(), Some(k8))]
        }
        RowLayout::Placeholder => vec![row(name.to_owned(), None)],
    }
}
