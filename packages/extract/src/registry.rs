//! Compile-time registry of institutions with special handling.
//!
//! `schools.toml` is embedded via `include_str!` and parsed once into a
//! process-wide [`SchoolRegistry`]. It holds the roster of schools that
//! report combined K-8/9-12 data and the per-school constants used by the
//! correction rules.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use monthly_report_extract_models::FieldLabel;
use serde::Deserialize;

/// Number of registered schools. Enforced by a test.
#[cfg(test)]
const EXPECTED_SCHOOL_COUNT: usize = 8;

const SCHOOLS_TOML: &str = include_str!("../schools.toml");

static REGISTRY: LazyLock<SchoolRegistry> = LazyLock::new(|| {
    SchoolRegistry::from_toml(SCHOOLS_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse embedded schools.toml: {e}"))
});

/// A school with special handling.
#[derive(Debug, Clone, Deserialize)]
pub struct School {
    /// Name exactly as it appears in the report's name block.
    pub name: String,
    /// Whether the school reports K-8 and 9-12 data on one document.
    #[serde(default)]
    pub combined: bool,
    /// Fields whose OCR value of 1 is a truncated large count.
    #[serde(default)]
    pub restore_when_one: BTreeMap<FieldLabel, u64>,
    /// Fields that OCR never recovers for this school.
    #[serde(default)]
    pub inject_when_missing: BTreeMap<FieldLabel, u64>,
}

impl School {
    /// Whether any correction constant is registered for this school.
    #[must_use]
    pub fn has_corrections(&self) -> bool {
        !self.restore_when_one.is_empty() || !self.inject_when_missing.is_empty()
    }

    /// One-line description of the registered correction constants, or
    /// `-` when there are none.
    #[must_use]
    pub fn corrections_summary(&self) -> String {
        if !self.has_corrections() {
            return "-".to_owned();
        }

        self.restore_when_one
            .iter()
            .map(|(label, n)| format!("{label} 1->{n}"))
            .chain(
                self.inject_when_missing
                    .iter()
                    .map(|(label, n)| format!("{label} missing->{n}")),
            )
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The full set of registered schools.
#[derive(Debug, Clone, Deserialize)]
pub struct SchoolRegistry {
    #[serde(rename = "school", default)]
    schools: Vec<School>,
}

impl SchoolRegistry {
    /// Parses a registry from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`toml::de::Error`] if the document is malformed.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::de::from_str(toml_str)
    }

    /// All registered schools in file order.
    #[must_use]
    pub fn schools(&self) -> &[School] {
        &self.schools
    }

    /// Looks up a school by exact name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&School> {
        self.schools.iter().find(|s| s.name == name)
    }

    /// Whether `name` is on the combined K-8/9-12 roster.
    #[must_use]
    pub fn is_combined(&self, name: &str) -> bool {
        self.find(name).is_some_and(|s| s.combined)
    }
}

/// Returns the embedded registry.
///
/// # Panics
///
/// Panics on first use if the embedded TOML fails to parse. The file is a
/// compile-time constant, so a failure is a development error caught by
/// the tests below.
#[must_use]
pub fn registry() -> &'static SchoolRegistry {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_schools() {
        let schools = registry().schools();
        assert_eq!(
            schools.len(),
            EXPECTED_SCHOOL_COUNT,
            "Expected {EXPECTED_SCHOOL_COUNT} schools, found {}. \
             Update EXPECTED_SCHOOL_COUNT after adding/removing schools.",
            schools.len()
        );
    }

    #[test]
    fn school_names_are_unique() {
        let mut seen = BTreeSet::new();
        for school in registry().schools() {
            assert!(
                seen.insert(&school.name),
                "Duplicate school name: {}",
                school.name
            );
        }
    }

    #[test]
    fn roster_membership_is_exact() {
        let reg = registry();
        assert!(reg.is_combined("Ohio Virtual Academy"));
        assert!(!reg.is_combined("ohio virtual academy"));
        assert!(!reg.is_combined("Lincoln Elementary"));
    }

    #[test]
    fn correction_constants_parse_as_labels() {
        let ohva = registry().find("Ohio Virtual Academy").unwrap();
        assert_eq!(ohva.restore_when_one.get(&FieldLabel::SwdK8), Some(&1432));
        assert_eq!(ohva.restore_when_one.get(&FieldLabel::Swd912), Some(&1431));
        assert!(ohva.has_corrections());

        let corrected: Vec<&str> = registry()
            .schools()
            .iter()
            .filter(|s| !s.inject_when_missing.is_empty())
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(corrected.len(), 1);
    }

    #[test]
    fn corrections_summary_lists_constants() {
        let reg = registry();

        let ohva = reg.find("Ohio Virtual Academy").unwrap();
        assert_eq!(ohva.corrections_summary(), "SWD K-8 1->1432, SWD 9-12 1->1431");

        let ohca = reg.find("Ohio Connections Academy").unwrap();
        assert_eq!(ohca.corrections_summary(), "SWD K-8 missing->612");

        let wildwood = reg.find("Wildwood Environmental Academy").unwrap();
        assert!(!wildwood.has_corrections());
        assert_eq!(wildwood.corrections_summary(), "-");
    }

    #[test]
    fn rejects_unknown_field_label() {
        let result = SchoolRegistry::from_toml(
            "[[school]]\nname = \"X\"\n[school.restore_when_one]\n\"SWD K-9\" = 5\n",
        );
        assert!(result.is_err());
    }
}
