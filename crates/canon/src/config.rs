use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CanonError;
use crate::registry::{self, ReferenceOrigin, TableDescriptor};

// ---------------------------------------------------------------------------
// Empty-reference policy
// ---------------------------------------------------------------------------

/// What validation does with a table whose reference set is empty
/// (fetch failed or the source listed nothing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReferencePolicy {
    /// Delete every row not already canonical. With an empty set that is
    /// every row in the table.
    #[default]
    DeleteUnmatched,
    /// Skip validation for that table; casing fixes still apply.
    KeepRows,
}

impl std::fmt::Display for EmptyReferencePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeleteUnmatched => write!(f, "delete_unmatched"),
            Self::KeepRows => write!(f, "keep_rows"),
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanOptions {
    /// Threshold for every table without a per-table override.
    pub default_threshold: Option<usize>,
    /// Per-table Levenshtein thresholds, keyed by table name.
    pub thresholds: BTreeMap<String, usize>,
    pub on_empty_reference: EmptyReferencePolicy,
    /// Replacement vocabularies for fixed-origin tables (e.g. `trainers`).
    pub fixed_names: BTreeMap<String, Vec<String>>,
}

impl CleanOptions {
    pub fn threshold_for(&self, table: &TableDescriptor) -> usize {
        self.thresholds
            .get(table.name)
            .copied()
            .or(self.default_threshold)
            .unwrap_or(table.threshold)
    }

    /// Names for a fixed-origin table, honoring overrides.
    pub fn fixed_names_for(&self, table: &TableDescriptor) -> Vec<String> {
        if let Some(names) = self.fixed_names.get(table.name) {
            return names.clone();
        }
        match table.origin {
            ReferenceOrigin::Fixed(names) => names.iter().map(|n| n.to_string()).collect(),
            ReferenceOrigin::Remote(_) => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validate
// ---------------------------------------------------------------------------

impl CleanOptions {
    /// Checks options deserialized from the `[cleaning]` settings section.
    pub fn validate(&self) -> Result<(), CanonError> {
        for table in self.thresholds.keys() {
            if registry::descriptor(table).is_none() {
                return Err(CanonError::ConfigValidation(format!(
                    "thresholds: unknown table '{table}'"
                )));
            }
        }

        for (table, names) in &self.fixed_names {
            let Some(descriptor) = registry::descriptor(table) else {
                return Err(CanonError::ConfigValidation(format!(
                    "fixed_names: unknown table '{table}'"
                )));
            };
            if let ReferenceOrigin::Remote(endpoint) = descriptor.origin {
                return Err(CanonError::ConfigValidation(format!(
                    "fixed_names: table '{table}' is sourced from endpoint '{endpoint}'"
                )));
            }
            if names.iter().all(|n| n.trim().is_empty()) {
                return Err(CanonError::ConfigValidation(format!(
                    "fixed_names: list for '{table}' has no names"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::descriptor;

    fn parse(input: &str) -> CleanOptions {
        toml::from_str(input).unwrap()
    }

    #[test]
    fn defaults() {
        let options = CleanOptions::default();
        assert_eq!(options.threshold_for(descriptor("pokemon").unwrap()), 2);
        assert_eq!(options.on_empty_reference, EmptyReferencePolicy::DeleteUnmatched);
        assert_eq!(
            options.fixed_names_for(descriptor("trainers").unwrap()),
            vec!["Ash Ketchum", "Brock", "Gary Oak", "Professor Oak", "Misty"]
        );
        assert!(options.fixed_names_for(descriptor("types").unwrap()).is_empty());
    }

    #[test]
    fn threshold_precedence() {
        let options = parse(
            r#"
default_threshold = 1

[thresholds]
pokemon = 3
"#,
        );
        options.validate().unwrap();
        assert_eq!(options.threshold_for(descriptor("pokemon").unwrap()), 3);
        assert_eq!(options.threshold_for(descriptor("types").unwrap()), 1);
    }

    #[test]
    fn parses_policy_and_fixed_names() {
        let options = parse(
            r#"
on_empty_reference = "keep_rows"

[fixed_names]
trainers = ["Red", "Blue"]
"#,
        );
        assert_eq!(options.on_empty_reference, EmptyReferencePolicy::KeepRows);
        assert_eq!(options.fixed_names_for(descriptor("trainers").unwrap()), vec!["Red", "Blue"]);
    }

    #[test]
    fn rejects_unknown_threshold_table() {
        let err = parse("[thresholds]\ndragons = 2\n").validate().unwrap_err();
        assert!(err.to_string().contains("unknown table 'dragons'"), "{err}");
    }

    #[test]
    fn rejects_fixed_names_for_remote_table() {
        let err = parse("[fixed_names]\ntypes = [\"Fire\"]\n").validate().unwrap_err();
        assert!(err.to_string().contains("sourced from endpoint 'type'"), "{err}");
    }

    #[test]
    fn rejects_empty_fixed_list() {
        let err = parse("[fixed_names]\ntrainers = []\n").validate().unwrap_err();
        assert!(matches!(err, CanonError::ConfigValidation(_)));
    }

    #[test]
    fn rejects_bad_policy() {
        let parsed: Result<CleanOptions, _> = toml::from_str("on_empty_reference = \"panic\"\n");
        assert!(parsed.is_err());
    }
}
