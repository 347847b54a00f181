//! Per-table reference vocabularies.
//!
//! A [`ReferenceSet`] holds two views of the same names:
//! - comparison key → display form, used by the fuzzy matcher
//! - the set of display forms, used for exact validity checks
//!
//! Sets are rebuilt on every run and never persisted.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::{info, warn};

use crate::config::CleanOptions;
use crate::normalize::{comparison_key, display_form};
use crate::registry::{ReferenceOrigin, TableDescriptor};

/// Supplies the raw names listed under one endpoint of the reference source.
pub trait NameSource {
    type Error: fmt::Display;

    fn list_names(&self, endpoint: &str) -> Result<BTreeSet<String>, Self::Error>;
}

/// Source that never answers. Every remote table ends up degraded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl NameSource for Offline {
    type Error = &'static str;

    fn list_names(&self, _endpoint: &str) -> Result<BTreeSet<String>, Self::Error> {
        Err("reference source disabled (offline)")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    map: BTreeMap<String, String>,
    valid: BTreeSet<String>,
    degraded: bool,
}

static DEGRADED: ReferenceSet = ReferenceSet {
    map: BTreeMap::new(),
    valid: BTreeSet::new(),
    degraded: true,
};

impl ReferenceSet {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for raw in names {
            let raw = raw.as_ref();
            if raw.trim().is_empty() {
                continue;
            }
            let display = display_form(raw);
            set.valid.insert(display.clone());
            // Names without ASCII alphanumerics are valid but never match targets.
            let key = comparison_key(raw);
            if !key.is_empty() {
                set.map.entry(key).or_insert(display);
            }
        }
        set
    }

    /// Empty set standing in for a category whose fetch failed.
    pub fn degraded() -> Self {
        DEGRADED.clone()
    }

    pub fn display_for(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    /// `(comparison key, display form)` pairs in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_valid(&self, name: &str) -> bool {
        self.valid.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }

    /// Number of distinct valid display names.
    pub fn len(&self) -> usize {
        self.valid.len()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

/// Reference sets for one run, keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSets {
    sets: BTreeMap<String, ReferenceSet>,
}

impl ReferenceSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: impl Into<String>, set: ReferenceSet) {
        self.sets.insert(table.into(), set);
    }

    /// Set for `table`; tables never inserted read as degraded.
    pub fn get(&self, table: &str) -> &ReferenceSet {
        self.sets.get(table).unwrap_or(&DEGRADED)
    }

    pub fn degraded_tables(&self) -> Vec<&str> {
        self.sets
            .iter()
            .filter(|(_, s)| s.is_degraded())
            .map(|(t, _)| t.as_str())
            .collect()
    }
}

impl FromIterator<(String, ReferenceSet)> for ReferenceSets {
    fn from_iter<T: IntoIterator<Item = (String, ReferenceSet)>>(iter: T) -> Self {
        Self { sets: iter.into_iter().collect() }
    }
}

/// Fetch every table's vocabulary. A failing endpoint degrades that table
/// only; the run proceeds without correction data for it.
pub fn build_reference_sets<S>(source: &S, tables: &[TableDescriptor], options: &CleanOptions) -> ReferenceSets
where
    S: NameSource + ?Sized,
{
    let mut sets = ReferenceSets::new();
    for table in tables {
        let set = match table.origin {
            ReferenceOrigin::Remote(endpoint) => match source.list_names(endpoint) {
                Ok(names) => {
                    let set = ReferenceSet::from_names(&names);
                    info!(table = table.name, endpoint, names = set.len(), "fetched reference names");
                    set
                }
                Err(err) => {
                    warn!(
                        table = table.name,
                        endpoint,
                        error = %err,
                        "reference fetch failed; cleaning will proceed without reference data for this table"
                    );
                    ReferenceSet::degraded()
                }
            },
            ReferenceOrigin::Fixed(_) => {
                let set = ReferenceSet::from_names(options.fixed_names_for(table));
                info!(table = table.name, names = set.len(), "using fixed reference names");
                set
            }
        };
        sets.insert(table.name, set);
    }
    sets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TABLES;
    use std::cell::RefCell;

    struct FakeSource {
        calls: RefCell<Vec<String>>,
    }

    impl NameSource for FakeSource {
        type Error = String;

        fn list_names(&self, endpoint: &str) -> Result<BTreeSet<String>, String> {
            self.calls.borrow_mut().push(endpoint.to_string());
            match endpoint {
                "pokemon" => Ok(["pikachu", "mr-mime", "bulbasaur"].iter().map(|s| s.to_string()).collect()),
                "type" => Ok(["fire", "grass"].iter().map(|s| s.to_string()).collect()),
                _ => Err(format!("503 from {endpoint}")),
            }
        }
    }

    #[test]
    fn from_names_builds_both_views() {
        let set = ReferenceSet::from_names(["mr-mime", "pikachu", "Pikachu", ""]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.display_for("mrmime"), Some("Mr Mime"));
        assert!(set.is_valid("Mr Mime"));
        assert!(set.is_valid("Pikachu"));
        assert!(!set.is_valid("pikachu"));
        assert!(!set.is_degraded());
    }

    #[test]
    fn names_without_ascii_key_stay_valid() {
        let set = ReferenceSet::from_names(["小智", "Brock", "   "]);
        assert_eq!(set.len(), 2);
        assert!(set.is_valid("小智"));
        assert!(set.is_valid("Brock"));
        assert_eq!(set.entries().count(), 1);
        assert_eq!(set.display_for(""), None);
    }

    #[test]
    fn missing_table_reads_as_degraded() {
        let sets = ReferenceSets::new();
        assert!(sets.get("pokemon").is_degraded());
        assert!(sets.get("pokemon").is_empty());
    }

    #[test]
    fn failed_endpoint_degrades_only_that_table() {
        let source = FakeSource { calls: RefCell::new(Vec::new()) };
        let sets = build_reference_sets(&source, TABLES, &CleanOptions::default());

        assert_eq!(*source.calls.borrow(), vec!["pokemon", "type", "ability"]);
        assert_eq!(sets.get("pokemon").len(), 3);
        assert_eq!(sets.get("types").len(), 2);
        assert!(sets.get("abilities").is_degraded());
        assert!(sets.get("trainers").is_valid("Professor Oak"));
        assert_eq!(sets.degraded_tables(), vec!["abilities"]);
    }

    #[test]
    fn offline_degrades_every_remote_table() {
        let sets = build_reference_sets(&Offline, TABLES, &CleanOptions::default());
        let mut degraded = sets.degraded_tables();
        degraded.sort_unstable();
        assert_eq!(degraded, vec!["abilities", "pokemon", "types"]);
        assert!(!sets.get("trainers").is_empty());
    }
}
