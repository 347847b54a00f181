//! Static registry of the entity tables and the foreign key edges between
//! them. Iterated in the same order on every run; no runtime discovery.

/// Levenshtein threshold applied when no override is configured.
pub const DEFAULT_THRESHOLD: usize = 2;

/// Agent names have no remote listing, so the vocabulary is fixed.
pub const DEFAULT_TRAINERS: &[&str] = &["Ash Ketchum", "Brock", "Gary Oak", "Professor Oak", "Misty"];

/// Table linking a trainer, a pokemon and one of its abilities.
pub const ASSOCIATION_TABLE: &str = "trainer_pokemon_abilities";

/// Where a table's reference vocabulary comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceOrigin {
    /// Paginated listing endpoint on the reference source.
    Remote(&'static str),
    /// Built-in list, replaceable through [`crate::CleanOptions::fixed_names`].
    Fixed(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: &'static str,
    pub origin: ReferenceOrigin,
    pub threshold: usize,
}

/// Entity tables in processing order.
pub static TABLES: &[TableDescriptor] = &[
    TableDescriptor {
        name: "pokemon",
        origin: ReferenceOrigin::Remote("pokemon"),
        threshold: DEFAULT_THRESHOLD,
    },
    TableDescriptor {
        name: "types",
        origin: ReferenceOrigin::Remote("type"),
        threshold: DEFAULT_THRESHOLD,
    },
    TableDescriptor {
        name: "abilities",
        origin: ReferenceOrigin::Remote("ability"),
        threshold: DEFAULT_THRESHOLD,
    },
    TableDescriptor {
        name: "trainers",
        origin: ReferenceOrigin::Fixed(DEFAULT_TRAINERS),
        threshold: DEFAULT_THRESHOLD,
    },
];

/// `table.column` holds ids of rows in `references`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FkEdge {
    pub table: &'static str,
    pub column: &'static str,
    pub references: &'static str,
}

impl FkEdge {
    pub const fn new(table: &'static str, column: &'static str, references: &'static str) -> Self {
        Self { table, column, references }
    }
}

/// Every column that must be nullified or remapped when a referenced row
/// is deleted or merged. May name columns that a given dataset lacks.
pub static FK_EDGES: &[FkEdge] = &[
    FkEdge::new("pokemon", "type1_id", "types"),
    FkEdge::new("pokemon", "type2_id", "types"),
    FkEdge::new(ASSOCIATION_TABLE, "pokemon_id", "pokemon"),
    FkEdge::new(ASSOCIATION_TABLE, "trainer_id", "trainers"),
    FkEdge::new(ASSOCIATION_TABLE, "ability_id", "abilities"),
];

pub fn descriptor(name: &str) -> Option<&'static TableDescriptor> {
    TABLES.iter().find(|t| t.name == name)
}

/// Edges whose referenced side is `table`.
pub fn edges_into<'a>(edges: &'a [FkEdge], table: &'a str) -> impl Iterator<Item = &'a FkEdge> + 'a {
    edges.iter().filter(move |e| e.references == table)
}
