//! Capability check for FK cascades.
//!
//! The edge list in [`crate::registry::FK_EDGES`] is a superset across
//! dataset variants. Instead of issuing an UPDATE and interpreting the
//! failure, a run reads the dataset's tables and columns once and skips
//! edges the dataset cannot have.

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::Connection;

use crate::registry::FkEdge;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCatalog {
    tables: BTreeMap<String, BTreeSet<String>>,
}

impl SchemaCatalog {
    pub fn load(conn: &Connection) -> rusqlite::Result<Self> {
        let mut tables = BTreeMap::new();

        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut columns_stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
        for name in names {
            let columns = columns_stmt
                .query_map([&name], |row| row.get::<_, String>(0))?
                .map(|c| c.map(|c| c.to_ascii_lowercase()))
                .collect::<rusqlite::Result<BTreeSet<_>>>()?;
            tables.insert(name.to_ascii_lowercase(), columns);
        }

        Ok(Self { tables })
    }

    // SQLite identifiers are case-insensitive.
    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(&table.to_ascii_lowercase())
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.tables
            .get(&table.to_ascii_lowercase())
            .is_some_and(|cols| cols.contains(&column.to_ascii_lowercase()))
    }

    pub fn supports(&self, edge: &FkEdge) -> bool {
        self.has_column(edge.table, edge.column)
    }
}
