// Dataset access: opening the SQLite file and the row-level helpers the
// cleaning phases use. Every mutating helper takes the run's transaction.

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Transaction};

use crate::error::CanonError;

/// Reference layout of the dataset. Column and table names match
/// [`crate::registry::FK_EDGES`].
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS types (
    id INTEGER PRIMARY KEY,
    name TEXT
);

CREATE TABLE IF NOT EXISTS abilities (
    id INTEGER PRIMARY KEY,
    name TEXT
);

CREATE TABLE IF NOT EXISTS trainers (
    id INTEGER PRIMARY KEY,
    name TEXT
);

CREATE TABLE IF NOT EXISTS pokemon (
    id INTEGER PRIMARY KEY,
    name TEXT,
    type1_id INTEGER REFERENCES types(id),
    type2_id INTEGER REFERENCES types(id)
);

CREATE TABLE IF NOT EXISTS trainer_pokemon_abilities (
    id INTEGER PRIMARY KEY,
    trainer_id INTEGER REFERENCES trainers(id),
    pokemon_id INTEGER REFERENCES pokemon(id),
    ability_id INTEGER REFERENCES abilities(id)
);
"#;

/// Open an existing dataset read-write with foreign key enforcement on.
/// A missing file is a connection failure, never an empty new dataset.
pub fn open_dataset(path: &Path) -> Result<Connection, CanonError> {
    let connect_err = |reason: String| CanonError::Connect {
        path: path.to_path_buf(),
        reason,
    };

    if !path.is_file() {
        return Err(connect_err("file not found".into()));
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI,
    )
    .map_err(|e| connect_err(e.to_string()))?;

    // Has no effect inside a transaction, so it is set at open time.
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(|e| connect_err(e.to_string()))?;

    Ok(conn)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntityRow {
    pub id: i64,
    pub name: Option<String>,
}

/// Stored names are read leniently: numbers and blobs are rendered as text.
fn name_from_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}

pub(crate) fn load_rows(tx: &Transaction<'_>, table: &str) -> rusqlite::Result<Vec<EntityRow>> {
    let mut stmt = tx.prepare(&format!("SELECT id, name FROM \"{table}\" ORDER BY id"))?;
    let rows: rusqlite::Result<Vec<EntityRow>> = stmt
        .query_map([], |row| {
            Ok(EntityRow {
                id: row.get(0)?,
                name: name_from_value(row.get_ref(1)?),
            })
        })?
        .collect();
    rows
}

/// Current name of row `id`: `None` if the row is gone, `Some(None)` if
/// its name is NULL.
pub(crate) fn current_name(tx: &Transaction<'_>, table: &str, id: i64) -> rusqlite::Result<Option<Option<String>>> {
    tx.query_row(
        &format!("SELECT name FROM \"{table}\" WHERE id = ?1"),
        params![id],
        |row| Ok(name_from_value(row.get_ref(0)?)),
    )
    .optional()
}

pub(crate) fn rename_row(tx: &Transaction<'_>, table: &str, id: i64, name: &str) -> rusqlite::Result<usize> {
    tx.execute(&format!("UPDATE \"{table}\" SET name = ?1 WHERE id = ?2"), params![name, id])
}

pub(crate) fn delete_rows(tx: &Transaction<'_>, table: &str, ids: &[i64]) -> rusqlite::Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let sql = format!("DELETE FROM \"{table}\" WHERE id IN ({})", placeholders(ids.len()));
    tx.execute(&sql, rusqlite::params_from_iter(ids))
}

pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            "INSERT INTO types (id, name) VALUES (1, 'Fire'), (2, NULL), (3, 42), (4, 'grass');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn load_rows_reads_null_and_numeric_names() {
        let mut conn = dataset();
        let tx = conn.transaction().unwrap();
        let rows = load_rows(&tx, "types").unwrap();
        assert_eq!(
            rows,
            vec![
                EntityRow { id: 1, name: Some("Fire".into()) },
                EntityRow { id: 2, name: None },
                EntityRow { id: 3, name: Some("42".into()) },
                EntityRow { id: 4, name: Some("grass".into()) },
            ]
        );
    }

    #[test]
    fn current_name_distinguishes_missing_and_null() {
        let mut conn = dataset();
        let tx = conn.transaction().unwrap();
        assert_eq!(current_name(&tx, "types", 1).unwrap(), Some(Some("Fire".into())));
        assert_eq!(current_name(&tx, "types", 2).unwrap(), Some(None));
        assert_eq!(current_name(&tx, "types", 99).unwrap(), None);
    }

    #[test]
    fn rename_and_delete() {
        let mut conn = dataset();
        let tx = conn.transaction().unwrap();
        assert_eq!(rename_row(&tx, "types", 4, "Grass").unwrap(), 1);
        assert_eq!(delete_rows(&tx, "types", &[2, 3, 99]).unwrap(), 2);
        assert_eq!(delete_rows(&tx, "types", &[]).unwrap(), 0);
        let names: Vec<_> = load_rows(&tx, "types").unwrap().into_iter().filter_map(|r| r.name).collect();
        assert_eq!(names, vec!["Fire", "Grass"]);
    }

    #[test]
    fn open_missing_file_is_connect_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_dataset(&dir.path().join("absent.db")).unwrap_err();
        assert!(matches!(err, CanonError::Connect { .. }));
        assert!(err.to_string().contains("file not found"), "{err}");
    }

    #[test]
    fn open_enables_foreign_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dex.db");
        Connection::open(&path).unwrap().execute_batch(SCHEMA).unwrap();

        let conn = open_dataset(&path).unwrap();
        let enabled: i64 = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0)).unwrap();
        assert_eq!(enabled, 1);
    }
}
