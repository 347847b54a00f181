//! Read-only lookups over a cleaned dataset.
//!
//! Names compare case-insensitively with `LOWER()`. No fuzzy matching
//! happens here; an unknown name yields an empty list.

use rusqlite::{params, Connection};

use crate::error::CanonError;

/// Pokemon linked to `ability` through the association table.
pub fn pokemon_by_ability(conn: &Connection, ability: &str) -> Result<Vec<String>, CanonError> {
    names(
        conn,
        "SELECT DISTINCT p.name
           FROM pokemon p
           JOIN trainer_pokemon_abilities tpa ON p.id = tpa.pokemon_id
           JOIN abilities a ON tpa.ability_id = a.id
          WHERE LOWER(a.name) = LOWER(?1)
          ORDER BY p.name",
        ability,
    )
}

/// Pokemon whose primary or secondary type is `type_name`.
pub fn pokemon_by_type(conn: &Connection, type_name: &str) -> Result<Vec<String>, CanonError> {
    names(
        conn,
        "SELECT DISTINCT p.name
           FROM pokemon p
           JOIN types t1 ON p.type1_id = t1.id
           LEFT JOIN types t2 ON p.type2_id = t2.id
          WHERE LOWER(t1.name) = LOWER(?1)
             OR (t2.id IS NOT NULL AND LOWER(t2.name) = LOWER(?1))
          ORDER BY p.name",
        type_name,
    )
}

pub fn trainers_by_pokemon(conn: &Connection, pokemon: &str) -> Result<Vec<String>, CanonError> {
    names(
        conn,
        "SELECT DISTINCT t.name
           FROM trainers t
           JOIN trainer_pokemon_abilities tpa ON t.id = tpa.trainer_id
           JOIN pokemon p ON tpa.pokemon_id = p.id
          WHERE LOWER(p.name) = LOWER(?1)
          ORDER BY t.name",
        pokemon,
    )
}

pub fn abilities_by_pokemon(conn: &Connection, pokemon: &str) -> Result<Vec<String>, CanonError> {
    names(
        conn,
        "SELECT DISTINCT a.name
           FROM abilities a
           JOIN trainer_pokemon_abilities tpa ON a.id = tpa.ability_id
           JOIN pokemon p ON tpa.pokemon_id = p.id
          WHERE LOWER(p.name) = LOWER(?1)
          ORDER BY a.name",
        pokemon,
    )
}

fn names(conn: &Connection, sql: &str, needle: &str) -> Result<Vec<String>, CanonError> {
    let mut stmt = conn.prepare(sql)?;
    let rows: rusqlite::Result<Vec<Option<String>>> =
        stmt.query_map(params![needle], |row| row.get(0))?.collect();
    Ok(rows?.into_iter().flatten().collect())
}
