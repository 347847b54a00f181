//! Get-or-create insertion of a single pokemon with its types, abilities
//! and a randomly assigned trainer.

use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::Serialize;
use tracing::info;

use crate::error::CanonError;
use crate::normalize::display_form;

/// Trainer inserted when the dataset has none to pick from.
pub const FALLBACK_TRAINER: &str = "New Trainer";

/// An entity as reported by the reference source. Names may be in any
/// casing; they are rendered with [`display_form`] before storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEntity {
    pub name: String,
    /// Ordered by slot. Only the first two are stored.
    pub types: Vec<String>,
    pub abilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedRecord {
    pub pokemon_id: i64,
    pub trainer_id: i64,
    /// One association row per ability, existing or new.
    pub association_ids: Vec<i64>,
    /// False when a pokemon with the same name already existed.
    pub created_pokemon: bool,
}

/// Store `entity` in one transaction and return the association ids.
pub fn create_record<R: Rng + ?Sized>(
    conn: &mut Connection,
    entity: &NewEntity,
    rng: &mut R,
) -> Result<CreatedRecord, CanonError> {
    let name = display_form(entity.name.trim());
    if name.is_empty() {
        return Err(CanonError::InvalidRecord("pokemon name is empty".into()));
    }

    let tx = conn.transaction()?;

    let mut type_ids = Vec::with_capacity(2);
    for type_name in entity
        .types
        .iter()
        .map(|t| display_form(t.trim()))
        .filter(|t| !t.is_empty())
        .take(2)
    {
        type_ids.push(get_or_create(&tx, "types", &type_name)?);
    }
    let type1_id = type_ids.first().copied();
    let type2_id = type_ids.get(1).copied();

    let mut ability_ids = Vec::with_capacity(entity.abilities.len());
    for ability in &entity.abilities {
        let ability = display_form(ability.trim());
        if ability.is_empty() {
            continue;
        }
        ability_ids.push(get_or_create(&tx, "abilities", &ability)?);
    }

    let (pokemon_id, created_pokemon) = match find_by_name(&tx, "pokemon", &name)? {
        Some(id) => {
            tx.execute(
                "UPDATE pokemon SET type1_id = ?1, type2_id = ?2 WHERE id = ?3",
                params![type1_id, type2_id, id],
            )?;
            (id, false)
        }
        None => {
            tx.execute(
                "INSERT INTO pokemon (name, type1_id, type2_id) VALUES (?1, ?2, ?3)",
                params![name, type1_id, type2_id],
            )?;
            (tx.last_insert_rowid(), true)
        }
    };

    let trainer_id = pick_trainer(&tx, rng)?;

    let mut association_ids = Vec::with_capacity(ability_ids.len());
    for ability_id in ability_ids {
        let existing = tx
            .query_row(
                "SELECT id FROM trainer_pokemon_abilities
                  WHERE trainer_id = ?1 AND pokemon_id = ?2 AND ability_id = ?3",
                params![trainer_id, pokemon_id, ability_id],
                |row| row.get(0),
            )
            .optional()?;
        let id = match existing {
            Some(id) => id,
            None => {
                tx.execute(
                    "INSERT INTO trainer_pokemon_abilities (trainer_id, pokemon_id, ability_id)
                     VALUES (?1, ?2, ?3)",
                    params![trainer_id, pokemon_id, ability_id],
                )?;
                tx.last_insert_rowid()
            }
        };
        association_ids.push(id);
    }

    tx.commit()?;

    info!(
        pokemon_id,
        trainer_id,
        created = created_pokemon,
        "stored '{name}' with {} association rows",
        association_ids.len()
    );

    Ok(CreatedRecord {
        pokemon_id,
        trainer_id,
        association_ids,
        created_pokemon,
    })
}

fn find_by_name(tx: &Transaction<'_>, table: &str, name: &str) -> rusqlite::Result<Option<i64>> {
    tx.query_row(
        &format!("SELECT id FROM \"{table}\" WHERE LOWER(name) = LOWER(?1) ORDER BY id LIMIT 1"),
        params![name],
        |row| row.get(0),
    )
    .optional()
}

fn get_or_create(tx: &Transaction<'_>, table: &str, name: &str) -> rusqlite::Result<i64> {
    if let Some(id) = find_by_name(tx, table, name)? {
        return Ok(id);
    }
    tx.execute(&format!("INSERT INTO \"{table}\" (name) VALUES (?1)"), params![name])?;
    Ok(tx.last_insert_rowid())
}

fn pick_trainer<R: Rng + ?Sized>(tx: &Transaction<'_>, rng: &mut R) -> rusqlite::Result<i64> {
    let mut stmt = tx.prepare("SELECT id FROM trainers ORDER BY id")?;
    let ids: rusqlite::Result<Vec<i64>> = stmt.query_map([], |row| row.get(0))?.collect();
    let ids = ids?;

    if let Some(&id) = ids.choose(rng) {
        return Ok(id);
    }
    info!("no trainers found; creating '{FALLBACK_TRAINER}'");
    tx.execute("INSERT INTO trainers (name) VALUES (?1)", params![FALLBACK_TRAINER])?;
    Ok(tx.last_insert_rowid())
}
