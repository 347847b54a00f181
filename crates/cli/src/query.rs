//! `dexclean query`: read-only lookups.

use std::path::PathBuf;

use clap::ValueEnum;
use tracing::info;

use dexclean_canon::query;
use dexclean_config::Settings;

use crate::{connect, resolve_db, CliError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QueryKind {
    /// Pokemon that have the given ability
    PokemonByAbility,
    /// Pokemon whose primary or secondary type is the given type
    PokemonByType,
    /// Trainers that own the given pokemon
    TrainersByPokemon,
    /// Abilities recorded for the given pokemon
    AbilitiesByPokemon,
}

pub fn cmd_query(
    settings: &Settings,
    kind: QueryKind,
    name: &str,
    db: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    if name.trim().is_empty() {
        return Err(CliError::args("name must not be empty"));
    }

    let conn = connect(&resolve_db(settings, db))?;
    let results = match kind {
        QueryKind::PokemonByAbility => query::pokemon_by_ability(&conn, name),
        QueryKind::PokemonByType => query::pokemon_by_type(&conn, name),
        QueryKind::TrainersByPokemon => query::trainers_by_pokemon(&conn, name),
        QueryKind::AbilitiesByPokemon => query::abilities_by_pokemon(&conn, name),
    }
    .map_err(CliError::canon)?;

    if json {
        let out = serde_json::to_string(&results)
            .map_err(|e| CliError::internal(format!("cannot serialize results: {e}")))?;
        println!("{out}");
    } else {
        if results.is_empty() {
            info!(?kind, name, "no matches");
        }
        for r in &results {
            println!("{r}");
        }
    }
    Ok(())
}
