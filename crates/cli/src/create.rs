//! `dexclean create`: look up one pokemon on the reference source and
//! store it with its types, abilities and a randomly chosen trainer.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;

use dexclean_canon::create::{create_record, NewEntity};
use dexclean_config::Settings;
use dexclean_refsource::ReferenceClient;

use crate::{connect, resolve_db, CliError};

pub fn cmd_create(
    settings: &Settings,
    name: &str,
    db: Option<PathBuf>,
    api_base: Option<String>,
    seed: Option<u64>,
    json: bool,
) -> Result<(), CliError> {
    if name.trim().is_empty() {
        return Err(CliError::args("name must not be empty"));
    }
    if settings.reference.offline && api_base.is_none() {
        return Err(CliError::args("create needs the reference source, but settings mark it offline")
            .with_hint("pass --api-base URL or set reference.offline = false"));
    }

    let mut conn = connect(&resolve_db(settings, db))?;

    let base = api_base.as_deref().unwrap_or(settings.reference.base_url.as_str());
    let client = ReferenceClient::new(base, settings.timeout()).map_err(CliError::source)?;
    let entity: NewEntity = client.lookup(name).map_err(CliError::source)?.into();

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let record = create_record(&mut conn, &entity, &mut rng).map_err(CliError::canon)?;

    if json {
        let out = serde_json::to_string_pretty(&record)
            .map_err(|e| CliError::internal(format!("cannot serialize record: {e}")))?;
        println!("{out}");
    } else {
        let ids: Vec<String> = record.association_ids.iter().map(i64::to_string).collect();
        println!(
            "{} pokemon {} with trainer {}; association rows: {}",
            if record.created_pokemon { "created" } else { "updated" },
            record.pokemon_id,
            record.trainer_id,
            ids.join(", ")
        );
    }
    Ok(())
}
