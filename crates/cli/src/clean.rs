//! `dexclean clean`: fetch reference names, then clean the dataset in one
//! transaction.

use std::path::PathBuf;

use tracing::warn;

use dexclean_canon::reference::Offline;
use dexclean_canon::registry::TABLES;
use dexclean_canon::{build_reference_sets, clean_database, dry_run, CleanReport, ReferenceSets};
use dexclean_config::Settings;
use dexclean_refsource::ReferenceClient;

use crate::{connect, resolve_db, CliError};

pub struct CleanArgs {
    pub db: Option<PathBuf>,
    pub api_base: Option<String>,
    pub json: bool,
    pub offline: bool,
    pub dry_run: bool,
}

pub fn cmd_clean(settings: &Settings, args: CleanArgs) -> Result<(), CliError> {
    let db = resolve_db(settings, args.db);
    let mut conn = connect(&db)?;

    let refs = fetch_references(settings, args.api_base.as_deref(), args.offline)?;

    let outcome = if args.dry_run {
        dry_run(&mut conn, &refs, &settings.cleaning)
    } else {
        clean_database(&mut conn, &refs, &settings.cleaning)
    };
    let report = outcome.map_err(|e| {
        CliError::canon(e).with_hint(format!("{} was left unchanged", db.display()))
    })?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::internal(format!("cannot serialize report: {e}")))?;
        println!("{json}");
    } else {
        print_summary(&db, &report);
    }
    Ok(())
}

fn fetch_references(
    settings: &Settings,
    api_base: Option<&str>,
    offline: bool,
) -> Result<ReferenceSets, CliError> {
    if offline || settings.reference.offline {
        warn!("offline: reference names for remote tables are unavailable");
        return Ok(build_reference_sets(&Offline, TABLES, &settings.cleaning));
    }

    let base = api_base.unwrap_or(settings.reference.base_url.as_str());
    let client = ReferenceClient::new(base, settings.timeout())
        .map_err(CliError::source)?
        .with_page_size(settings.reference.page_size);
    Ok(build_reference_sets(&client, TABLES, &settings.cleaning))
}

fn print_summary(db: &std::path::Path, report: &CleanReport) {
    println!("{} ({})", db.display(), report.phase);
    println!(
        "  {:<10} {:>6} {:>5} {:>8} {:>8} {:>6} {:>8} {:>9}",
        "table", "ref", "junk", "renamed", "invalid", "dupes", "fk-null", "fk-remap"
    );
    for t in &report.tables {
        let reference = if t.degraded_reference {
            "-".to_string()
        } else {
            t.reference_names.to_string()
        };
        println!(
            "  {:<10} {:>6} {:>5} {:>8} {:>8} {:>6} {:>8} {:>9}",
            t.table,
            reference,
            t.junk_removed,
            t.renamed,
            t.unvalidated_removed,
            t.duplicates_removed,
            t.fk_nullified,
            t.fk_remapped
        );
    }
    println!(
        "{} rows removed, {} renamed",
        report.total_removed(),
        report.total_renamed()
    );
}
