// dexclean CLI - canonicalize, deduplicate and query an entity dataset

mod clean;
mod create;
mod exit_codes;
mod query;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dexclean_canon::store::open_dataset;
use dexclean_canon::CanonError;
use dexclean_config::{ConfigError, Settings};
use dexclean_refsource::SourceError;

use exit_codes::{canon_exit_code, config_exit_code, source_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};
use query::QueryKind;

#[derive(Parser)]
#[command(name = "dexclean")]
#[command(about = "Canonicalize names, remove junk and duplicates, and keep foreign keys consistent")]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/dexclean/settings.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log detail (-v debug, -vv trace). RUST_LOG applies otherwise.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the dataset in place (one transaction; rolled back on any error)
    #[command(after_help = "\
Examples:
  dexclean clean --db pokemon_assessment.db
  dexclean clean --json > report.json
  dexclean clean --dry-run
  dexclean clean --offline --config strict.toml")]
    Clean {
        /// SQLite dataset to clean
        #[arg(long, env = "DEXCLEAN_DB", value_name = "PATH")]
        db: Option<PathBuf>,

        /// Reference source API root
        #[arg(long, env = "DEXCLEAN_API_BASE", value_name = "URL")]
        api_base: Option<String>,

        /// Print the run report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Do not contact the reference source; remote tables are degraded
        #[arg(long)]
        offline: bool,

        /// Run every phase, report, then roll back
        #[arg(long)]
        dry_run: bool,
    },

    /// Read-only lookups over the cleaned dataset (case-insensitive)
    #[command(after_help = "\
Examples:
  dexclean query pokemon-by-ability static
  dexclean query pokemon-by-type water --json
  dexclean query trainers-by-pokemon Pikachu
  dexclean query abilities-by-pokemon 'mr mime'")]
    Query {
        kind: QueryKind,

        /// Name to look up
        name: String,

        #[arg(long, env = "DEXCLEAN_DB", value_name = "PATH")]
        db: Option<PathBuf>,

        /// Print the result as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Fetch a pokemon from the reference source and store it with a random trainer
    #[command(after_help = "\
Examples:
  dexclean create bulbasaur
  dexclean create 'Mr Mime' --seed 7 --json")]
    Create {
        /// Pokemon name as known to the reference source
        name: String,

        #[arg(long, env = "DEXCLEAN_DB", value_name = "PATH")]
        db: Option<PathBuf>,

        #[arg(long, env = "DEXCLEAN_API_BASE", value_name = "URL")]
        api_base: Option<String>,

        /// Seed for the trainer pick (default: OS entropy)
        #[arg(long)]
        seed: Option<u64>,

        /// Print the created record as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = Settings::load(cli.config.as_deref())
        .map_err(CliError::config)
        .and_then(|settings| match cli.command {
            Commands::Clean {
                db,
                api_base,
                json,
                offline,
                dry_run,
            } => clean::cmd_clean(
                &settings,
                clean::CleanArgs {
                    db,
                    api_base,
                    json,
                    offline,
                    dry_run,
                },
            ),
            Commands::Query { kind, name, db, json } => query::cmd_query(&settings, kind, &name, db, json),
            Commands::Create {
                name,
                db,
                api_base,
                seed,
                json,
            } => create::cmd_create(&settings, &name, db, api_base, seed, json),
        });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    // A subscriber may already be installed (tests); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Flag (or env var, via clap) wins over the settings file.
fn resolve_db(settings: &Settings, flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| settings.database.clone())
}

fn connect(path: &Path) -> Result<rusqlite::Connection, CliError> {
    open_dataset(path).map_err(|e| {
        CliError::canon(e).with_hint("pass --db PATH or set DEXCLEAN_DB to an existing SQLite file")
    })
}

// ============================================================================
// Errors
// ============================================================================

pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Failure with no dedicated exit code (e.g. output serialization).
    pub fn internal(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn canon(err: CanonError) -> Self {
        Self { code: canon_exit_code(&err), message: err.to_string(), hint: None }
    }

    pub fn source(err: SourceError) -> Self {
        let hint = match &err {
            SourceError::Network(_) => Some("check network access or --api-base".to_string()),
            SourceError::NotFound(_) => Some("names are looked up in lowercase with hyphens (mr-mime)".to_string()),
            _ => None,
        };
        Self { code: source_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn config(err: ConfigError) -> Self {
        Self { code: config_exit_code(&err), message: err.to_string(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
