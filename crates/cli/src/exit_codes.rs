//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | Usage error (bad args, bad settings)     |
//! | 10-19   | dataset          | Opening or cleaning the SQLite dataset   |
//! | 20-29   | reference        | Reference source lookups                 |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant mapping function below

use dexclean_canon::CanonError;
use dexclean_config::ConfigError;
use dexclean_refsource::SourceError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable or invalid settings file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Dataset (10-19)
// =============================================================================

/// Dataset file missing or SQLite refused to open it. Nothing ran.
pub const EXIT_DB_CONNECT: u8 = 10;

/// Cleaning failed mid-run. The transaction was rolled back and the
/// dataset is unchanged.
pub const EXIT_CLEAN_FAILED: u8 = 11;

// =============================================================================
// Reference source (20-29)
// =============================================================================

/// The reference source has no entity with the requested name (404).
pub const EXIT_UPSTREAM_NOT_FOUND: u8 = 20;

/// Reference source unreachable, timed out, or replied with garbage.
/// Only raised by commands that cannot proceed without it (`create`);
/// `clean` degrades instead.
pub const EXIT_UPSTREAM: u8 = 21;

// =============================================================================
// Error mapping
// =============================================================================

/// Map an engine error to its exit code.
pub fn canon_exit_code(err: &CanonError) -> u8 {
    match err {
        CanonError::Connect { .. } => EXIT_DB_CONNECT,
        CanonError::MissingTable(_) | CanonError::Storage(_) => EXIT_CLEAN_FAILED,
        CanonError::InvalidRecord(_) => EXIT_USAGE,
        CanonError::ConfigValidation(_) => EXIT_USAGE,
    }
}

pub fn source_exit_code(err: &SourceError) -> u8 {
    match err {
        SourceError::NotFound(_) => EXIT_UPSTREAM_NOT_FOUND,
        SourceError::InvalidBase(_) => EXIT_USAGE,
        SourceError::Network(_)
        | SourceError::Http(..)
        | SourceError::Parse(_)
        | SourceError::Pagination(_) => EXIT_UPSTREAM,
    }
}

pub fn config_exit_code(_err: &ConfigError) -> u8 {
    EXIT_USAGE
}
