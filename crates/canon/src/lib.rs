//! `dexclean-canon`: name canonicalization and deduplication engine.
//!
//! Pure engine crate: receives an open SQLite handle and pre-built reference
//! sets, rewrites entity names into their canonical form and keeps every
//! foreign key consistent. No network access happens here; reference names
//! arrive through the [`reference::NameSource`] trait.

pub mod clean;
pub mod config;
pub mod create;
pub mod error;
pub mod fk;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod query;
pub mod reference;
pub mod registry;
pub mod schema;
pub mod store;

pub use clean::{clean_database, clean_in_transaction, dry_run};
pub use config::{CleanOptions, EmptyReferencePolicy};
pub use error::CanonError;
pub use model::{AuditEntry, CleanReport, Phase, TableSummary};
pub use reference::{build_reference_sets, NameSource, ReferenceSet, ReferenceSets};
