//! Reference source client, shared by the cleaning run and the record
//! creator.
//!
//! Wire contract: paginated name listings (`{base}/{endpoint}/?limit=N`,
//! follow `next`) and single-entity lookups (`{base}/pokemon/{slug}`).
//!
//! Blocking, one request at a time, no retries.

mod client;
mod error;

pub use client::{EntityRecord, ReferenceClient, DEFAULT_API_BASE, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT};
pub use error::SourceError;
