//! Foreign key cascades driven by [`crate::registry::FK_EDGES`].
//!
//! Both cascades must finish before the referenced row is deleted, so no
//! dependent column ever points at a missing row within the transaction.
//! Edges the dataset does not have (per [`SchemaCatalog`]) are skipped;
//! every other storage error propagates and aborts the run.

use rusqlite::{params, Transaction};
use tracing::{debug, info};

use crate::registry::{edges_into, FkEdge};
use crate::schema::SchemaCatalog;
use crate::store::placeholders;

/// One dependent column touched by a cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub edge: FkEdge,
    pub rows: usize,
}

/// Set every column referencing `table` row `deleted_id` to NULL.
pub fn nullify_references_to(
    tx: &Transaction<'_>,
    catalog: &SchemaCatalog,
    edges: &[FkEdge],
    table: &str,
    deleted_id: i64,
) -> rusqlite::Result<Vec<CascadeOutcome>> {
    let mut outcomes = Vec::new();
    for edge in edges_into(edges, table) {
        if !catalog.supports(edge) {
            debug!(table = edge.table, column = edge.column, "skipping FK edge absent from dataset");
            continue;
        }
        let sql = format!(
            "UPDATE \"{t}\" SET \"{c}\" = NULL WHERE \"{c}\" = ?1",
            t = edge.table,
            c = edge.column
        );
        let rows = tx.execute(&sql, params![deleted_id])?;
        if rows > 0 {
            info!(
                "nullified {rows} FKs in '{}.{}' referencing deleted ID {deleted_id} from '{table}'",
                edge.table, edge.column
            );
            outcomes.push(CascadeOutcome { edge: *edge, rows });
        }
    }
    Ok(outcomes)
}

/// Point every column referencing any of `old_ids` in `table` at `new_id`.
pub fn remap_references_to(
    tx: &Transaction<'_>,
    catalog: &SchemaCatalog,
    edges: &[FkEdge],
    table: &str,
    old_ids: &[i64],
    new_id: i64,
) -> rusqlite::Result<Vec<CascadeOutcome>> {
    let mut outcomes = Vec::new();
    if old_ids.is_empty() {
        return Ok(outcomes);
    }
    for edge in edges_into(edges, table) {
        if !catalog.supports(edge) {
            debug!(table = edge.table, column = edge.column, "skipping FK edge absent from dataset");
            continue;
        }
        let sql = format!(
            "UPDATE \"{t}\" SET \"{c}\" = ? WHERE \"{c}\" IN ({})",
            placeholders(old_ids.len()),
            t = edge.table,
            c = edge.column
        );
        let values = std::iter::once(new_id).chain(old_ids.iter().copied());
        let rows = tx.execute(&sql, rusqlite::params_from_iter(values))?;
        if rows > 0 {
            info!(
                "remapped {rows} FKs in '{}.{}' from {old_ids:?} to {new_id}",
                edge.table, edge.column
            );
            outcomes.push(CascadeOutcome { edge: *edge, rows });
        }
    }
    Ok(outcomes)
}
