//! The cleaning run.
//!
//! Phases, each over every table in [`TABLES`] order:
//! 1. junk removal + correction (fuzzy match against the reference map)
//! 2. validation (drop names outside the reference display set)
//! 3. deduplication (fold case-insensitive duplicates into the lowest id)
//!
//! Phase 3 starts only after phases 1–2 finished for all tables, so FK
//! remaps never target a row a later validation would delete. Everything
//! happens inside one transaction: commit on success, full rollback on any
//! storage error.

use std::collections::BTreeMap;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, error, info, warn};

use crate::config::{CleanOptions, EmptyReferencePolicy};
use crate::error::CanonError;
use crate::fk::{self, CascadeOutcome};
use crate::matcher::best_match;
use crate::model::{AuditEntry, CleanReport, Phase, TableSummary};
use crate::normalize::is_junk;
use crate::reference::ReferenceSets;
use crate::registry::{TableDescriptor, FK_EDGES, TABLES};
use crate::schema::SchemaCatalog;
use crate::store;

/// Clean the dataset behind `conn` in a single exclusive transaction.
///
/// On error the transaction is rolled back and the dataset is unchanged.
pub fn clean_database(
    conn: &mut Connection,
    refs: &ReferenceSets,
    options: &CleanOptions,
) -> Result<CleanReport, CanonError> {
    info!("starting database cleaning");
    let tx = conn.transaction_with_behavior(TransactionBehavior::Exclusive)?;

    match clean_in_transaction(&tx, refs, options) {
        Ok(mut report) => {
            tx.commit()?;
            report.phase = Phase::Committed;
            info!(
                renamed = report.total_renamed(),
                removed = report.total_removed(),
                "database cleaning finished and changes committed"
            );
            Ok(report)
        }
        Err(err) => {
            error!(error = %err, "cleaning failed; rolling back every change from this run");
            if let Err(rollback_err) = tx.rollback() {
                error!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

/// Run every phase, then roll back. The report shows what a real run
/// would have changed.
pub fn dry_run(
    conn: &mut Connection,
    refs: &ReferenceSets,
    options: &CleanOptions,
) -> Result<CleanReport, CanonError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Exclusive)?;
    let mut report = clean_in_transaction(&tx, refs, options)?;
    tx.rollback()?;
    report.phase = Phase::RolledBack;
    info!(
        renamed = report.total_renamed(),
        removed = report.total_removed(),
        "dry run finished; changes rolled back"
    );
    Ok(report)
}

/// Run phases 1–3 inside a caller-owned transaction. The caller decides
/// whether to commit.
pub fn clean_in_transaction(
    tx: &Transaction<'_>,
    refs: &ReferenceSets,
    options: &CleanOptions,
) -> Result<CleanReport, CanonError> {
    let catalog = SchemaCatalog::load(tx)?;
    if let Some(missing) = TABLES.iter().find(|t| !catalog.has_table(t.name)) {
        return Err(CanonError::MissingTable(missing.name.to_string()));
    }

    let mut run = Run {
        tx,
        catalog,
        refs,
        options,
        report: CleanReport::new(),
    };
    run.report.tables = TABLES
        .iter()
        .map(|t| {
            let reference = refs.get(t.name);
            TableSummary {
                table: t.name.to_string(),
                reference_names: reference.len(),
                degraded_reference: reference.is_degraded(),
                ..TableSummary::default()
            }
        })
        .collect();
    run.advance(Phase::ReferencesFetched);

    info!("correcting misspellings and standardizing casing");
    for (idx, table) in TABLES.iter().enumerate() {
        run.correct(idx, table)?;
    }
    run.advance(Phase::Corrected);

    info!("removing unvalidated entries not in reference lists");
    for (idx, table) in TABLES.iter().enumerate() {
        run.validate(idx, table)?;
    }
    run.advance(Phase::Validated);

    info!("removing duplicate entries and remapping foreign keys");
    for (idx, table) in TABLES.iter().enumerate() {
        run.deduplicate(idx, table)?;
    }
    run.advance(Phase::Deduplicated);

    Ok(run.report)
}

struct Run<'a, 'conn> {
    tx: &'a Transaction<'conn>,
    catalog: SchemaCatalog,
    refs: &'a ReferenceSets,
    options: &'a CleanOptions,
    report: CleanReport,
}

impl Run<'_, '_> {
    fn advance(&mut self, phase: Phase) {
        debug_assert!(phase > self.report.phase, "{} -> {}", self.report.phase, phase);
        debug!(from = %self.report.phase, to = %phase, "phase transition");
        self.report.phase = phase;
    }

    // ── Phase 1 ─────────────────────────────────────────────────────

    fn correct(&mut self, idx: usize, table: &TableDescriptor) -> Result<(), CanonError> {
        let refs = self.refs;
        let reference = refs.get(table.name);
        let threshold = self.options.threshold_for(table);

        let mut junk = Vec::new();
        let mut updates = Vec::new();

        for row in store::load_rows(self.tx, table.name)? {
            if is_junk(row.name.as_deref()) {
                junk.push(row);
                continue;
            }
            let stored = row.name.unwrap_or_default();
            let proposal = best_match(&stored, reference, threshold);
            if proposal.name != stored {
                updates.push((row.id, stored, proposal));
            }
        }

        // Junk goes first so FK cleanup never races a rename.
        for row in junk {
            self.delete_with_cascade(idx, table.name, row.id)?;
            info!(table = table.name, id = row.id, name = ?row.name, "removed junk/empty entry");
            self.report.tables[idx].junk_removed += 1;
            self.report.audit.push(AuditEntry::RemovedJunk {
                table: table.name.to_string(),
                id: row.id,
                name: row.name,
            });
        }

        for (id, original, proposal) in updates {
            let Some(current) = store::current_name(self.tx, table.name, id)? else {
                continue;
            };
            if current.as_deref() == Some(proposal.name.as_str()) {
                continue;
            }
            store::rename_row(self.tx, table.name, id, &proposal.name)?;
            info!(
                table = table.name,
                id,
                confidence = ?proposal.confidence,
                "corrected '{original}' to '{}'",
                proposal.name
            );
            self.report.tables[idx].renamed += 1;
            self.report.audit.push(AuditEntry::Renamed {
                table: table.name.to_string(),
                id,
                from: original,
                to: proposal.name,
                confidence: proposal.confidence,
            });
        }

        Ok(())
    }

    // ── Phase 2 ─────────────────────────────────────────────────────

    fn validate(&mut self, idx: usize, table: &TableDescriptor) -> Result<(), CanonError> {
        let refs = self.refs;
        let reference = refs.get(table.name);

        if reference.is_empty() {
            match self.options.on_empty_reference {
                EmptyReferencePolicy::KeepRows => {
                    warn!(
                        table = table.name,
                        policy = %self.options.on_empty_reference,
                        "reference set is empty; skipping validation"
                    );
                    return Ok(());
                }
                EmptyReferencePolicy::DeleteUnmatched => {
                    warn!(
                        table = table.name,
                        policy = %self.options.on_empty_reference,
                        "reference set is empty; every row will be removed as unvalidated"
                    );
                }
            }
        }

        let invalid: Vec<_> = store::load_rows(self.tx, table.name)?
            .into_iter()
            .filter(|row| !row.name.as_deref().is_some_and(|n| reference.is_valid(n)))
            .collect();
        let count = invalid.len();

        for row in invalid {
            self.delete_with_cascade(idx, table.name, row.id)?;
            info!(table = table.name, id = row.id, name = ?row.name, "removed unvalidated entry");
            self.report.tables[idx].unvalidated_removed += 1;
            self.report.audit.push(AuditEntry::RemovedUnvalidated {
                table: table.name.to_string(),
                id: row.id,
                name: row.name,
            });
        }

        if count > 0 {
            info!(table = table.name, "executed deletion of {count} unvalidated entries");
        }
        Ok(())
    }

    // ── Phase 3 ─────────────────────────────────────────────────────

    fn deduplicate(&mut self, idx: usize, table: &TableDescriptor) -> Result<(), CanonError> {
        // lowercase name -> (first spelling seen, ids ascending)
        let mut groups: BTreeMap<String, (String, Vec<i64>)> = BTreeMap::new();
        for row in store::load_rows(self.tx, table.name)? {
            let Some(name) = row.name else { continue };
            groups
                .entry(name.to_lowercase())
                .or_insert_with(|| (name.clone(), Vec::new()))
                .1
                .push(row.id);
        }

        for (name, ids) in groups.into_values() {
            let Some(canonical_id) = ids.iter().copied().min() else {
                continue;
            };
            let duplicates: Vec<i64> = ids.into_iter().filter(|&id| id != canonical_id).collect();
            if duplicates.is_empty() {
                continue;
            }

            info!(
                table = table.name,
                canonical_id,
                "found duplicates for '{name}'; removing {duplicates:?}"
            );

            let outcomes = fk::remap_references_to(
                self.tx,
                &self.catalog,
                FK_EDGES,
                table.name,
                &duplicates,
                canonical_id,
            )?;
            self.record_remaps(idx, &duplicates, canonical_id, outcomes);

            let removed = store::delete_rows(self.tx, table.name, &duplicates)?;
            info!(table = table.name, "deleted {removed} duplicate entries for '{name}'");
            self.report.tables[idx].duplicates_removed += removed;
            self.report.audit.push(AuditEntry::Merged {
                table: table.name.to_string(),
                name,
                canonical_id,
                removed_ids: duplicates,
            });
        }

        Ok(())
    }

    // ── Cascades ────────────────────────────────────────────────────

    /// Nullify every FK pointing at the row, then delete it.
    fn delete_with_cascade(&mut self, idx: usize, table: &str, id: i64) -> Result<(), CanonError> {
        let outcomes = fk::nullify_references_to(self.tx, &self.catalog, FK_EDGES, table, id)?;
        for outcome in outcomes {
            self.report.tables[idx].fk_nullified += outcome.rows;
            self.report.audit.push(AuditEntry::Nullified {
                table: outcome.edge.table.to_string(),
                column: outcome.edge.column.to_string(),
                referenced_table: table.to_string(),
                referenced_id: id,
                rows: outcome.rows,
            });
        }
        store::delete_rows(self.tx, table, &[id])?;
        Ok(())
    }

    fn record_remaps(&mut self, idx: usize, from_ids: &[i64], to_id: i64, outcomes: Vec<CascadeOutcome>) {
        for outcome in outcomes {
            self.report.tables[idx].fk_remapped += outcome.rows;
            self.report.audit.push(AuditEntry::Remapped {
                table: outcome.edge.table.to_string(),
                column: outcome.edge.column.to_string(),
                referenced_table: outcome.edge.references.to_string(),
                from_ids: from_ids.to_vec(),
                to_id,
                rows: outcome.rows,
            });
        }
    }
}
