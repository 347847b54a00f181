use serde::Serialize;

use crate::matcher::Confidence;

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// Progress of a cleaning run. Phases only move forward; a run ends in
/// `Committed` or `RolledBack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    ReferencesFetched,
    Corrected,
    Validated,
    Deduplicated,
    Committed,
    RolledBack,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::ReferencesFetched => "references_fetched",
            Self::Corrected => "corrected",
            Self::Validated => "validated",
            Self::Deduplicated => "deduplicated",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Audit trail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuditEntry {
    /// Phase 1: empty, blank or punctuation-only name.
    RemovedJunk {
        table: String,
        id: i64,
        name: Option<String>,
    },
    /// Phase 1: spelling or casing fix.
    Renamed {
        table: String,
        id: i64,
        from: String,
        to: String,
        confidence: Confidence,
    },
    /// Phase 2: name outside the reference vocabulary.
    RemovedUnvalidated {
        table: String,
        id: i64,
        name: Option<String>,
    },
    /// Phase 3: duplicate rows folded into `canonical_id`.
    Merged {
        table: String,
        name: String,
        canonical_id: i64,
        removed_ids: Vec<i64>,
    },
    Nullified {
        table: String,
        column: String,
        referenced_table: String,
        referenced_id: i64,
        rows: usize,
    },
    Remapped {
        table: String,
        column: String,
        referenced_table: String,
        from_ids: Vec<i64>,
        to_id: i64,
        rows: usize,
    },
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub table: String,
    pub reference_names: usize,
    pub degraded_reference: bool,
    pub junk_removed: usize,
    pub renamed: usize,
    pub unvalidated_removed: usize,
    pub duplicates_removed: usize,
    pub fk_nullified: usize,
    pub fk_remapped: usize,
}

impl TableSummary {
    pub fn rows_removed(&self) -> usize {
        self.junk_removed + self.unvalidated_removed + self.duplicates_removed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanReport {
    pub meta: ReportMeta,
    pub phase: Phase,
    pub tables: Vec<TableSummary>,
    pub audit: Vec<AuditEntry>,
}

impl CleanReport {
    pub(crate) fn new() -> Self {
        Self {
            meta: ReportMeta {
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
            },
            phase: Phase::Idle,
            tables: Vec::new(),
            audit: Vec::new(),
        }
    }

    pub fn table(&self, name: &str) -> Option<&TableSummary> {
        self.tables.iter().find(|t| t.table == name)
    }

    /// True when the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.audit.is_empty()
    }

    pub fn total_removed(&self) -> usize {
        self.tables.iter().map(TableSummary::rows_removed).sum()
    }

    pub fn total_renamed(&self) -> usize {
        self.tables.iter().map(|t| t.renamed).sum()
    }
}
