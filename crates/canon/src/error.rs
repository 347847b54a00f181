use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanonError {
    /// Dataset file is missing or SQLite refused to open it.
    #[error("cannot open dataset '{}': {reason}", path.display())]
    Connect { path: PathBuf, reason: String },
    /// A registered entity table does not exist in the dataset.
    #[error("dataset is missing entity table '{0}'")]
    MissingTable(String),
    /// Any other storage failure. Fatal to a cleaning run.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    /// A record handed to the creator has no usable name.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    /// Option validation error (unknown table, zero-length list, ...).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
}
