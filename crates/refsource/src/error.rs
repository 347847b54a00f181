use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The source has no entity with this name (HTTP 404).
    #[error("not found on reference source: {0}")]
    NotFound(String),
    /// Connection refused, DNS failure, timeout.
    #[error("network error: {0}")]
    Network(String),
    /// Any other non-success status.
    #[error("HTTP {0}: {1}")]
    Http(u16, String),
    /// Body was not the expected JSON shape.
    #[error("parse error: {0}")]
    Parse(String),
    /// `next` cursor repeated or page empty while more were promised.
    #[error("pagination error: {0}")]
    Pagination(String),
    /// Base URL cannot carry path segments.
    #[error("invalid API base '{0}'")]
    InvalidBase(String),
}
