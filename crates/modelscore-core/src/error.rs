use thiserror::Error;

/// Core error type shared across modelscore crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced column does not exist in the table.
    #[error("missing column: {0}")]
    MissingColumn(String),
    /// A row does not have one cell per field.
    #[error("row {row} has {found} cell(s), expected {expected}")]
    RowArity {
        row: usize,
        found: usize,
        expected: usize,
    },
    /// Per-group results disagree on their output fields.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    /// A per-group computation failed; the whole grouped call is aborted.
    #[error("evaluation failed for group {group}: {source}")]
    GroupFailed {
        group: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

/// Convenience alias for results returned by modelscore crates.
pub type Result<T> = std::result::Result<T, Error>;
