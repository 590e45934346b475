use thiserror::Error;

/// Errors emitted by the evaluators.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("invalid threshold: {0}")]
    InvalidThresholdKind(String),
    #[error("no rows left in column '{0}' after dropping missing values")]
    EmptyDataAfterFiltering(String),
    #[error("invalid label in column '{column}': {message}")]
    InvalidLabel { column: String, message: String },
    #[error("non-numeric value in column '{column}': {value}")]
    NonNumeric { column: String, value: String },
    #[error("threshold optimizer error: {0}")]
    Optimizer(String),
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
    #[error(transparent)]
    Core(#[from] modelscore_core::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;
