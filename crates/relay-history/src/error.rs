use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Parsed as JSON but not as an ordered list of `{role, parts}` records.
    #[error("invalid history format: {0}")]
    InvalidFormat(String),
}
