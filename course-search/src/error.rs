use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a [`crate::HistoryPort`].
///
/// The bridge never recovers from these; they are handed back to the caller
/// as produced by the port.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The host refused to push or replace an entry.
    #[error("navigation history rejected the entry: {0}")]
    Rejected(String),

    /// Reading or writing a persisted history failed.
    #[error("history storage error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted history could not be (de)serialized.
    #[error("history payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read search config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse search config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid search config: {0}")]
    Invalid(String),
}
