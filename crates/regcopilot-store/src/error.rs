use regcopilot_ai::EmbedError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("embedding failed: {0}")]
    Embed(#[from] EmbedError),

    #[error("vector dimension mismatch: store holds {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },

    #[cfg(feature = "lancedb")]
    #[error("lancedb error: {0}")]
    Lance(#[from] lancedb::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("metadata encoding: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Failure reading or writing a JSON file on disk.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error on {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("malformed JSON in {path:?}: {source}")]
    Corrupt {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },
}
