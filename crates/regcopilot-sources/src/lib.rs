//! Sources of raw regulatory documents: a local directory of text files, and
//! (with the `http` feature) headlines scraped from regulator web pages.

use std::path::PathBuf;

use async_trait::async_trait;
use regcopilot_core::RawDocument;
use thiserror::Error;

mod local;
pub use local::{LocalSource, list_files};

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub use http::WebSource;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("source directory not found: {0:?}")]
    MissingDirectory(PathBuf),
    #[error("io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned {status}")]
    Server { url: String, status: u16 },
}

/// Where a batch of raw documents comes from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Fetch every currently available document.
    async fn fetch(&self) -> Result<Vec<RawDocument>, SourceError>;
}
