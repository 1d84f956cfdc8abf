use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regcopilot_core::RawDocument;
use tracing::{info, warn};

use crate::{DocumentSource, SourceError};

/// Reads one document per file with the configured extension.
///
/// Files are visited in name order so runs over the same directory produce
/// the same document order.
pub struct LocalSource {
    dir: PathBuf,
    extension: String,
}

impl LocalSource {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }
}

/// File names with the given extension in `dir`, sorted.
pub async fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, SourceError> {
    if !dir.is_dir() {
        return Err(SourceError::MissingDirectory(dir.to_path_buf()));
    }
    let io_err = |source| SourceError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|e| e == extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[async_trait]
impl DocumentSource for LocalSource {
    fn name(&self) -> &str {
        "local"
    }

    async fn fetch(&self) -> Result<Vec<RawDocument>, SourceError> {
        let files = list_files(&self.dir, &self.extension).await?;

        let mut docs = Vec::with_capacity(files.len());
        for path in files {
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(c) => c,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let title = path
                .file_stem()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_name.clone());
            docs.push(RawDocument {
                id: format!("mock_{file_name}"),
                title,
                content,
                source: "local".to_string(),
            });
        }

        info!(count = docs.len(), dir = %self.dir.display(), "fetched local documents");
        Ok(docs)
    }
}
