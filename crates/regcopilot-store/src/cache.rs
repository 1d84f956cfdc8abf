//! Summary cache: the full set of summarised documents from the last
//! ingestion, stored as one JSON array and replaced wholesale on each save.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use regcopilot_core::SummarizedDocument;
use tracing::{debug, info};

use crate::PersistError;
use crate::json_file::{read_json, write_json};

pub struct SummaryCache {
    path: PathBuf,
    ttl: Option<Duration>,
}

impl SummaryCache {
    /// `ttl` of `None` means a present, non-empty cache never goes stale.
    pub fn new(path: impl Into<PathBuf>, ttl: Option<Duration>) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load cached documents.
    ///
    /// Returns `Ok(None)` when the cache is absent, empty, or older than the
    /// TTL. A file that exists but cannot be parsed is an error so callers
    /// can log it before refetching.
    pub fn load(&self) -> Result<Option<Vec<SummarizedDocument>>, PersistError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no summary cache");
            return Ok(None);
        }
        if self.is_stale()? {
            info!(path = %self.path.display(), "summary cache is stale");
            return Ok(None);
        }
        let docs: Vec<SummarizedDocument> = read_json(&self.path)?;
        if docs.is_empty() {
            return Ok(None);
        }
        Ok(Some(docs))
    }

    pub fn save(&self, docs: &[SummarizedDocument]) -> Result<(), PersistError> {
        write_json(&self.path, docs)?;
        info!(path = %self.path.display(), count = docs.len(), "saved summary cache");
        Ok(())
    }

    fn is_stale(&self) -> Result<bool, PersistError> {
        let Some(ttl) = self.ttl else {
            return Ok(false);
        };
        let modified = std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map_err(|source| PersistError::Io {
                path: self.path.clone(),
                source,
            })?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        Ok(age > ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regcopilot_core::Outcome;
    use tempfile::TempDir;

    fn doc(id: &str, summary: Outcome) -> SummarizedDocument {
        SummarizedDocument {
            id: id.into(),
            regulation_title: format!("Title {id}"),
            regulation_text: summary,
            title: format!("Title {id}"),
            content: "body".into(),
            source: "local".into(),
        }
    }

    #[test]
    fn round_trip_preserves_documents() {
        let tmp = TempDir::new().unwrap();
        let cache = SummaryCache::new(tmp.path().join("out/summaries.json"), None);
        let docs = vec![
            doc("a", Outcome::ok("summary a")),
            doc("b", Outcome::failed("timeout")),
            doc("c", Outcome::ok("summary c")),
        ];
        cache.save(&docs).unwrap();
        assert_eq!(cache.load().unwrap(), Some(docs));
    }

    #[test]
    fn missing_and_empty_are_misses() {
        let tmp = TempDir::new().unwrap();
        let cache = SummaryCache::new(tmp.path().join("summaries.json"), None);
        assert_eq!(cache.load().unwrap(), None);
        cache.save(&[]).unwrap();
        assert_eq!(cache.load().unwrap(), None);
    }

    #[test]
    fn malformed_cache_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("summaries.json");
        std::fs::write(&path, r#"{"not": "an array"}"#).unwrap();
        let cache = SummaryCache::new(&path, None);
        assert!(matches!(cache.load(), Err(PersistError::Corrupt { .. })));
    }

    #[test]
    fn save_overwrites_previous_contents() {
        let tmp = TempDir::new().unwrap();
        let cache = SummaryCache::new(tmp.path().join("summaries.json"), None);
        cache
            .save(&[doc("a", Outcome::ok("x")), doc("b", Outcome::ok("y"))])
            .unwrap();
        cache.save(&[doc("c", Outcome::ok("z"))]).unwrap();
        let loaded = cache.load().unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "c");
    }

    #[test]
    fn expired_ttl_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("summaries.json");
        SummaryCache::new(&path, None)
            .save(&[doc("a", Outcome::ok("x"))])
            .unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let fresh = SummaryCache::new(&path, Some(Duration::from_secs(3600)));
        assert!(fresh.load().unwrap().is_some());
        let expired = SummaryCache::new(&path, Some(Duration::from_millis(1)));
        assert_eq!(expired.load().unwrap(), None);
    }
}
