//! In-process vector store.
//!
//! Holds every document and its embedding in memory and answers queries by
//! exhaustive cosine similarity. Contents do not outlive the process; the
//! corpus is re-seeded on each run.

use std::cmp::Ordering;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use regcopilot_ai::{Embed, cosine_similarity};
use regcopilot_core::{Metadata, RelatedItem};
use tracing::debug;

use crate::{DocumentStore, StoreError};

struct Entry {
    id: String,
    text: String,
    metadata: Metadata,
    vector: Vec<f32>,
}

pub struct MemoryStore {
    embedder: Arc<dyn Embed>,
    entries: RwLock<Vec<Entry>>,
}

impl MemoryStore {
    pub fn new(embedder: Arc<dyn Embed>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }

    fn poisoned() -> StoreError {
        StoreError::Other("memory store lock poisoned".into())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn upsert(&self, id: &str, text: &str, metadata: &Metadata) -> Result<(), StoreError> {
        let vector = self.embedder.embed(text).await?;

        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        if let Some(first) = entries.first() {
            if first.vector.len() != vector.len() {
                return Err(StoreError::Dimension {
                    expected: first.vector.len(),
                    actual: vector.len(),
                });
            }
        }

        let entry = Entry {
            id: id.to_string(),
            text: text.to_string(),
            metadata: metadata.clone(),
            vector,
        };
        match entries.iter_mut().find(|e| e.id == id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        debug!(doc_id = id, "document upserted");
        Ok(())
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<RelatedItem>, StoreError> {
        if top_k == 0 {
            return Ok(vec![]);
        }
        let query = self.embedder.embed(text).await?;

        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        let mut scored: Vec<(f32, &Entry)> = entries
            .iter()
            .map(|e| (cosine_similarity(&query, &e.vector), e))
            .collect();
        // Stable sort keeps insertion order between equal scores.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(_, e)| RelatedItem {
                text: e.text.clone(),
                metadata: e.metadata.clone(),
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().map_err(|_| Self::poisoned())?.len())
    }
}
