use async_trait::async_trait;
use regcopilot_core::{Metadata, RelatedItem};

use crate::StoreError;

/// Nearest-neighbour document store.
///
/// Upserting an existing id replaces its text, metadata and embedding.
/// Query results are ordered by descending similarity and never re-ranked
/// by callers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn upsert(&self, id: &str, text: &str, metadata: &Metadata) -> Result<(), StoreError>;

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<RelatedItem>, StoreError>;

    /// Number of stored documents.
    async fn count(&self) -> Result<usize, StoreError>;
}
