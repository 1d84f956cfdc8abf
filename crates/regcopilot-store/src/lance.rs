//! LanceDB-backed document store.
//!
//! A single `regulatory_docs` table holds regulations, policies and controls
//! with their embeddings. The table is created lazily on first upsert, once
//! the embedding dimension is known.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, FixedSizeListBuilder, Float32Builder, LargeStringArray, RecordBatchIterator,
    StringArray,
};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use regcopilot_ai::Embed;
use regcopilot_core::{Metadata, RelatedItem, store};
use tracing::{debug, info};

use crate::{DocumentStore, StoreError};

const DOCUMENTS_TABLE: &str = "regulatory_docs";

pub struct LanceStore {
    db: lancedb::Connection,
    embedder: Arc<dyn Embed>,
}

impl LanceStore {
    /// Connect to a LanceDB database at the given path.
    ///
    /// Creates the database directory if it doesn't exist.
    pub async fn open(path: &Path, embedder: Arc<dyn Embed>) -> Result<Self, StoreError> {
        let uri = path
            .to_str()
            .ok_or_else(|| StoreError::Other("non-UTF8 database path".into()))?;
        let db = lancedb::connect(uri).execute().await?;
        info!(path = uri, model = embedder.model_name(), "opened LanceDB store");
        Ok(Self { db, embedder })
    }

    /// List table names in the database.
    pub async fn table_names(&self) -> Result<Vec<String>, StoreError> {
        let names = self.db.table_names().execute().await?;
        Ok(names)
    }

    async fn has_table(&self) -> Result<bool, StoreError> {
        Ok(self
            .table_names()
            .await?
            .iter()
            .any(|n| n == DOCUMENTS_TABLE))
    }

    async fn documents(&self, dim: i32) -> Result<lancedb::Table, StoreError> {
        if !self.has_table().await? {
            let schema = Arc::new(store::documents_schema(dim));
            self.db
                .create_empty_table(DOCUMENTS_TABLE, schema)
                .execute()
                .await?;
            info!(table = DOCUMENTS_TABLE, dim, "created LanceDB table");
        }
        let table = self.db.open_table(DOCUMENTS_TABLE).execute().await?;
        Ok(table)
    }
}

#[async_trait]
impl DocumentStore for LanceStore {
    async fn upsert(&self, id: &str, text: &str, metadata: &Metadata) -> Result<(), StoreError> {
        let vector = self.embedder.embed(text).await?;
        let dim = vector.len() as i32;
        let table = self.documents(dim).await?;

        let batch = document_batch(id, text, metadata, &vector)?;
        let schema = batch.schema();

        table.delete(&format!("id = '{}'", sql_escape(id))).await?;
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);
        table.add(Box::new(reader)).execute().await?;

        debug!(doc_id = id, "document upserted");
        Ok(())
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<RelatedItem>, StoreError> {
        if top_k == 0 || !self.has_table().await? {
            return Ok(vec![]);
        }
        let vector = self.embedder.embed(text).await?;
        let table = self.db.open_table(DOCUMENTS_TABLE).execute().await?;
        let batches: Vec<RecordBatch> = table
            .vector_search(vector.as_slice())?
            .limit(top_k)
            .execute()
            .await?
            .try_collect()
            .await?;

        let mut items = Vec::new();
        for batch in &batches {
            items.extend(related_items(batch)?);
        }
        items.truncate(top_k);
        Ok(items)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        if !self.has_table().await? {
            return Ok(0);
        }
        let table = self.db.open_table(DOCUMENTS_TABLE).execute().await?;
        let count = table.count_rows(None).await?;
        Ok(count)
    }
}

/// Build a single-row batch matching [`store::documents_schema`].
fn document_batch(
    id: &str,
    text: &str,
    metadata: &Metadata,
    vector: &[f32],
) -> Result<RecordBatch, StoreError> {
    let schema = Arc::new(store::documents_schema(vector.len() as i32));

    let mut vec_builder = FixedSizeListBuilder::new(Float32Builder::new(), vector.len() as i32);
    for &v in vector {
        vec_builder.values().append_value(v);
    }
    vec_builder.append(true);

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec![id])),
            Arc::new(StringArray::from(vec![text])),
            Arc::new(StringArray::from(vec![serde_json::to_string(metadata)?])),
            Arc::new(vec_builder.finish()),
        ],
    )?;
    Ok(batch)
}

/// Extract `(text, metadata)` rows from a search result batch.
fn related_items(batch: &RecordBatch) -> Result<Vec<RelatedItem>, StoreError> {
    let text_col = batch
        .column_by_name(store::TEXT)
        .ok_or_else(|| StoreError::Other("search result missing text column".into()))?;
    let meta_col = batch
        .column_by_name(store::METADATA)
        .ok_or_else(|| StoreError::Other("search result missing metadata column".into()))?;

    let mut items = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let text = get_string(text_col.as_ref(), row).unwrap_or_default();
        let metadata = match get_string(meta_col.as_ref(), row) {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Metadata::new(),
        };
        items.push(RelatedItem { text, metadata });
    }
    Ok(items)
}

fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}

/// Escape a string for use in SQL single-quoted literals.
fn sql_escape(s: &str) -> String {
    s.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use regcopilot_ai::mock::HashEmbedder;
    use tempfile::TempDir;

    async fn open(tmp: &TempDir) -> LanceStore {
        LanceStore::open(&tmp.path().join("lancedb"), Arc::new(HashEmbedder::new(32)))
            .await
            .unwrap()
    }

    fn meta(kind: &str) -> Metadata {
        Metadata::from([("type".to_string(), kind.to_string())])
    }

    #[tokio::test]
    async fn open_creates_empty_database() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp).await;
        assert!(store.table_names().await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.query("anything", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_then_query_returns_metadata() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp).await;
        store
            .upsert("control_C-01", "Transaction monitoring: screen payments", &meta("control"))
            .await
            .unwrap();

        let results = store.query("payments screening", 3).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "Transaction monitoring: screen payments");
        assert_eq!(results[0].metadata["type"], "control");
    }

    #[tokio::test]
    async fn upsert_replaces_existing_id() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp).await;
        store.upsert("mock_o'neil.txt", "draft", &meta("regulation")).await.unwrap();
        store.upsert("mock_o'neil.txt", "final", &meta("regulation")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reopened_store_keeps_documents() {
        let tmp = TempDir::new().unwrap();
        open(&tmp).await.upsert("policy_aml.txt", "AML policy", &meta("policy")).await.unwrap();
        assert_eq!(open(&tmp).await.count().await.unwrap(), 1);
    }

    #[test]
    fn sql_escape_doubles_quotes() {
        assert_eq!(sql_escape("o'neil"), "o''neil");
    }
}
