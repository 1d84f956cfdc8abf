//! Scripted store for stage tests: fixed query results, recorded calls.

use std::sync::Mutex;

use async_trait::async_trait;
use regcopilot_core::{Metadata, RelatedItem};

use crate::{DocumentStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpsert {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
}

pub struct RecordingStore {
    results: Vec<RelatedItem>,
    fail_queries_containing: Mutex<Vec<String>>,
    upserts: Mutex<Vec<RecordedUpsert>>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl RecordingStore {
    /// Every query returns (up to `top_k` of) `results`.
    pub fn new(results: Vec<RelatedItem>) -> Self {
        Self {
            results,
            fail_queries_containing: Mutex::new(Vec::new()),
            upserts: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn fail_queries_containing(&self, needle: impl Into<String>) {
        self.fail_queries_containing
            .lock()
            .unwrap()
            .push(needle.into());
    }

    pub fn upserts(&self) -> Vec<RecordedUpsert> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn upsert(&self, id: &str, text: &str, metadata: &Metadata) -> Result<(), StoreError> {
        let mut upserts = self.upserts.lock().unwrap();
        let record = RecordedUpsert {
            id: id.to_string(),
            text: text.to_string(),
            metadata: metadata.clone(),
        };
        match upserts.iter_mut().find(|u| u.id == id) {
            Some(existing) => *existing = record,
            None => upserts.push(record),
        }
        Ok(())
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<RelatedItem>, StoreError> {
        self.queries.lock().unwrap().push((text.to_string(), top_k));
        let fail = self
            .fail_queries_containing
            .lock()
            .unwrap()
            .iter()
            .any(|n| text.contains(n.as_str()));
        if fail {
            return Err(StoreError::Other("scripted query failure".into()));
        }
        Ok(self.results.iter().take(top_k).cloned().collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.upserts.lock().unwrap().len())
    }
}
