//! Mapping stage: nearest internal policies and controls per regulation.

use std::sync::Arc;

use regcopilot_core::{Mapping, SummarizedDocument};
use regcopilot_store::DocumentStore;
use tracing::{info, warn};

pub const DEFAULT_TOP_K: usize = 5;

pub fn mapping_query(title: &str, content: &str) -> String {
    format!("Find internal policies and controls related to this regulation: {title}\n\n{content}")
}

pub struct MappingAgent {
    store: Arc<dyn DocumentStore>,
    top_k: usize,
}

impl MappingAgent {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// One mapping per document, in input order.
    ///
    /// A failed query leaves that mapping with no related items and records
    /// the error instead of dropping the document.
    pub async fn map(&self, docs: &[SummarizedDocument]) -> Vec<Mapping> {
        let mut mappings = Vec::with_capacity(docs.len());
        for doc in docs {
            let query = mapping_query(&doc.regulation_title, &doc.content);
            let (related, retrieval_error) = match self.store.query(&query, self.top_k).await {
                Ok(items) => (items, None),
                Err(e) => {
                    warn!(doc_id = %doc.id, error = %e, "retrieval failed");
                    (Vec::new(), Some(e.to_string()))
                }
            };
            info!(doc_id = %doc.id, count = related.len(), "mapped regulation");
            mappings.push(Mapping {
                regulation_title: doc.regulation_title.clone(),
                regulation_text: doc.content.clone(),
                related_policies_controls: related,
                retrieval_error,
            });
        }
        mappings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regcopilot_core::{Metadata, Outcome, RelatedItem};
    use regcopilot_store::recording::RecordingStore;

    fn doc(title: &str) -> SummarizedDocument {
        SummarizedDocument {
            id: format!("mock_{title}.txt"),
            regulation_title: title.into(),
            regulation_text: Outcome::ok(format!("{title} summary")),
            title: title.into(),
            content: format!("{title} summary"),
            source: "local".into(),
        }
    }

    fn items(n: usize) -> Vec<RelatedItem> {
        (0..n)
            .map(|i| RelatedItem {
                text: format!("policy {i}"),
                metadata: Metadata::from([("type".to_string(), "policy".to_string())]),
            })
            .collect()
    }

    #[tokio::test]
    async fn query_carries_title_and_content_with_top_k() {
        let store = Arc::new(RecordingStore::new(items(3)));
        let agent = MappingAgent::new(store.clone()).with_top_k(2);
        let mappings = agent.map(&[doc("RegA")]).await;

        assert_eq!(mappings[0].related_policies_controls.len(), 2);
        assert_eq!(mappings[0].regulation_text, "RegA summary");
        let (query, top_k) = &store.queries()[0];
        assert_eq!(
            query,
            "Find internal policies and controls related to this regulation: RegA\n\nRegA summary"
        );
        assert_eq!(*top_k, 2);
    }

    #[tokio::test]
    async fn failed_query_keeps_document_aligned() {
        let store = Arc::new(RecordingStore::new(items(1)));
        store.fail_queries_containing("RegB");
        let mappings = MappingAgent::new(store).map(&[doc("RegA"), doc("RegB")]).await;

        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[1].regulation_title, "RegB");
        assert!(mappings[1].related_policies_controls.is_empty());
        assert!(mappings[1].retrieval_error.is_some());
        assert!(mappings[0].retrieval_error.is_none());
    }
}
