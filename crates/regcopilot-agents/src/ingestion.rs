//! Ingestion stage: fetch, summarise, register, cache.

use std::sync::Arc;

use regcopilot_ai::{TextGenerator, validate_completion};
use regcopilot_core::{Metadata, Outcome, RawDocument, SummarizedDocument};
use regcopilot_sources::DocumentSource;
use regcopilot_store::{DocumentStore, SummaryCache};
use tracing::{error, info, warn};

pub const DEFAULT_SUMMARY_WORDS: usize = 250;

pub struct IngestionAgent {
    source: Box<dyn DocumentSource>,
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn DocumentStore>,
    cache: SummaryCache,
    force_refresh: bool,
    summary_max_words: usize,
}

impl IngestionAgent {
    pub fn new(
        source: Box<dyn DocumentSource>,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn DocumentStore>,
        cache: SummaryCache,
    ) -> Self {
        Self {
            source,
            generator,
            store,
            cache,
            force_refresh: false,
            summary_max_words: DEFAULT_SUMMARY_WORDS,
        }
    }

    /// Ignore any cached summaries and always fetch from the source.
    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    pub fn with_summary_max_words(mut self, words: usize) -> Self {
        self.summary_max_words = words;
        self
    }

    /// Current batch of summarised regulatory documents.
    ///
    /// A valid cache short-circuits everything else. Otherwise every fetched
    /// document yields exactly one entry, in source order, whether or not
    /// its summary succeeded. Empty only when the source produced nothing.
    pub async fn fetch_latest_updates(&self) -> Vec<SummarizedDocument> {
        if !self.force_refresh {
            match self.cache.load() {
                Ok(Some(docs)) => {
                    info!(
                        count = docs.len(),
                        path = %self.cache.path().display(),
                        "using cached summaries"
                    );
                    return docs;
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "ignoring unreadable summary cache"),
            }
        }

        let raw = match self.source.fetch().await {
            Ok(raw) => raw,
            Err(e) => {
                error!(source = self.source.name(), error = %e, "document source failed");
                Vec::new()
            }
        };
        if raw.is_empty() {
            warn!(source = self.source.name(), "no regulatory documents found");
            return Vec::new();
        }
        info!(count = raw.len(), source = self.source.name(), "summarising documents");

        let mut docs = Vec::with_capacity(raw.len());
        for doc in raw {
            let summary = self.summarize(&doc).await;
            let doc = SummarizedDocument::from_raw(doc, summary);
            self.register(&doc).await;
            docs.push(doc);
        }

        if let Err(e) = self.cache.save(&docs) {
            error!(error = %e, "failed to write summary cache");
        }
        docs
    }

    async fn summarize(&self, doc: &RawDocument) -> Outcome {
        let text = if doc.content.trim().is_empty() {
            &doc.title
        } else {
            &doc.content
        };
        match self
            .generator
            .summarize(text, self.summary_max_words)
            .await
            .and_then(validate_completion)
        {
            Ok(summary) => Outcome::ok(summary),
            Err(e) => {
                warn!(doc_id = %doc.id, error = %e, "summarisation failed");
                Outcome::failed(e.to_string())
            }
        }
    }

    async fn register(&self, doc: &SummarizedDocument) {
        let metadata = Metadata::from([
            ("source".to_string(), doc.source.clone()),
            ("type".to_string(), "regulation".to_string()),
        ]);
        if let Err(e) = self.store.upsert(&doc.id, &doc.content, &metadata).await {
            error!(doc_id = %doc.id, error = %e, "failed to register document");
        }
    }
}
