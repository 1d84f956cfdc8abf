//! Deterministic test doubles for the generation and embedding boundaries.
//!
//! Enabled with the `test-utils` feature so downstream crates can exercise
//! their stages without API keys or network access.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::embedding::{Embed, EmbedError, normalize};
use crate::generation::{GenerationError, TextGenerator};

/// Which generator entry point a call came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockCallKind {
    Summarize,
    Generate,
}

#[derive(Debug, Clone)]
pub struct MockCall {
    pub kind: MockCallKind,
    /// Raw text for summaries, full prompt for generation.
    pub input: String,
}

/// How a matching call should misbehave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Return a transport-level error.
    Error,
    /// Return an empty completion.
    Empty,
    /// Return the legacy `Error:` sentinel as the completion.
    Flagged,
}

/// Generator that returns a fixed response and records every call.
pub struct MockGenerator {
    default_response: String,
    responses: Mutex<Vec<(String, String)>>,
    failures: Mutex<Vec<(String, MockFailure)>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockGenerator {
    pub fn new(default_response: impl Into<String>) -> Self {
        Self {
            default_response: default_response.into(),
            responses: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Respond with `response` when the input contains `needle`.
    pub fn respond_when_contains(&self, needle: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push((needle.into(), response.into()));
    }

    /// Fail in the given way when the input contains `needle`.
    pub fn fail_when_contains(&self, needle: impl Into<String>, failure: MockFailure) {
        self.failures.lock().unwrap().push((needle.into(), failure));
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, kind: MockCallKind) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.kind == kind)
            .count()
    }

    fn respond(&self, kind: MockCallKind, input: &str) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(MockCall {
            kind,
            input: input.to_string(),
        });

        let failure = self
            .failures
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| input.contains(needle.as_str()))
            .map(|(_, f)| *f);
        match failure {
            Some(MockFailure::Error) => {
                return Err(GenerationError::Api {
                    status: 500,
                    body: "mock failure".into(),
                });
            }
            Some(MockFailure::Empty) => return Ok(String::new()),
            Some(MockFailure::Flagged) => return Ok("Error: LLM request failed.".into()),
            None => {}
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| input.contains(needle.as_str()))
            .map(|(_, r)| r.clone());
        Ok(response.unwrap_or_else(|| self.default_response.clone()))
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.respond(MockCallKind::Generate, prompt)
    }

    async fn summarize(&self, text: &str, _max_words: usize) -> Result<String, GenerationError> {
        self.respond(MockCallKind::Summarize, text)
    }
}

/// Bag-of-words hashing embedder: texts sharing words land close together.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }
}

#[async_trait]
impl Embed for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash-bow"
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; self.dim];
                for word in text
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|w| w.len() > 2)
                {
                    let mut hasher = DefaultHasher::new();
                    word.to_lowercase().hash(&mut hasher);
                    v[(hasher.finish() % self.dim as u64) as usize] += 1.0;
                }
                normalize(&mut v);
                v
            })
            .collect())
    }
}
