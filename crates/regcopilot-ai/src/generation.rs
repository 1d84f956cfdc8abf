//! Text generation boundary.
//!
//! Stages depend on [`TextGenerator`] only; the OpenAI client and the test
//! mock are interchangeable behind it.

use async_trait::async_trait;
use thiserror::Error;

/// Prefix of the error sentinel older clients returned in place of a
/// completion. A response starting with it is treated as a failure.
pub const ERROR_SENTINEL: &str = "Error:";

/// Failure message older clients embedded in otherwise normal text.
pub const LEGACY_FAILURE: &str = "Error: LLM request failed";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("no API key configured (set OPENAI_API_KEY)")]
    MissingApiKey,
    #[error("model returned an empty response")]
    Empty,
    #[error("model returned an error-flagged response: {0}")]
    Flagged(String),
    #[error("malformed model response: {0}")]
    Malformed(String),
}

/// A hosted or local text-generation capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for a single-turn prompt.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Summarise `text` for compliance officers in at most `max_words` words.
    async fn summarize(&self, text: &str, max_words: usize) -> Result<String, GenerationError> {
        self.generate(&summary_prompt(text, max_words)).await
    }
}

pub fn summary_prompt(text: &str, max_words: usize) -> String {
    format!("Summarize this document for compliance officers (max {max_words} words):\n\n{text}")
}

/// Reject blank and error-flagged completions, returning the trimmed text.
///
/// A completion is flagged when it starts with [`ERROR_SENTINEL`] or carries
/// [`LEGACY_FAILURE`] anywhere. Ordinary prose mentioning errors passes.
pub fn validate_completion(text: String) -> Result<String, GenerationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::Empty);
    }
    if trimmed.starts_with(ERROR_SENTINEL) || trimmed.contains(LEGACY_FAILURE) {
        let preview: String = trimmed.chars().take(200).collect();
        return Err(GenerationError::Flagged(preview));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_response_is_empty() {
        assert!(matches!(
            validate_completion("  \n ".into()),
            Err(GenerationError::Empty)
        ));
    }

    #[test]
    fn sentinel_response_is_flagged() {
        assert!(matches!(
            validate_completion("Error: LLM request failed.".into()),
            Err(GenerationError::Flagged(_))
        ));
    }

    #[test]
    fn sentinel_after_preamble_is_flagged() {
        let text = "Here is the analysis you asked for.\nError: LLM request failed.";
        assert!(matches!(
            validate_completion(text.into()),
            Err(GenerationError::Flagged(_))
        ));
    }

    #[test]
    fn mention_of_error_is_not_flagged() {
        let text = "1. Impact Summary\nReporting errors must be corrected within 5 days.";
        assert_eq!(validate_completion(text.into()).unwrap(), text);
    }

    #[test]
    fn completion_is_trimmed() {
        assert_eq!(validate_completion("  ok \n".into()).unwrap(), "ok");
    }

    #[test]
    fn summary_prompt_carries_word_limit() {
        let prompt = summary_prompt("Body text", 250);
        assert!(prompt.contains("max 250 words"));
        assert!(prompt.ends_with("Body text"));
    }
}
