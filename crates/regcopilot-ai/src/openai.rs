//! OpenAI-compatible HTTP clients for chat completions and embeddings.

use std::time::Duration;

use async_trait::async_trait;
use regcopilot_core::ModelConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embedding::{Embed, EmbedError, normalize};
use crate::generation::{GenerationError, TextGenerator};

const EMBED_BATCH_SIZE: usize = 64;

/// Chat-completions client for OpenAI or any server exposing the same API.
pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiChat {
    /// Build a client from model settings.
    ///
    /// A missing key is not an error here; every request then fails with
    /// [`GenerationError::MissingApiKey`].
    pub fn new(config: &ModelConfig, api_key: Option<String>) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!("no OPENAI_API_KEY found; generation requests will fail");
        }
        info!(model = %config.name, base_url = %config.api_base, "initialised chat client");
        Ok(Self {
            client,
            api_key,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            model: config.name.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenAiChat {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingApiKey)?;
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(url = %url, prompt_chars = prompt.len(), "sending chat completion");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::Malformed("no choices in response".into()))?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

/// Embedding client for an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EmbedError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    async fn embed_chunk(
        &self,
        api_key: &str,
        texts: &[&str],
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        let url = format!("{}/embeddings", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EmbedError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let mut parsed: EmbeddingResponse = resp.json().await?;
        if parsed.data.len() != texts.len() {
            return Err(EmbedError::Shape(format!(
                "sent {} inputs, received {} embeddings",
                texts.len(),
                parsed.data.len()
            )));
        }
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed
            .data
            .into_iter()
            .map(|d| {
                let mut v = d.embedding;
                normalize(&mut v);
                v
            })
            .collect())
    }
}

#[async_trait]
impl Embed for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let api_key = self.api_key.as_deref().ok_or(EmbedError::MissingApiKey)?;
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(EMBED_BATCH_SIZE) {
            out.extend(self.embed_chunk(api_key, chunk).await?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn model_config(base: String) -> ModelConfig {
        ModelConfig {
            name: "gpt-4o".into(),
            api_base: base,
            temperature: 0.2,
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn chat_returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"choices":[{"message":{"role":"assistant","content":"1. Impact Summary"}}]}"#,
            ))
            .mount(&server)
            .await;

        let chat = OpenAiChat::new(&model_config(server.uri()), Some("sk-test".into())).unwrap();
        let text = chat.generate("Analyse this").await.unwrap();
        assert_eq!(text, "1. Impact Summary");
    }

    #[tokio::test]
    async fn chat_surfaces_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let chat = OpenAiChat::new(&model_config(server.uri()), Some("sk-test".into())).unwrap();
        let err = chat.generate("hi").await.unwrap_err();
        match err {
            GenerationError::Api { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn chat_without_choices_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"choices":[]}"#))
            .mount(&server)
            .await;

        let chat = OpenAiChat::new(&model_config(server.uri()), Some("sk-test".into())).unwrap();
        assert!(matches!(
            chat.generate("hi").await,
            Err(GenerationError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn chat_without_key_fails_fast() {
        let chat = OpenAiChat::new(&model_config("http://127.0.0.1:9".into()), None).unwrap();
        assert!(matches!(
            chat.generate("hi").await,
            Err(GenerationError::MissingApiKey)
        ));
    }

    #[test]
    fn chat_trims_trailing_slash() {
        let chat =
            OpenAiChat::new(&model_config("http://localhost:8080/v1/".into()), None).unwrap();
        assert_eq!(chat.base_url, "http://localhost:8080/v1");
    }

    #[tokio::test]
    async fn embeddings_are_reordered_and_normalised() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"data":[
                    {"index":1,"embedding":[0.0,2.0]},
                    {"index":0,"embedding":[3.0,4.0]}
                ]}"#,
            ))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(
            &server.uri(),
            "text-embedding-3-small",
            Some("sk-test".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        let vectors = embedder.embed_batch(&["a", "b"]).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert!((vectors[0][0] - 0.6).abs() < 1e-6);
        assert!((vectors[1][1] - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn embeddings_count_mismatch_is_shape_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"data":[{"index":0,"embedding":[1.0]}]}"#),
            )
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(
            &server.uri(),
            "m",
            Some("sk-test".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(matches!(
            embedder.embed_batch(&["a", "b"]).await,
            Err(EmbedError::Shape(_))
        ));
    }
}
