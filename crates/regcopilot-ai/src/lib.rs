//! AI layer: text generation over OpenAI-compatible APIs, embeddings via
//! ONNX Runtime or a hosted endpoint.

pub mod embedding;
pub mod generation;
pub mod openai;

#[cfg(feature = "onnx")]
mod embedder;
#[cfg(feature = "onnx")]
pub use embedder::OnnxEmbedder;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use embedding::{Embed, EmbedError, cosine_similarity, normalize};
pub use generation::{GenerationError, TextGenerator, validate_completion};
pub use openai::{OpenAiChat, OpenAiEmbedder};
