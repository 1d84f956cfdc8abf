//! Builds the concrete generator, embedder, store and source a config asks for.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use regcopilot_ai::{Embed, OpenAiChat, OpenAiEmbedder, TextGenerator};
use regcopilot_core::{EmbeddingBackend, PipelineConfig, SourceMode, StoreBackend};
use regcopilot_sources::{DocumentSource, LocalSource};
use regcopilot_store::{DocumentStore, MemoryStore};
use tracing::info;

pub fn generator(
    config: &PipelineConfig,
    api_key: Option<String>,
) -> anyhow::Result<Arc<dyn TextGenerator>> {
    let chat = OpenAiChat::new(&config.model, api_key).context("building chat client")?;
    info!(model = chat.model(), "using chat model");
    Ok(Arc::new(chat))
}

pub fn embedder(
    config: &PipelineConfig,
    api_key: Option<String>,
) -> anyhow::Result<Arc<dyn Embed>> {
    match config.embedding.backend {
        EmbeddingBackend::Openai => {
            let embedder = OpenAiEmbedder::new(
                &config.model.api_base,
                &config.embedding.model,
                api_key,
                Duration::from_secs(config.model.timeout_secs),
            )
            .context("building embeddings client")?;
            Ok(Arc::new(embedder))
        }
        #[cfg(feature = "onnx")]
        EmbeddingBackend::Onnx => {
            let embedder = regcopilot_ai::OnnxEmbedder::load(&config.embedding.model_dir)
                .with_context(|| {
                    format!("loading ONNX model from {}", config.embedding.model_dir.display())
                })?;
            Ok(Arc::new(embedder))
        }
        #[cfg(not(feature = "onnx"))]
        EmbeddingBackend::Onnx => {
            anyhow::bail!("embedding backend 'onnx' needs the `onnx` feature")
        }
    }
}

pub async fn store(
    config: &PipelineConfig,
    embedder: Arc<dyn Embed>,
) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.store.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new(embedder))),
        #[cfg(feature = "lancedb")]
        StoreBackend::Lance => {
            let store = regcopilot_store::LanceStore::open(&config.store.path, embedder)
                .await
                .with_context(|| format!("opening LanceDB at {}", config.store.path.display()))?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "lancedb"))]
        StoreBackend::Lance => anyhow::bail!("store backend 'lance' needs the `lancedb` feature"),
    }
}

pub fn source(config: &PipelineConfig) -> anyhow::Result<Box<dyn DocumentSource>> {
    match config.mode {
        SourceMode::Local => Ok(Box::new(LocalSource::new(
            &config.sources.regulatory_dir,
            config.sources.extension.as_str(),
        ))),
        #[cfg(feature = "http")]
        SourceMode::Live => {
            let source = regcopilot_sources::WebSource::new(
                config.sources.urls.clone(),
                config.sources.items_per_source,
                config.sources.fetch_timeout(),
            )
            .context("building live source")?;
            Ok(Box::new(source))
        }
        #[cfg(not(feature = "http"))]
        SourceMode::Live => anyhow::bail!("live mode needs the `http` feature"),
    }
}
