//! Pipeline configuration.
//!
//! Every component receives the parts of [`PipelineConfig`] it needs at
//! construction time. The struct deserialises from TOML with every field
//! defaulted, so an empty file (or no file at all) yields a working local
//! setup.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where raw regulatory documents come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Text files in a local directory.
    #[default]
    Local,
    /// Headlines scraped from regulator web pages.
    Live,
}

impl FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "mock" => Ok(Self::Local),
            "live" => Ok(Self::Live),
            other => Err(format!("unknown source mode '{other}' (expected local or live)")),
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Live => f.write_str("live"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// OpenAI-compatible `/embeddings` endpoint.
    #[default]
    Openai,
    /// Local sentence-transformers model via ONNX Runtime.
    Onnx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process vectors, rebuilt each run.
    #[default]
    Memory,
    /// Persistent LanceDB table.
    Lance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub regulatory_dir: PathBuf,
    /// File extension (without the dot) read by the local source.
    pub extension: String,
    pub urls: Vec<String>,
    pub items_per_source: usize,
    pub fetch_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            regulatory_dir: PathBuf::from("data/regulatory_updates"),
            extension: "txt".to_string(),
            urls: vec![
                "https://www.fca.org.uk/news".to_string(),
                "https://www.bankofengland.co.uk/prudential-regulation/publication/2024/july/pra-annual-report-2023-24".to_string(),
            ],
            items_per_source: 3,
            fetch_timeout_secs: 10,
        }
    }
}

impl SourceConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Internal policy and control text loaded into the store before a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub policies_dir: PathBuf,
    pub controls_dir: PathBuf,
    /// Also register the raw regulatory files as `regulation` entries.
    pub include_regulations: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            policies_dir: PathBuf::from("data/policies"),
            controls_dir: PathBuf::from("data/controls"),
            include_regulations: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub api_base: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gpt-4o".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            temperature: 0.2,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// Remote model name for the `openai` backend.
    pub model: String,
    /// Directory with `model.onnx` and `tokenizer.json` for the `onnx` backend.
    pub model_dir: PathBuf,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Openai,
            model: "text-embedding-3-small".to_string(),
            model_dir: PathBuf::from("models/all-MiniLM-L6-v2"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            path: PathBuf::from("data/embeddings"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub mode: SourceMode,
    pub force_refresh: bool,
    pub cache_path: PathBuf,
    pub output_path: PathBuf,
    /// Maximum cache age. `None` keeps any non-empty cache indefinitely.
    pub cache_ttl_secs: Option<u64>,
    pub summary_max_words: usize,
    pub mapping_top_k: usize,
    pub sources: SourceConfig,
    pub corpus: CorpusConfig,
    pub model: ModelConfig,
    pub embedding: EmbeddingConfig,
    pub store: StoreConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::Local,
            force_refresh: false,
            cache_path: PathBuf::from("data/output/summarized_regulations.json"),
            output_path: PathBuf::from("data/output/compliance_analysis.json"),
            cache_ttl_secs: None,
            summary_max_words: 250,
            mapping_top_k: 5,
            sources: SourceConfig::default(),
            corpus: CorpusConfig::default(),
            model: ModelConfig::default(),
            embedding: EmbeddingConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), "loaded pipeline config");
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mapping_top_k == 0 {
            return Err(ConfigError::Invalid("mapping_top_k must be at least 1".into()));
        }
        if self.summary_max_words == 0 {
            return Err(ConfigError::Invalid(
                "summary_max_words must be at least 1".into(),
            ));
        }
        if self.mode == SourceMode::Live && self.sources.urls.is_empty() {
            return Err(ConfigError::Invalid(
                "live mode needs at least one entry in sources.urls".into(),
            ));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}
