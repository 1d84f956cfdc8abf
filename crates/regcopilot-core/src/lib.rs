pub mod config;
pub mod document;
pub mod schema;

pub use config::{
    ConfigError, CorpusConfig, EmbeddingBackend, EmbeddingConfig, ModelConfig, PipelineConfig,
    SourceConfig, SourceMode, StoreBackend, StoreConfig,
};
pub use document::{
    ActionPlan, ImpactSummary, Mapping, Metadata, Outcome, RawDocument, RelatedItem,
    SummarizedDocument, WorkflowResult,
};
pub use schema::store;
