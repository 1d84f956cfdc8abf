//! Pipeline sequencer.
//!
//! Drives the stages in a fixed order:
//!
//! ```text
//! Ingesting -> Mapping -> AssessingImpact -> Recommending -> Done
//!     \
//!      -> HaltedEmpty   (no documents; nothing persisted)
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use regcopilot_ai::TextGenerator;
use regcopilot_core::{PipelineConfig, SummarizedDocument, WorkflowResult};
use regcopilot_sources::DocumentSource;
use regcopilot_store::{DocumentStore, PersistError, SummaryCache, write_result};
use thiserror::Error;
use tracing::{info, warn};

use crate::action::ActionAgent;
use crate::impact::ImpactAgent;
use crate::ingestion::IngestionAgent;
use crate::mapping::MappingAgent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingesting,
    Mapping,
    AssessingImpact,
    Recommending,
    Done,
    HaltedEmpty,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ingesting => "ingesting",
            Self::Mapping => "mapping",
            Self::AssessingImpact => "assessing_impact",
            Self::Recommending => "recommending",
            Self::Done => "done",
            Self::HaltedEmpty => "halted_empty",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(WorkflowResult),
    /// Ingestion produced no documents; later stages did not run.
    HaltedEmpty,
}

#[derive(Debug)]
pub struct RunReport {
    /// Every stage entered, in order, ending in a terminal stage.
    pub stages: Vec<Stage>,
    pub outcome: RunOutcome,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("writing workflow result: {0}")]
    Persist(#[from] PersistError),
}

pub struct Workflow {
    ingestion: IngestionAgent,
    mapping: MappingAgent,
    impact: ImpactAgent,
    action: ActionAgent,
    output_path: PathBuf,
}

impl Workflow {
    pub fn new(
        ingestion: IngestionAgent,
        mapping: MappingAgent,
        impact: ImpactAgent,
        action: ActionAgent,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ingestion,
            mapping,
            impact,
            action,
            output_path: output_path.into(),
        }
    }

    /// Wire every stage from `config` around the given backends.
    pub fn from_config(
        config: &PipelineConfig,
        source: Box<dyn DocumentSource>,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let cache = SummaryCache::new(&config.cache_path, config.cache_ttl());
        let ingestion = IngestionAgent::new(source, generator.clone(), store.clone(), cache)
            .with_force_refresh(config.force_refresh)
            .with_summary_max_words(config.summary_max_words);
        Self::new(
            ingestion,
            MappingAgent::new(store).with_top_k(config.mapping_top_k),
            ImpactAgent::new(generator.clone()),
            ActionAgent::new(generator),
            &config.output_path,
        )
    }

    /// Run every stage once.
    ///
    /// Per-document failures are carried inside the result. The only error
    /// is failing to write the output file.
    pub async fn run(&self) -> Result<RunReport, WorkflowError> {
        let mut stages = Vec::new();
        let mut stage = Stage::Ingesting;
        let mut docs: Vec<SummarizedDocument> = Vec::new();
        let mut mappings = Vec::new();
        let mut impacts = Vec::new();
        let mut actions = Vec::new();

        loop {
            stages.push(stage);
            info!(stage = %stage, "entering stage");
            stage = match stage {
                Stage::Ingesting => {
                    docs = self.ingestion.fetch_latest_updates().await;
                    if docs.is_empty() {
                        Stage::HaltedEmpty
                    } else {
                        Stage::Mapping
                    }
                }
                Stage::Mapping => {
                    mappings = self.mapping.map(&docs).await;
                    Stage::AssessingImpact
                }
                Stage::AssessingImpact => {
                    for mapping in &mappings {
                        impacts.push(self.impact.evaluate(mapping).await);
                    }
                    Stage::Recommending
                }
                Stage::Recommending => {
                    for impact in &impacts {
                        actions.push(self.action.recommend(impact).await);
                    }
                    Stage::Done
                }
                Stage::Done => {
                    let result = WorkflowResult {
                        generated_at: chrono::Utc::now().to_rfc3339(),
                        regulatory_updates: docs,
                        mappings,
                        impacts,
                        actions,
                    };
                    write_result(&self.output_path, &result)?;
                    info!(
                        path = %self.output_path.display(),
                        documents = result.regulatory_updates.len(),
                        failures = result.failure_count(),
                        "workflow complete"
                    );
                    return Ok(RunReport {
                        stages,
                        outcome: RunOutcome::Completed(result),
                    });
                }
                Stage::HaltedEmpty => {
                    warn!("no regulatory updates found, halting");
                    return Ok(RunReport {
                        stages,
                        outcome: RunOutcome::HaltedEmpty,
                    });
                }
            };
        }
    }
}
