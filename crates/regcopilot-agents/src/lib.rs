//! Pipeline stages and the sequencer that runs them.
//!
//! Each stage owns the backends it needs behind trait objects
//! ([`TextGenerator`](regcopilot_ai::TextGenerator),
//! [`DocumentStore`](regcopilot_store::DocumentStore),
//! [`DocumentSource`](regcopilot_sources::DocumentSource)). Stages never
//! return per-document errors: failures are recorded in the output as
//! [`Outcome::Failed`](regcopilot_core::Outcome) so every document stays
//! aligned across stages.

pub mod action;
pub mod corpus;
pub mod impact;
pub mod ingestion;
pub mod mapping;
pub mod prompts;
pub mod workflow;

pub use action::ActionAgent;
pub use corpus::{SeedReport, seed_corpus};
pub use impact::ImpactAgent;
pub use ingestion::IngestionAgent;
pub use mapping::MappingAgent;
pub use workflow::{RunOutcome, RunReport, Stage, Workflow, WorkflowError};
