//! Pipeline data model shared by every stage.
//!
//! All entities are created fresh on each run and never mutated afterwards.
//! Generated text is carried as an [`Outcome`] so consumers can tell model
//! output apart from failure placeholders without string matching.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// String-to-string metadata attached to stored and retrieved text.
pub type Metadata = BTreeMap<String, String>;

pub const SUMMARY_PLACEHOLDER: &str = "Error summarizing document.";
pub const IMPACT_PLACEHOLDER: &str = "Error generating impact summary.";
pub const ACTION_PLACEHOLDER: &str = "Error generating recommendations.";

/// Result of a single generation step, tagged so failures survive into the
/// persisted output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok { text: String },
    Failed { reason: String },
}

impl Outcome {
    pub fn ok(text: impl Into<String>) -> Self {
        Self::Ok { text: text.into() }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// The generated text, if generation succeeded.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Ok { text } => Some(text),
            Self::Failed { .. } => None,
        }
    }

    /// Text for display: the generated text, or `placeholder` on failure.
    pub fn display_text<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.text().unwrap_or(placeholder)
    }
}

/// A regulatory document as produced by a source, before summarisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source: String,
}

/// A regulatory document after summarisation.
///
/// Persisted as a JSON array in the summary cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizedDocument {
    pub id: String,
    pub regulation_title: String,
    /// The model summary, or the reason summarisation failed.
    pub regulation_text: Outcome,
    pub title: String,
    /// Summary text on success, raw document content otherwise.
    pub content: String,
    pub source: String,
}

impl SummarizedDocument {
    /// Build from a raw document and the summarisation outcome.
    pub fn from_raw(raw: RawDocument, summary: Outcome) -> Self {
        let content = match &summary {
            Outcome::Ok { text } => text.clone(),
            Outcome::Failed { .. } => raw.content,
        };
        Self {
            id: raw.id,
            regulation_title: raw.title.clone(),
            regulation_text: summary,
            title: raw.title,
            content,
            source: raw.source,
        }
    }
}

/// A stored item returned by a nearest-neighbour query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedItem {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A regulation with the internal policies and controls related to it,
/// ordered by descending similarity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub regulation_title: String,
    pub regulation_text: String,
    pub related_policies_controls: Vec<RelatedItem>,
    /// Set when the store query failed and the related items were dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub regulation_title: String,
    pub impact_analysis: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub regulation_title: String,
    pub recommended_actions: Outcome,
}

/// Aggregate output of a completed pipeline run.
///
/// The four sequences are index-aligned by originating document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    /// RFC 3339 timestamp of when the result was assembled.
    pub generated_at: String,
    pub regulatory_updates: Vec<SummarizedDocument>,
    pub mappings: Vec<Mapping>,
    pub impacts: Vec<ImpactSummary>,
    pub actions: Vec<ActionPlan>,
}

impl WorkflowResult {
    /// `mappings`, `impacts` and `actions` have equal length, no greater than
    /// the number of regulatory updates.
    pub fn is_aligned(&self) -> bool {
        self.mappings.len() == self.impacts.len()
            && self.impacts.len() == self.actions.len()
            && self.mappings.len() <= self.regulatory_updates.len()
    }

    /// Number of generation steps (summary, impact, action) that failed.
    pub fn failure_count(&self) -> usize {
        let summaries = self
            .regulatory_updates
            .iter()
            .filter(|d| !d.regulation_text.is_ok())
            .count();
        let impacts = self
            .impacts
            .iter()
            .filter(|i| !i.impact_analysis.is_ok())
            .count();
        let actions = self
            .actions
            .iter()
            .filter(|a| !a.recommended_actions.is_ok())
            .count();
        summaries + impacts + actions
    }
}
