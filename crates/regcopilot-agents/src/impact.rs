//! Impact stage: one analysis per mapping.

use std::sync::Arc;

use regcopilot_ai::{TextGenerator, validate_completion};
use regcopilot_core::{ImpactSummary, Mapping, Outcome};
use tracing::{debug, warn};

use crate::prompts::{impact_prompt, render_context};

pub struct ImpactAgent {
    generator: Arc<dyn TextGenerator>,
}

impl ImpactAgent {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Exactly one generation request; failures become a `Failed` outcome.
    pub async fn evaluate(&self, mapping: &Mapping) -> ImpactSummary {
        let context = render_context(&mapping.related_policies_controls);
        let prompt = impact_prompt(&mapping.regulation_text, &context);
        debug!(regulation = %mapping.regulation_title, prompt_len = prompt.len(), "impact prompt");

        let impact_analysis = match self
            .generator
            .generate(&prompt)
            .await
            .and_then(validate_completion)
        {
            Ok(text) => Outcome::ok(text),
            Err(e) => {
                warn!(regulation = %mapping.regulation_title, error = %e, "impact analysis failed");
                Outcome::failed(e.to_string())
            }
        };
        ImpactSummary {
            regulation_title: mapping.regulation_title.clone(),
            impact_analysis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regcopilot_ai::mock::{MockCallKind, MockFailure, MockGenerator};
    use regcopilot_core::{Metadata, RelatedItem};

    fn mapping(related: Vec<&str>) -> Mapping {
        Mapping {
            regulation_title: "RegA".into(),
            regulation_text: "Firms must screen payments.".into(),
            related_policies_controls: related
                .into_iter()
                .map(|t| RelatedItem {
                    text: t.into(),
                    metadata: Metadata::new(),
                })
                .collect(),
            retrieval_error: None,
        }
    }

    #[tokio::test]
    async fn prompt_lists_related_items() {
        let generator = Arc::new(MockGenerator::new("1. Impact Summary\nModerate."));
        let impact = ImpactAgent::new(generator.clone())
            .evaluate(&mapping(vec!["AML policy", "Sanctions control"]))
            .await;

        assert_eq!(impact.regulation_title, "RegA");
        assert_eq!(impact.impact_analysis.text(), Some("1. Impact Summary\nModerate."));
        assert_eq!(generator.count(MockCallKind::Generate), 1);
        let prompt = &generator.calls()[0].input;
        assert!(prompt.contains("Firms must screen payments."));
        assert!(prompt.contains("- AML policy\n- Sanctions control"));
    }

    #[tokio::test]
    async fn empty_mapping_still_produces_one_request() {
        let generator = Arc::new(MockGenerator::new("analysis"));
        ImpactAgent::new(generator.clone()).evaluate(&mapping(vec![])).await;

        assert_eq!(generator.count(MockCallKind::Generate), 1);
        assert!(generator.calls()[0].input.contains("No related policies found."));
    }

    #[tokio::test]
    async fn generation_error_becomes_failed_outcome() {
        let generator = Arc::new(MockGenerator::new("analysis"));
        generator.fail_when_contains("screen payments", MockFailure::Error);
        let impact = ImpactAgent::new(generator).evaluate(&mapping(vec![])).await;

        assert!(!impact.impact_analysis.is_ok());
        assert_eq!(impact.regulation_title, "RegA");
    }
}
