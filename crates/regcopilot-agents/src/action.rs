//! Action stage: one remediation plan per impact.

use std::sync::Arc;

use regcopilot_ai::{TextGenerator, validate_completion};
use regcopilot_core::{ActionPlan, ImpactSummary, Outcome};
use tracing::warn;

use crate::prompts::{NO_IMPACT, action_prompt};

pub struct ActionAgent {
    generator: Arc<dyn TextGenerator>,
}

impl ActionAgent {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn recommend(&self, impact: &ImpactSummary) -> ActionPlan {
        let impact_text = impact.impact_analysis.text().unwrap_or(NO_IMPACT);
        let prompt = action_prompt(impact_text);

        let recommended_actions = match self
            .generator
            .generate(&prompt)
            .await
            .and_then(validate_completion)
        {
            Ok(text) => Outcome::ok(text),
            Err(e) => {
                warn!(regulation = %impact.regulation_title, error = %e, "action plan failed");
                Outcome::failed(e.to_string())
            }
        };
        ActionPlan {
            regulation_title: impact.regulation_title.clone(),
            recommended_actions,
        }
    }
}
