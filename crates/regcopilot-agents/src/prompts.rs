//! Prompt templates for the impact and action stages.

use regcopilot_core::RelatedItem;

/// Context line used when retrieval found nothing.
pub const NO_RELATED: &str = "No related policies found.";

/// Fallback impact text handed to the action stage when impact analysis failed.
pub const NO_IMPACT: &str = "No impact summary provided.";

/// Bullet list of related item texts, or [`NO_RELATED`].
pub fn render_context(items: &[RelatedItem]) -> String {
    if items.is_empty() {
        return NO_RELATED.to_string();
    }
    items
        .iter()
        .map(|item| format!("- {}", item.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn impact_prompt(regulation_text: &str, context: &str) -> String {
    format!(
        "You are a senior compliance expert at a UK bank.\n\
         Analyze how the following new regulation impacts internal policies and controls.\n\
         \n\
         Regulation:\n\
         {regulation_text}\n\
         \n\
         Related Internal Policies & Controls:\n\
         {context}\n\
         \n\
         Provide the output in three clear sections:\n\
         1. Impact Summary\n\
         2. Identified Gaps\n\
         3. Recommended Focus Areas\n"
    )
}

pub fn action_prompt(impact_text: &str) -> String {
    format!(
        "You are a senior compliance officer at a UK financial institution.\n\
         Based on the following impact analysis, propose specific, practical actions\n\
         the compliance and operations teams should take.\n\
         \n\
         Impact Analysis:\n\
         {impact_text}\n\
         \n\
         Provide output as a clear action plan with the following sections:\n\
         1. Action Item\n\
         2. Priority (High / Medium / Low)\n\
         3. Responsible Owner or Department\n\
         4. Target Completion Timeline\n\
         5. Rationale\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use regcopilot_core::Metadata;

    fn item(text: &str) -> RelatedItem {
        RelatedItem {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn context_is_bullet_joined() {
        let ctx = render_context(&[item("AML policy"), item("KYC control")]);
        assert_eq!(ctx, "- AML policy\n- KYC control");
    }

    #[test]
    fn empty_context_uses_sentinel() {
        assert_eq!(render_context(&[]), NO_RELATED);
    }

    #[test]
    fn impact_prompt_embeds_regulation_and_context() {
        let prompt = impact_prompt("New rule text", "- AML policy");
        assert!(prompt.contains("Regulation:\nNew rule text"));
        assert!(prompt.contains("Related Internal Policies & Controls:\n- AML policy"));
        assert!(prompt.contains("3. Recommended Focus Areas"));
    }

    #[test]
    fn action_prompt_requests_five_fields() {
        let prompt = action_prompt("Impact text");
        for field in [
            "1. Action Item",
            "2. Priority",
            "3. Responsible Owner",
            "4. Target Completion Timeline",
            "5. Rationale",
        ] {
            assert!(prompt.contains(field), "missing {field}");
        }
    }
}
