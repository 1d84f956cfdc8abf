//! Text cards for a persisted workflow result.
//!
//! Each view renders one card per document, grouped into labelled sections,
//! in the same order as the result's sequences.

use std::fmt::Write;

use clap::ValueEnum;
use regcopilot_core::document::{ACTION_PLACEHOLDER, IMPACT_PLACEHOLDER, SUMMARY_PLACEHOLDER};
use regcopilot_core::{Outcome, WorkflowResult};

const MAX_LIST_ITEMS: usize = 10;
const SNIPPET_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    All,
    Updates,
    Mappings,
    Impacts,
    Actions,
}

// ── Public API ──

pub fn render(result: &WorkflowResult, view: View) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Generated {}", result.generated_at);
    let _ = writeln!(out);

    if matches!(view, View::All | View::Updates) {
        render_updates(&mut out, result);
    }
    if matches!(view, View::All | View::Mappings) {
        render_mappings(&mut out, result);
    }
    if matches!(view, View::All | View::Impacts) {
        render_impacts(&mut out, result);
    }
    if matches!(view, View::All | View::Actions) {
        render_actions(&mut out, result);
    }
    out
}

// ── Views ──

fn render_updates(out: &mut String, result: &WorkflowResult) {
    let _ = writeln!(out, "Regulatory Updates ({})", result.regulatory_updates.len());
    for doc in &result.regulatory_updates {
        let _ = writeln!(out, "=== {} ===", doc.regulation_title);
        field(out, "id", &doc.id);
        field(out, "source", &doc.source);
        outcome(out, "summary", &doc.regulation_text, SUMMARY_PLACEHOLDER);
        let _ = writeln!(out);
    }
}

fn render_mappings(out: &mut String, result: &WorkflowResult) {
    let _ = writeln!(out, "Policy Mappings ({})", result.mappings.len());
    for mapping in &result.mappings {
        let _ = writeln!(out, "=== {} ===", mapping.regulation_title);
        field(out, "regulation", &snippet(&mapping.regulation_text));
        if let Some(err) = &mapping.retrieval_error {
            field(out, "retrieval error", err);
        }

        let related = &mapping.related_policies_controls;
        if related.is_empty() {
            field(out, "related", "(none)");
        } else {
            let _ = writeln!(out, "  related ({}):", related.len());
            for item in related.iter().take(MAX_LIST_ITEMS) {
                let kind = item.metadata.get("type").map(String::as_str).unwrap_or("-");
                let _ = writeln!(out, "    [{kind}] {}", snippet(&item.text));
            }
            if related.len() > MAX_LIST_ITEMS {
                let _ = writeln!(out, "    ... and {} more", related.len() - MAX_LIST_ITEMS);
            }
        }
        let _ = writeln!(out);
    }
}

fn render_impacts(out: &mut String, result: &WorkflowResult) {
    let _ = writeln!(out, "Impact Analysis ({})", result.impacts.len());
    for impact in &result.impacts {
        let _ = writeln!(out, "=== {} ===", impact.regulation_title);
        outcome(out, "impact", &impact.impact_analysis, IMPACT_PLACEHOLDER);
        let _ = writeln!(out);
    }
}

fn render_actions(out: &mut String, result: &WorkflowResult) {
    let _ = writeln!(out, "Recommended Actions ({})", result.actions.len());
    for plan in &result.actions {
        let _ = writeln!(out, "=== {} ===", plan.regulation_title);
        outcome(out, "actions", &plan.recommended_actions, ACTION_PLACEHOLDER);
        let _ = writeln!(out);
    }
}

// ── Helpers ──

fn field(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "  {label:<26} {value}");
}

/// Multi-line generated text is indented under its label; failures show the
/// placeholder followed by the reason.
fn outcome(out: &mut String, label: &str, outcome: &Outcome, placeholder: &str) {
    match outcome {
        Outcome::Ok { text } => {
            let _ = writeln!(out, "  {label}:");
            for line in text.lines() {
                let _ = writeln!(out, "    {line}");
            }
        }
        Outcome::Failed { reason } => {
            field(out, label, placeholder);
            field(out, "reason", reason);
        }
    }
}

fn snippet(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > SNIPPET_CHARS {
        let cut: String = flat.chars().take(SNIPPET_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regcopilot_core::{
        ActionPlan, ImpactSummary, Mapping, Metadata, RelatedItem, SummarizedDocument,
    };

    fn result() -> WorkflowResult {
        WorkflowResult {
            generated_at: "2026-01-01T00:00:00+00:00".into(),
            regulatory_updates: vec![SummarizedDocument {
                id: "mock_RegA.txt".into(),
                regulation_title: "RegA".into(),
                regulation_text: Outcome::ok("Short summary."),
                title: "RegA".into(),
                content: "Short summary.".into(),
                source: "local".into(),
            }],
            mappings: vec![Mapping {
                regulation_title: "RegA".into(),
                regulation_text: "Short summary.".into(),
                related_policies_controls: vec![RelatedItem {
                    text: "AML policy".into(),
                    metadata: Metadata::from([("type".to_string(), "policy".to_string())]),
                }],
                retrieval_error: None,
            }],
            impacts: vec![ImpactSummary {
                regulation_title: "RegA".into(),
                impact_analysis: Outcome::failed("model returned an empty response"),
            }],
            actions: vec![ActionPlan {
                regulation_title: "RegA".into(),
                recommended_actions: Outcome::ok("1. Action Item\n2. Priority: High"),
            }],
        }
    }

    #[test]
    fn all_view_has_every_section() {
        let text = render(&result(), View::All);
        assert!(text.contains("Regulatory Updates (1)"));
        assert!(text.contains("Policy Mappings (1)"));
        assert!(text.contains("[policy] AML policy"));
        assert!(text.contains("Recommended Actions (1)"));
        assert!(text.contains("    2. Priority: High"));
    }

    #[test]
    fn failed_outcome_shows_placeholder_and_reason() {
        let text = render(&result(), View::Impacts);
        assert!(text.contains(IMPACT_PLACEHOLDER));
        assert!(text.contains("model returned an empty response"));
        assert!(!text.contains("Regulatory Updates"));
    }

    #[test]
    fn long_text_is_truncated() {
        let long = "word ".repeat(100);
        let s = snippet(&long);
        assert_eq!(s.chars().count(), SNIPPET_CHARS);
        assert!(s.ends_with("..."));
    }
}
