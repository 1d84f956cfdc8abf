//! The workflow result file read by the presentation layer.

use std::path::Path;

use regcopilot_core::WorkflowResult;
use tracing::info;

use crate::PersistError;
use crate::json_file::{read_json, write_json};

/// Overwrite `path` with the complete result of a run.
pub fn write_result(path: &Path, result: &WorkflowResult) -> Result<(), PersistError> {
    write_json(path, result)?;
    info!(
        path = %path.display(),
        updates = result.regulatory_updates.len(),
        "saved workflow result"
    );
    Ok(())
}

pub fn read_result(path: &Path) -> Result<WorkflowResult, PersistError> {
    read_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regcopilot_core::{ActionPlan, ImpactSummary, Mapping, Outcome, RelatedItem};
    use tempfile::TempDir;

    #[test]
    fn result_file_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("compliance_analysis.json");
        let result = WorkflowResult {
            generated_at: "2026-10-14T09:00:00Z".into(),
            regulatory_updates: vec![],
            mappings: vec![Mapping {
                regulation_title: "PS24/1".into(),
                regulation_text: "summary".into(),
                related_policies_controls: vec![RelatedItem {
                    text: "Complaints policy".into(),
                    metadata: Default::default(),
                }],
                retrieval_error: None,
            }],
            impacts: vec![ImpactSummary {
                regulation_title: "PS24/1".into(),
                impact_analysis: Outcome::ok("impact"),
            }],
            actions: vec![ActionPlan {
                regulation_title: "PS24/1".into(),
                recommended_actions: Outcome::failed("timeout"),
            }],
        };
        write_result(&path, &result).unwrap();
        assert_eq!(read_result(&path).unwrap(), result);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["actions"][0]["recommended_actions"]["status"], "failed");
    }
}
