//! Loads internal policies, controls and regulatory texts into the store so
//! the mapping stage has something to retrieve.

use std::path::Path;

use regcopilot_core::{CorpusConfig, Metadata};
use regcopilot_sources::list_files;
use regcopilot_store::DocumentStore;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub policies: usize,
    pub regulations: usize,
    pub controls: usize,
}

impl SeedReport {
    pub fn total(&self) -> usize {
        self.policies + self.regulations + self.controls
    }
}

#[derive(Debug, Deserialize)]
struct ControlRecord {
    control_id: String,
    name: String,
    description: String,
    #[serde(default)]
    owner: String,
}

fn kind(value: &str) -> Metadata {
    Metadata::from([("type".to_string(), value.to_string())])
}

pub async fn seed_corpus(
    store: &dyn DocumentStore,
    corpus: &CorpusConfig,
    regulatory_dir: &Path,
) -> SeedReport {
    let mut report = SeedReport {
        policies: seed_text_files(store, &corpus.policies_dir, "policy").await,
        ..SeedReport::default()
    };
    if corpus.include_regulations {
        report.regulations = seed_text_files(store, regulatory_dir, "regulation").await;
    }
    report.controls = seed_controls(store, &corpus.controls_dir).await;

    info!(
        policies = report.policies,
        regulations = report.regulations,
        controls = report.controls,
        "seeded corpus"
    );
    report
}

async fn seed_text_files(store: &dyn DocumentStore, dir: &Path, doc_type: &str) -> usize {
    let files = match list_files(dir, "txt").await {
        Ok(files) => files,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "skipping {doc_type} directory");
            return 0;
        }
    };

    let metadata = kind(doc_type);
    let mut seeded = 0;
    for path in files {
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = format!("{doc_type}_{name}");
        match store.upsert(&id, &text, &metadata).await {
            Ok(()) => seeded += 1,
            Err(e) => warn!(doc_id = %id, error = %e, "failed to seed document"),
        }
    }
    seeded
}

async fn seed_controls(store: &dyn DocumentStore, dir: &Path) -> usize {
    let files = match list_files(dir, "json").await {
        Ok(files) => files,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "skipping controls directory");
            return 0;
        }
    };

    let mut seeded = 0;
    for path in files {
        let records: Vec<ControlRecord> = match tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()))
        {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping malformed control file");
                continue;
            }
        };
        for control in records {
            let id = format!("control_{}", control.control_id);
            let text = format!("{}: {}", control.name, control.description);
            let mut metadata = kind("control");
            metadata.insert("owner".to_string(), control.owner);
            match store.upsert(&id, &text, &metadata).await {
                Ok(()) => seeded += 1,
                Err(e) => warn!(doc_id = %id, error = %e, "failed to seed control"),
            }
        }
    }
    seeded
}

#[cfg(test)]
mod tests {
    use super::*;
    use regcopilot_store::recording::RecordingStore;
    use tempfile::TempDir;

    fn corpus(tmp: &TempDir) -> CorpusConfig {
        CorpusConfig {
            policies_dir: tmp.path().join("policies"),
            controls_dir: tmp.path().join("controls"),
            include_regulations: true,
        }
    }

    #[tokio::test]
    async fn seeds_every_kind_with_metadata() {
        let tmp = TempDir::new().unwrap();
        for dir in ["policies", "controls", "regs"] {
            std::fs::create_dir(tmp.path().join(dir)).unwrap();
        }
        std::fs::write(tmp.path().join("policies/aml.txt"), "AML policy text").unwrap();
        std::fs::write(tmp.path().join("regs/RegA.txt"), "Regulation A").unwrap();
        std::fs::write(
            tmp.path().join("controls/controls.json"),
            r#"[{"control_id": "C-01", "name": "Transaction monitoring",
                 "description": "Screen outbound payments", "owner": "Financial Crime"}]"#,
        )
        .unwrap();

        let store = RecordingStore::empty();
        let report = seed_corpus(&store, &corpus(&tmp), &tmp.path().join("regs")).await;
        assert_eq!(
            report,
            SeedReport {
                policies: 1,
                regulations: 1,
                controls: 1
            }
        );

        let upserts = store.upserts();
        let control = upserts.iter().find(|u| u.id == "control_C-01").unwrap();
        assert_eq!(control.text, "Transaction monitoring: Screen outbound payments");
        assert_eq!(control.metadata["owner"], "Financial Crime");
        assert_eq!(control.metadata["type"], "control");
        assert!(upserts.iter().any(|u| u.id == "policy_aml.txt"));
        assert!(upserts.iter().any(|u| u.id == "regulation_RegA.txt"));
    }

    #[tokio::test]
    async fn missing_directories_and_bad_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("controls")).unwrap();
        std::fs::write(tmp.path().join("controls/broken.json"), "[{").unwrap();

        let mut cfg = corpus(&tmp);
        cfg.include_regulations = false;
        let store = RecordingStore::empty();
        let report = seed_corpus(&store, &cfg, &tmp.path().join("regs")).await;
        assert_eq!(report.total(), 0);
        assert!(store.upserts().is_empty());
    }
}
