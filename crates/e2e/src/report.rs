//! Scenario outcomes and their diagnostic attachments

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::E2eResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Text,
    Json,
    Png,
    Jpeg,
}

impl AttachmentKind {
    fn extension(&self) -> &'static str {
        match self {
            AttachmentKind::Text => "txt",
            AttachmentKind::Json => "json",
            AttachmentKind::Png => "png",
            AttachmentKind::Jpeg => "jpg",
        }
    }
}

/// One file written for a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub kind: AttachmentKind,
    pub path: PathBuf,
    pub sha256: String,
    pub size: usize,
}

/// Per-scenario attachment sink.
///
/// Clones share the same list, so the API client and the scenario context
/// can both record into it.
#[derive(Debug, Clone)]
pub struct Attachments {
    dir: PathBuf,
    entries: Arc<Mutex<Vec<Attachment>>>,
}

impl Attachments {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn attach(&self, name: &str, kind: AttachmentKind, bytes: &[u8]) -> E2eResult<()> {
        std::fs::create_dir_all(&self.dir)?;

        let mut entries = self.entries.lock();
        let file_name = format!("{:03}-{}.{}", entries.len(), slug(name), kind.extension());
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes)?;

        let sha256 = hex::encode(Sha256::digest(bytes));
        debug!("Attached {} ({} bytes, sha256 {})", path.display(), bytes.len(), &sha256[..12]);

        entries.push(Attachment {
            name: name.to_string(),
            kind,
            path,
            sha256,
            size: bytes.len(),
        });
        Ok(())
    }

    pub fn text(&self, name: &str, content: &str) -> E2eResult<()> {
        self.attach(name, AttachmentKind::Text, content.as_bytes())
    }

    pub fn json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> E2eResult<()> {
        let body = serde_json::to_vec_pretty(value)?;
        self.attach(name, AttachmentKind::Json, &body)
    }

    pub fn png(&self, name: &str, bytes: &[u8]) -> E2eResult<()> {
        self.attach(name, AttachmentKind::Png, bytes)
    }

    pub fn entries(&self) -> Vec<Attachment> {
        self.entries.lock().clone()
    }
}

fn slug(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    slug.trim_matches('_').to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    /// An expectation did not hold
    Failed,
    /// The suite could not run the scenario to a verdict
    Errored,
}

impl Outcome {
    pub fn symbol(&self) -> &'static str {
        match self {
            Outcome::Passed => "✓",
            Outcome::Failed => "✗",
            Outcome::Errored => "!",
        }
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub tags: Vec<String>,
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub error: Option<String>,
    /// Set when the scenario targets behavior production is known to miss
    pub known_gap: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// Result of running one worker's share of the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub worker: usize,
    pub workers: usize,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub duration_ms: u64,
    /// RFC 3339, UTC
    pub finished_at: String,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn new(worker: usize, workers: usize, duration_ms: u64, results: Vec<ScenarioResult>) -> Self {
        let count = |outcome: Outcome| results.iter().filter(|r| r.outcome == outcome).count();
        Self {
            worker,
            workers,
            total: results.len(),
            passed: count(Outcome::Passed),
            failed: count(Outcome::Failed),
            errored: count(Outcome::Errored),
            duration_ms,
            finished_at: chrono::Utc::now().to_rfc3339(),
            results,
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    /// Write `test-results.json` into `dir`
    pub fn write(&self, dir: &Path) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let path = dir.join("test-results.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, outcome: Outcome) -> ScenarioResult {
        ScenarioResult {
            name: name.to_string(),
            tags: vec![],
            outcome,
            duration_ms: 1,
            error: None,
            known_gap: None,
            attachments: vec![],
        }
    }

    #[test]
    fn test_attachments_are_hashed_and_shared() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Attachments::new(dir.path().join("login"));
        let clone = sink.clone();

        sink.text("Response Body", "hello").unwrap();
        clone.json("payload", &serde_json::json!({"a": 1})).unwrap();

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert!(entries[0].path.ends_with("000-response_body.txt"));
        assert!(entries[1].path.exists());
    }

    #[test]
    fn test_suite_counts() {
        let suite = SuiteResult::new(
            0,
            1,
            10,
            vec![
                result("a", Outcome::Passed),
                result("b", Outcome::Failed),
                result("c", Outcome::Errored),
                result("d", Outcome::Passed),
            ],
        );
        assert_eq!((suite.total, suite.passed, suite.failed, suite.errored), (4, 2, 1, 1));
        assert!(!suite.success());
    }

    #[test]
    fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let suite = SuiteResult::new(1, 3, 5, vec![result("a", Outcome::Passed)]);
        let path = suite.write(dir.path()).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["worker"], 1);
        assert_eq!(written["results"][0]["outcome"], "passed");
    }
}
