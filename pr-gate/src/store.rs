//! Review-record store: one record per tracked PR, keyed by `owner/repo#number`.
//!
//! In-memory `RwLock<HashMap>` index with write-through JSON persistence
//! (one file per record under the data directory, loaded on open). The core
//! only needs point lookup, insert, and full-record update; records are never
//! deleted here — retention is an external concern.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::errors::{GateResult, StoreError};

/// Review workflow states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    PendingReview,
    Passed,
    Failed,
}

/// Per-question grade, as produced by the grading model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
}

/// One graded question/answer pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerGrade {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    pub grade: Grade,
    #[serde(default)]
    pub feedback: String,
}

/// Structured grading outcome, folded into [`ReviewRecord::grading_result`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingResult {
    pub overall_pass: bool,
    pub answers: Vec<AnswerGrade>,
    pub summary: String,
}

/// Persistent state of one PR's comprehension check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Composite key: `owner/repo#number`.
    pub pr_id: String,
    /// Latest reviewed head commit.
    pub pr_sha: String,
    pub installation_id: u64,
    /// Ordered question set, length 3-5.
    pub questions: Vec<String>,
    /// Fingerprint of the diff the questions were generated from.
    pub diff_hash: String,
    #[serde(default)]
    pub reviewer_answers: Option<Vec<String>>,
    #[serde(default)]
    pub grading_result: Option<GradingResult>,
    pub status: ReviewStatus,
    #[serde(default)]
    pub reviewer_username: Option<String>,
    #[serde(default)]
    pub bot_comment_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Shared review-record store.
///
/// Safe for concurrent access from multiple event handlers; each mutation
/// takes the write lock for the in-memory index and then writes the record's
/// JSON file (when a data directory is configured).
pub struct ReviewStore {
    records: RwLock<HashMap<String, ReviewRecord>>,
    data_dir: Option<PathBuf>,
}

impl ReviewStore {
    /// Opens the store, loading any persisted records from `data_dir`.
    ///
    /// Unreadable record files are skipped with a warning rather than failing
    /// startup.
    pub async fn open(data_dir: Option<PathBuf>) -> GateResult<Self> {
        let mut records = HashMap::new();

        if let Some(dir) = &data_dir {
            fs::create_dir_all(dir).await?;
            let mut entries = fs::read_dir(dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                match fs::read(&path).await {
                    Ok(data) => match serde_json::from_slice::<ReviewRecord>(&data) {
                        Ok(record) => {
                            records.insert(record.pr_id.clone(), record);
                        }
                        Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable record"),
                    },
                    Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable record"),
                }
            }
            debug!(count = records.len(), dir = %dir.display(), "review records loaded");
        }

        Ok(Self {
            records: RwLock::new(records),
            data_dir,
        })
    }

    /// In-memory store without persistence.
    pub fn in_memory() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            data_dir: None,
        }
    }

    /// Point lookup by `pr_id`.
    pub async fn get(&self, pr_id: &str) -> Option<ReviewRecord> {
        self.records.read().await.get(pr_id).cloned()
    }

    /// Inserts or fully replaces a record, then writes it through to disk.
    pub async fn upsert(&self, record: ReviewRecord) -> GateResult<()> {
        {
            let mut records = self.records.write().await;
            records.insert(record.pr_id.clone(), record.clone());
        }

        if let Some(dir) = &self.data_dir {
            let path = dir.join(format!("{}.json", sanitize(&record.pr_id)));
            let json = serde_json::to_vec_pretty(&record).map_err(StoreError::Serde)?;
            fs::write(path, json).await?;
        }
        Ok(())
    }
}

/// Filesystem-safe replacement for the record key (`/` and `#` → `_`).
fn sanitize(s: &str) -> String {
    s.replace(['/', '#'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pr_id: &str, diff_hash: &str) -> ReviewRecord {
        ReviewRecord {
            pr_id: pr_id.to_string(),
            pr_sha: "abc123".to_string(),
            installation_id: 7,
            questions: vec!["q1".into(), "q2".into(), "q3".into()],
            diff_hash: diff_hash.to_string(),
            reviewer_answers: None,
            grading_result: None,
            status: ReviewStatus::PendingReview,
            reviewer_username: None,
            bot_comment_id: Some(1),
            created_at: Utc::now(),
            reviewed_at: None,
        }
    }

    #[tokio::test]
    async fn upsert_then_get_roundtrip() {
        let store = ReviewStore::in_memory();
        store.upsert(record("o/r#1", "h1")).await.unwrap();

        let loaded = store.get("o/r#1").await.unwrap();
        assert_eq!(loaded.diff_hash, "h1");
        assert_eq!(loaded.status, ReviewStatus::PendingReview);
        assert!(store.get("o/r#2").await.is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_whole_record() {
        let store = ReviewStore::in_memory();
        store.upsert(record("o/r#1", "h1")).await.unwrap();

        let mut updated = record("o/r#1", "h2");
        updated.status = ReviewStatus::Passed;
        updated.reviewer_answers = Some(vec!["a1".into(), "a2".into(), "a3".into()]);
        store.upsert(updated).await.unwrap();

        let loaded = store.get("o/r#1").await.unwrap();
        assert_eq!(loaded.diff_hash, "h2");
        assert_eq!(loaded.status, ReviewStatus::Passed);
        assert_eq!(loaded.reviewer_answers.unwrap().len(), 3);
    }

    #[test]
    fn sanitize_makes_keys_filesystem_safe() {
        assert_eq!(sanitize("owner/repo#12"), "owner_repo_12");
    }

    #[test]
    fn grade_serializes_as_uppercase() {
        let json = serde_json::to_string(&Grade::Pass).unwrap();
        assert_eq!(json, "\"PASS\"");
        let back: Grade = serde_json::from_str("\"FAIL\"").unwrap();
        assert_eq!(back, Grade::Fail);
    }
}
