//! Schema definitions for memgit documents
//!
//! Documents per branch:
//! - `history.jsonl`: one [`HistoryEntry`] per line (JSON Lines)
//! - `trace.log`: free text, appended by the trace logger
//! - `metadata.json`: [`BranchMetadata`]
//!
//! History lines are decoded leniently: every field defaults when absent and
//! an undecodable line is skipped, so a hand-edited or truncated document
//! still yields whatever context it can.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::Result;

/// Commit identifier: per-branch sequence number plus a random suffix.
///
/// Renders as `0003-9f2c41ab`. Ids sort by sequence within a branch and two
/// commits in the same millisecond cannot collide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CommitId {
    /// 1-based position among the branch's commits
    pub seq: u64,
    /// 8 lowercase hex chars
    pub suffix: String,
}

impl CommitId {
    /// Allocate the id for the commit at position `seq`.
    pub fn next(seq: u64) -> Self {
        let suffix = Uuid::new_v4().simple().to_string()[..8].to_string();
        Self { seq, suffix }
    }

    /// Whether `prefix` addresses this id (full id or any leading part of it).
    pub fn matches(&self, prefix: &str) -> bool {
        !prefix.is_empty() && self.to_string().starts_with(prefix)
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{}", self.seq, self.suffix)
    }
}

impl From<String> for CommitId {
    fn from(s: String) -> Self {
        match s.split_once('-') {
            Some((seq, suffix)) => match seq.parse::<u64>() {
                Ok(seq) => Self {
                    seq,
                    suffix: suffix.to_string(),
                },
                Err(_) => Self { seq: 0, suffix: s },
            },
            None => Self { seq: 0, suffix: s },
        }
    }
}

impl From<CommitId> for String {
    fn from(id: CommitId) -> Self {
        id.to_string()
    }
}

/// Synthetic header written when a branch is created. Not a commit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchHeader {
    pub purpose: String,
    pub created_at: DateTime<Utc>,
}

/// An immutable checkpoint on a branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitRecord {
    pub id: CommitId,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Branch purpose at the time of the commit
    pub purpose: String,
    /// Cumulative narrative of every earlier contribution
    pub previous_summary: String,
    /// What this commit adds
    pub contribution: String,
}

/// One-directional copy of a source branch into a destination's history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeRecord {
    pub source: String,
    pub target: String,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub source_purpose: String,
    /// Folded progress summary of the source at merge time
    pub source_progress: String,
    /// Rendered source history, when inlined for traceability
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_history: Option<String>,
    /// SHA-256 of the source history document at merge time
    pub source_digest: String,
}

/// A single line of a branch's history document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEntry {
    Created(BranchHeader),
    Commit(CommitRecord),
    Merge(MergeRecord),
}

impl HistoryEntry {
    pub fn as_commit(&self) -> Option<&CommitRecord> {
        match self {
            HistoryEntry::Commit(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_merge(&self) -> Option<&MergeRecord> {
        match self {
            HistoryEntry::Merge(m) => Some(m),
            _ => None,
        }
    }

    /// The purpose recorded by this entry, if it records one.
    pub fn recorded_purpose(&self) -> Option<&str> {
        let purpose = match self {
            HistoryEntry::Created(h) => h.purpose.as_str(),
            HistoryEntry::Commit(c) => c.purpose.as_str(),
            HistoryEntry::Merge(_) => return None,
        };
        let purpose = purpose.trim();
        (!purpose.is_empty()).then_some(purpose)
    }
}

/// Encode one entry as a history line (with trailing newline).
pub fn encode_history_line(entry: &HistoryEntry) -> Result<String> {
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');
    Ok(line)
}

/// Decode a history document, skipping blank and undecodable lines.
pub fn decode_history(doc: &str) -> Vec<HistoryEntry> {
    doc.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(n, line)| match serde_json::from_str::<HistoryEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(line = n + 1, error = %e, "skipping malformed history line");
                None
            }
        })
        .collect()
}

/// Branch metadata document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchMetadata {
    pub name: String,
    pub purpose: String,
    pub created_at: DateTime<Utc>,
    /// Branch that was active when this one was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Free-form key/value annotations
    pub extra: BTreeMap<String, String>,
}

impl BranchMetadata {
    pub fn new(name: &str, purpose: &str, parent: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            purpose: purpose.to_string(),
            created_at: Utc::now(),
            parent: parent.map(String::from),
            extra: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(seq: u64, contribution: &str) -> HistoryEntry {
        HistoryEntry::Commit(CommitRecord {
            id: CommitId::next(seq),
            timestamp: Utc::now(),
            message: format!("commit {seq}"),
            purpose: "p".to_string(),
            previous_summary: String::new(),
            contribution: contribution.to_string(),
        })
    }

    #[test]
    fn commit_id_renders_padded_and_parses_back() {
        let id = CommitId::next(3);
        let s = id.to_string();
        assert_eq!(s.len(), 13);
        assert!(s.starts_with("0003-"));
        assert_eq!(CommitId::from(s), id);
    }

    #[test]
    fn commit_id_sorts_by_sequence() {
        let mut ids = vec![CommitId::next(10), CommitId::next(2), CommitId::next(7)];
        ids.sort();
        let seqs: Vec<u64> = ids.iter().map(|i| i.seq).collect();
        assert_eq!(seqs, vec![2, 7, 10]);
    }

    #[test]
    fn commit_id_from_foreign_string_degrades() {
        let id = CommitId::from("lx3k9a".to_string());
        assert_eq!(id.seq, 0);
        assert_eq!(id.suffix, "lx3k9a");
    }

    #[test]
    fn commit_id_prefix_match() {
        let id = CommitId {
            seq: 12,
            suffix: "abcdef01".to_string(),
        };
        assert!(id.matches("0012"));
        assert!(id.matches("0012-abc"));
        assert!(!id.matches("0013"));
        assert!(!id.matches(""));
    }

    #[test]
    fn history_lines_decode_in_order() {
        let mut doc = String::new();
        doc.push_str(
            &encode_history_line(&HistoryEntry::Created(BranchHeader {
                purpose: "try it".to_string(),
                created_at: Utc::now(),
            }))
            .unwrap(),
        );
        doc.push_str(&encode_history_line(&commit(1, "x")).unwrap());
        let entries = decode_history(&doc);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].recorded_purpose(), Some("try it"));
        assert_eq!(entries[1].as_commit().unwrap().contribution, "x");
    }

    #[test]
    fn malformed_trailing_line_is_skipped() {
        let mut doc = encode_history_line(&commit(1, "x")).unwrap();
        doc.push_str("{\"kind\":\"commit\",\"message\":\"trunc");
        let entries = decode_history(&doc);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn missing_fields_default() {
        let entries = decode_history("{\"kind\":\"commit\",\"message\":\"only message\"}\n");
        let c = entries[0].as_commit().unwrap();
        assert_eq!(c.message, "only message");
        assert_eq!(c.contribution, "");
        assert_eq!(c.id.seq, 0);
    }

    #[test]
    fn merge_has_no_recorded_purpose() {
        let m = HistoryEntry::Merge(MergeRecord {
            source: "exp".to_string(),
            target: "main".to_string(),
            ..Default::default()
        });
        assert_eq!(m.recorded_purpose(), None);
        assert!(m.as_merge().is_some());
    }

    #[test]
    fn metadata_extra_defaults_empty() {
        let meta: BranchMetadata = serde_json::from_str("{\"name\":\"exp\"}").unwrap();
        assert_eq!(meta.name, "exp");
        assert!(meta.extra.is_empty());
        assert!(meta.parent.is_none());
    }
}
