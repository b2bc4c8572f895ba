//! Commit engine: immutable checkpoints with a cumulative progress narrative.
//!
//! A commit on branch `b`:
//! 1. resolves the branch purpose (first recorded purpose wins),
//! 2. folds the previous commit's summary and contribution into the new
//!    previous-progress summary,
//! 3. appends the commit to the history,
//! 4. clears the trace log,
//! 5. optionally records a roadmap milestone.
//!
//! Steps are not rolled back on failure; a crash after step 3 leaves the
//! commit recorded with the trace log still populated.

use chrono::Utc;
use memgit_state::{
    BranchStore, CommitId, CommitRecord, HistoryEntry, RoadmapStore, DEFAULT_BRANCH,
};
use serde::{Deserialize, Serialize};

use crate::domain::{MemgitError, Result};
use crate::obs;

/// Summary carried by the first commit of every branch.
pub const INITIAL_SUMMARY: &str = "Initial commit";

/// Purpose assumed for `main` when none was recorded.
pub const MAIN_PURPOSE: &str = "Main development branch";

/// Purpose of `branch`: the first purpose recorded in its history, else a
/// default derived from the name.
pub fn resolve_purpose(branch: &str, history: &[HistoryEntry]) -> String {
    history
        .iter()
        .find_map(HistoryEntry::recorded_purpose)
        .map(str::to_string)
        .unwrap_or_else(|| default_purpose(branch))
}

pub fn default_purpose(branch: &str) -> String {
    if branch == DEFAULT_BRANCH {
        MAIN_PURPOSE.to_string()
    } else {
        format!("Branch: {branch}")
    }
}

/// Fold one commit's own summary and contribution into the next summary.
pub fn fold(previous_summary: &str, contribution: &str) -> String {
    let previous = previous_summary.trim_end();
    let contribution = contribution.trim();
    match (previous.is_empty(), contribution.is_empty()) {
        (_, true) => previous.to_string(),
        (true, false) => format!("- {contribution}"),
        (false, false) => format!("{previous}\n- {contribution}"),
    }
}

/// The previous-progress summary the next commit on this history receives.
///
/// Only regular commits participate; merge entries and the creation header
/// are skipped.
pub fn next_summary(history: &[HistoryEntry]) -> String {
    match history.iter().rev().find_map(HistoryEntry::as_commit) {
        Some(last) => fold(&last.previous_summary, &last.contribution),
        None => INITIAL_SUMMARY.to_string(),
    }
}

/// Sequence number for the next commit.
pub fn next_seq(history: &[HistoryEntry]) -> u64 {
    let commits: Vec<&CommitRecord> = history.iter().filter_map(HistoryEntry::as_commit).collect();
    let highest = commits.iter().map(|c| c.id.seq).max().unwrap_or(0);
    highest.max(commits.len() as u64) + 1
}

/// Arguments of a commit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitRequest {
    pub message: String,
    #[serde(default)]
    pub contribution: String,
    #[serde(default)]
    pub update_roadmap: bool,
}

impl CommitRequest {
    pub fn new(message: impl Into<String>, contribution: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            contribution: contribution.into(),
            update_roadmap: false,
        }
    }

    pub fn with_roadmap(mut self) -> Self {
        self.update_roadmap = true;
        self
    }
}

/// Result of a successful commit.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub branch: String,
    pub record: CommitRecord,
    pub roadmap_updated: bool,
}

impl std::fmt::Display for CommitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Committed {} on branch '{}': {}",
            self.record.id, self.branch, self.record.message
        )?;
        writeln!(f, "Previous progress:\n{}", self.record.previous_summary)?;
        write!(f, "Trace log cleared.")?;
        if self.roadmap_updated {
            write!(f, " Roadmap updated.")?;
        }
        Ok(())
    }
}

pub struct CommitEngine {
    branches: BranchStore,
    roadmap: RoadmapStore,
}

impl CommitEngine {
    pub fn new(branches: BranchStore, roadmap: RoadmapStore) -> Self {
        Self { branches, roadmap }
    }

    pub fn commit(&self, branch: &str, req: &CommitRequest) -> Result<CommitOutcome> {
        let message = req.message.trim();
        if message.is_empty() {
            return Err(MemgitError::InvalidArgument(
                "commit message must not be empty".to_string(),
            ));
        }

        self.branches.ensure(branch)?;
        let history = self.branches.read_history(branch)?;

        let record = CommitRecord {
            id: CommitId::next(next_seq(&history)),
            timestamp: Utc::now(),
            message: message.to_string(),
            purpose: resolve_purpose(branch, &history),
            previous_summary: next_summary(&history),
            contribution: req.contribution.trim().to_string(),
        };

        self.branches
            .append_history(branch, &HistoryEntry::Commit(record.clone()))?;
        self.branches.clear_trace(branch)?;

        if req.update_roadmap {
            self.roadmap
                .append_milestone(&format!("{branch}: {message} ({})", record.id))?;
        }

        obs::emit_commit_created(branch, &record.id.to_string(), req.update_roadmap);
        Ok(CommitOutcome {
            branch: branch.to_string(),
            record,
            roadmap_updated: req.update_roadmap,
        })
    }
}
