//! Text rendering of branch history.
//!
//! History is stored as structured records; this is the only place that
//! turns them into the field-labeled block layout shown to a model:
//!
//! ```text
//! ## Commit 0002-1a2b3c4d
//! Timestamp: 2026-10-18T09:12:44+00:00
//! Message: Parser handles nested blocks
//! Branch Purpose: Main development branch
//! Previous Progress Summary:
//! Initial commit
//! - tokenizer in place
//! This Commit's Contribution:
//! nested block support
//! ---
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use memgit_state::{BranchHeader, CommitRecord, HistoryEntry, MergeRecord};

pub const BLOCK_END: &str = "---";

pub fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}

pub fn render_header(branch: &str, header: &BranchHeader) -> String {
    format!(
        "# Branch: {branch}\nBranch Purpose: {}\nCreated at {}\n{BLOCK_END}\n",
        header.purpose,
        timestamp(&header.created_at)
    )
}

pub fn render_commit(commit: &CommitRecord) -> String {
    format!(
        "## Commit {id}\nTimestamp: {ts}\nMessage: {msg}\nBranch Purpose: {purpose}\n\
         Previous Progress Summary:\n{summary}\nThis Commit's Contribution:\n{contribution}\n{BLOCK_END}\n",
        id = commit.id,
        ts = timestamp(&commit.timestamp),
        msg = commit.message,
        purpose = commit.purpose,
        summary = commit.previous_summary,
        contribution = commit.contribution,
    )
}

pub fn render_merge(merge: &MergeRecord) -> String {
    let mut out = format!(
        "## Merge {} -> {}\nTimestamp: {}\nSummary: {}\nSource Purpose: {}\n\
         Source Progress:\n{}\nSource Digest: {}\n",
        merge.source,
        merge.target,
        timestamp(&merge.timestamp),
        merge.summary,
        merge.source_purpose,
        merge.source_progress,
        merge.source_digest,
    );
    if let Some(history) = &merge.source_history {
        out.push_str("Source History:\n");
        // Quote the inlined blocks so their delimiters don't read as ours.
        for line in history.lines() {
            out.push_str("> ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str(BLOCK_END);
    out.push('\n');
    out
}

/// Render a whole history in document order.
pub fn render_history(branch: &str, entries: &[HistoryEntry]) -> String {
    entries
        .iter()
        .map(|entry| match entry {
            HistoryEntry::Created(h) => render_header(branch, h),
            HistoryEntry::Commit(c) => render_commit(c),
            HistoryEntry::Merge(m) => render_merge(m),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
