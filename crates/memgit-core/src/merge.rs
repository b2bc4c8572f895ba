//! One-directional merge of a source branch into a destination branch.
//!
//! The source is only ever read. The destination gains a merge entry in its
//! history and a bracketed copy of the source trace log; the roadmap gains a
//! milestone line. The destination trace log is not cleared.

use chrono::Utc;
use memgit_state::{validate_branch_name, BranchStore, HistoryEntry, MergeRecord, RoadmapStore};

use crate::commit::{next_summary, resolve_purpose};
use crate::domain::{MemgitError, Result};
use crate::obs;
use crate::render::{render_history, timestamp};

#[derive(Debug, Clone, Copy)]
pub struct MergeOptions {
    /// Inline the rendered source history into the merge entry
    pub inline_history: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            inline_history: true,
        }
    }
}

/// Result of a merge.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub record: MergeRecord,
    pub trace_lines_copied: usize,
}

impl std::fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let r = &self.record;
        writeln!(f, "Merged branch '{}' into '{}'.", r.source, r.target)?;
        writeln!(f, "Summary: {}", r.summary)?;
        writeln!(f, "Source purpose: {}", r.source_purpose)?;
        writeln!(f, "Source progress:\n{}", r.source_progress)?;
        write!(
            f,
            "Copied {} trace line(s); source history digest {}.",
            self.trace_lines_copied,
            &r.source_digest[..12.min(r.source_digest.len())]
        )
    }
}

pub fn merge_start_marker(source: &str, at: &str) -> String {
    format!("=== Merged from branch '{source}' at {at} ===")
}

pub fn merge_end_marker(source: &str) -> String {
    format!("=== End merge from '{source}' ===")
}

pub struct MergeEngine {
    branches: BranchStore,
    roadmap: RoadmapStore,
    options: MergeOptions,
}

impl MergeEngine {
    pub fn new(branches: BranchStore, roadmap: RoadmapStore, options: MergeOptions) -> Self {
        Self {
            branches,
            roadmap,
            options,
        }
    }

    pub fn merge(&self, target: &str, source: &str, summary: &str) -> Result<MergeOutcome> {
        validate_branch_name(source)?;
        if !self.branches.exists(source)? {
            return Err(MemgitError::NotFound(format!("branch '{source}'")));
        }
        if source == target {
            return Err(MemgitError::InvalidArgument(format!(
                "cannot merge branch '{source}' into itself"
            )));
        }

        // Everything from the source is read up front; it is never written.
        let source_history = self.branches.read_history(source)?;
        let source_trace = self.branches.read_trace(source)?;

        let now = Utc::now();
        let record = MergeRecord {
            source: source.to_string(),
            target: target.to_string(),
            timestamp: now,
            summary: summary.trim().to_string(),
            source_purpose: resolve_purpose(source, &source_history),
            source_progress: next_summary(&source_history),
            source_history: self
                .options
                .inline_history
                .then(|| render_history(source, &source_history)),
            source_digest: self.branches.history_digest(source)?.to_string(),
        };

        self.branches.ensure(target)?;
        self.branches
            .append_history(target, &HistoryEntry::Merge(record.clone()))?;

        let copied = source_trace.lines().count();
        if copied > 0 {
            let mut block = String::new();
            let existing = self.branches.read_trace(target)?;
            if !existing.is_empty() && !existing.ends_with('\n') {
                block.push('\n');
            }
            block.push_str(&merge_start_marker(source, &timestamp(&now)));
            block.push('\n');
            block.push_str(source_trace.trim_end_matches('\n'));
            block.push('\n');
            block.push_str(&merge_end_marker(source));
            block.push('\n');
            self.branches.append_trace(target, &block)?;
        }

        let milestone = if record.summary.is_empty() {
            format!("Merged {source} into {target}")
        } else {
            format!("Merged {source} into {target}: {}", record.summary)
        };
        self.roadmap.append_milestone(&milestone)?;

        obs::emit_merge_completed(source, target, copied);
        Ok(MergeOutcome {
            record,
            trace_lines_copied: copied,
        })
    }
}
