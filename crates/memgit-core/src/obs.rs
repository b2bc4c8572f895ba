//! Structured lifecycle events for memory operations.
//!
//! Every mutation of branch or index state emits exactly one `info!` event
//! with an `event` field, so a JSON log stream can be filtered per operation:
//!
//! ```text
//! event=commit.created branch=main commit_id=0002-1a2b3c4d trace_cleared=true
//! ```

use tracing::{info, warn};

/// RAII guard that tags all events of one operation with the active branch.
pub struct OpSpan {
    _span: tracing::span::EnteredSpan,
}

impl OpSpan {
    pub fn enter(op: &'static str, branch: &str) -> Self {
        let span = tracing::info_span!("memgit.op", op = op, branch = %branch);
        Self {
            _span: span.entered(),
        }
    }
}

/// A commit was appended to a branch history and its trace log cleared.
pub fn emit_commit_created(branch: &str, commit_id: &str, roadmap_updated: bool) {
    info!(
        event = "commit.created",
        branch = %branch,
        commit_id = %commit_id,
        trace_cleared = true,
        roadmap_updated = roadmap_updated,
    );
}

/// A branch was created from `parent` and made active.
pub fn emit_branch_created(branch: &str, parent: &str) {
    info!(event = "branch.created", branch = %branch, parent = %parent);
}

/// The active branch pointer moved.
pub fn emit_branch_switched(from: &str, to: &str) {
    info!(event = "branch.switched", from = %from, to = %to);
}

/// `source` was merged into `target`, copying `trace_lines` of its trace log.
pub fn emit_merge_completed(source: &str, target: &str, trace_lines: usize) {
    info!(
        event = "merge.completed",
        source = %source,
        target = %target,
        trace_lines = trace_lines,
    );
}

/// Lines were appended to a branch trace log.
pub fn emit_trace_appended(branch: &str, lines: usize) {
    info!(event = "trace.appended", branch = %branch, lines = lines);
}

/// Flat index mutation: `remember`, `update` or `forget`.
pub fn emit_index_mutation(op: &str, scope: &str, record_type: &str, affected: usize) {
    info!(
        event = "index.mutated",
        op = %op,
        scope = %scope,
        record_type = %record_type,
        affected = affected,
    );
}

/// A best-effort side write failed and was swallowed.
pub fn emit_side_write_failed(what: &str, error: &dyn std::fmt::Display) {
    warn!(event = "side_write.failed", what = %what, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_span_enter() {
        let _span = OpSpan::enter("commit", "main");
        emit_commit_created("main", "0001-abcdef01", false);
    }
}
