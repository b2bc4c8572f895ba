//! Read-only views over memory state at several granularities.

use std::str::FromStr;

use memgit_state::{BranchStore, HistoryEntry, RoadmapStore};
use serde::{Deserialize, Serialize};

use crate::commit::resolve_purpose;
use crate::domain::{MemgitError, Result};
use crate::render::{render_commit, render_history};

/// Granularity of a context view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextLevel {
    Roadmap,
    Branch,
    Commits,
    Commit,
    Log,
    Metadata,
}

impl ContextLevel {
    pub const ALL: [ContextLevel; 6] = [
        ContextLevel::Roadmap,
        ContextLevel::Branch,
        ContextLevel::Commits,
        ContextLevel::Commit,
        ContextLevel::Log,
        ContextLevel::Metadata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextLevel::Roadmap => "roadmap",
            ContextLevel::Branch => "branch",
            ContextLevel::Commits => "commits",
            ContextLevel::Commit => "commit",
            ContextLevel::Log => "log",
            ContextLevel::Metadata => "metadata",
        }
    }
}

impl std::fmt::Display for ContextLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextLevel {
    type Err = MemgitError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|l| l.as_str()).collect();
                MemgitError::InvalidArgument(format!(
                    "unknown context level {s:?}; expected one of {}",
                    names.join(", ")
                ))
            })
    }
}

/// A context query. `branch` defaults to the active branch.
#[derive(Debug, Clone)]
pub struct ContextRequest {
    pub level: ContextLevel,
    pub branch: Option<String>,
    pub line_count: Option<usize>,
    pub offset: usize,
    pub hash: Option<String>,
}

impl ContextRequest {
    pub fn new(level: ContextLevel) -> Self {
        Self {
            level,
            branch: None,
            line_count: None,
            offset: 0,
            hash: None,
        }
    }

    pub fn on_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn window(mut self, line_count: usize, offset: usize) -> Self {
        self.line_count = Some(line_count);
        self.offset = offset;
        self
    }

    pub fn commit(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }
}

/// A window over trace-log lines, `[start, end)` in zero-based line numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogWindow {
    pub lines: Vec<String>,
    pub start: usize,
    pub end: usize,
    pub total: usize,
}

impl LogWindow {
    pub fn has_earlier(&self) -> bool {
        self.start > 0
    }

    pub fn has_later(&self) -> bool {
        self.end < self.total
    }
}

/// Select `count` lines ending `offset` lines before the end of `trace`.
pub fn log_window(trace: &str, count: usize, offset: usize) -> LogWindow {
    let all: Vec<&str> = trace.lines().collect();
    let total = all.len();
    let end = total.saturating_sub(offset);
    let start = end.saturating_sub(count);
    LogWindow {
        lines: all[start..end].iter().map(|l| l.to_string()).collect(),
        start,
        end,
        total,
    }
}

pub struct ContextRetriever {
    branches: BranchStore,
    roadmap: RoadmapStore,
    branch_log_limit: usize,
    log_window: usize,
}

impl ContextRetriever {
    pub fn new(
        branches: BranchStore,
        roadmap: RoadmapStore,
        branch_log_limit: usize,
        log_window: usize,
    ) -> Self {
        Self {
            branches,
            roadmap,
            branch_log_limit,
            log_window,
        }
    }

    /// Build the text view for `req`, resolving the branch against `active`.
    pub fn retrieve(&self, active: &str, req: &ContextRequest) -> Result<String> {
        let branch = req.branch.as_deref().unwrap_or(active);
        match req.level {
            ContextLevel::Roadmap => self.roadmap_view(active),
            ContextLevel::Branch => self.branch_view(branch),
            ContextLevel::Commits => self.commits_view(branch),
            ContextLevel::Commit => {
                let hash = req
                    .hash
                    .as_deref()
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| {
                        MemgitError::InvalidArgument(
                            "commit level needs a commit hash".to_string(),
                        )
                    })?;
                self.commit_view(branch, hash)
            }
            ContextLevel::Log => self.log_view(
                branch,
                req.line_count.unwrap_or(self.log_window),
                req.offset,
            ),
            ContextLevel::Metadata => self.metadata_view(branch),
        }
    }

    fn roadmap_view(&self, active: &str) -> Result<String> {
        let mut out = String::new();
        let roadmap = self.roadmap.read()?;
        if roadmap.trim().is_empty() {
            out.push_str("(no roadmap yet; run init)\n");
        } else {
            out.push_str(roadmap.trim_end());
            out.push('\n');
        }

        out.push_str("\n## Branches\n\n");
        let names = self.branches.list()?;
        if names.is_empty() {
            out.push_str("(none)\n");
        }
        for (i, name) in names.iter().enumerate() {
            let marker = if name == active { "*" } else { " " };
            out.push_str(&format!("{}. {marker} {name}\n", i + 1));
        }
        Ok(out)
    }

    fn load_existing(&self, branch: &str) -> Result<Vec<HistoryEntry>> {
        if !self.branches.exists(branch)? {
            return Err(MemgitError::NotFound(format!("branch '{branch}'")));
        }
        Ok(self.branches.read_history(branch)?)
    }

    fn branch_view(&self, branch: &str) -> Result<String> {
        let history = self.load_existing(branch)?;
        let commits: Vec<_> = history.iter().filter_map(HistoryEntry::as_commit).collect();
        let merges = history.iter().filter(|e| e.as_merge().is_some()).count();

        let mut out = format!(
            "# Branch: {branch}\nPurpose: {}\nCommits: {}\nMerges: {merges}\n\n",
            resolve_purpose(branch, &history),
            commits.len()
        );
        if commits.is_empty() {
            out.push_str("(no commits yet)\n");
            return Ok(out);
        }
        let skip = commits.len().saturating_sub(self.branch_log_limit);
        out.push_str(&format!("## Last {} commit(s)\n\n", commits.len() - skip));
        for commit in &commits[skip..] {
            out.push_str(&format!("{}: {}\n", commit.id, commit.message));
        }
        Ok(out)
    }

    fn commits_view(&self, branch: &str) -> Result<String> {
        let history = self.load_existing(branch)?;
        Ok(render_history(branch, &history))
    }

    fn commit_view(&self, branch: &str, hash: &str) -> Result<String> {
        let history = self.load_existing(branch)?;
        let commits: Vec<_> = history.iter().filter_map(HistoryEntry::as_commit).collect();

        if let Some(exact) = commits.iter().find(|c| c.id.to_string() == hash) {
            return Ok(render_commit(exact));
        }
        let matches: Vec<_> = commits.iter().filter(|c| c.id.matches(hash)).collect();
        match matches.as_slice() {
            [] => Err(MemgitError::NotFound(format!(
                "commit '{hash}' on branch '{branch}'"
            ))),
            [one] => Ok(render_commit(one)),
            many => {
                let ids: Vec<String> = many.iter().map(|c| c.id.to_string()).collect();
                Err(MemgitError::AmbiguousMatch(format!(
                    "prefix '{hash}' matches {}",
                    ids.join(", ")
                )))
            }
        }
    }

    fn log_view(&self, branch: &str, count: usize, offset: usize) -> Result<String> {
        let trace = self.branches.read_trace(branch)?;
        let window = log_window(&trace, count, offset);
        if window.total == 0 {
            return Ok(format!("Trace log for '{branch}' is empty.\n"));
        }
        if window.lines.is_empty() {
            return Ok(format!(
                "Trace log for '{branch}': no lines in this window (offset {offset}, {} line(s) total).\n",
                window.total
            ));
        }

        let mut out = format!(
            "Trace log for '{branch}': lines {}-{} of {}\n\n",
            window.start + 1,
            window.end,
            window.total
        );
        for line in &window.lines {
            out.push_str(line);
            out.push('\n');
        }
        if window.has_earlier() {
            out.push_str(&format!(
                "\n({} earlier line(s); raise offset to see them)\n",
                window.start
            ));
        }
        if window.has_later() {
            out.push_str(&format!(
                "\n({} later line(s); lower offset to see them)\n",
                window.total - window.end
            ));
        }
        Ok(out)
    }

    fn metadata_view(&self, branch: &str) -> Result<String> {
        if !self.branches.metadata_exists(branch)? {
            return Err(MemgitError::NotFound(format!(
                "metadata for branch '{branch}'"
            )));
        }
        Ok(self.branches.read_metadata_raw(branch)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::BranchEngine;
    use crate::commit::{CommitEngine, CommitRequest};
    use memgit_state::fakes::MemoryDocumentStore;
    use memgit_state::DocumentStore;
    use std::sync::Arc;

    fn setup() -> (BranchStore, RoadmapStore, ContextRetriever) {
        let docs: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let branches = BranchStore::new(docs.clone());
        let roadmap = RoadmapStore::new(docs);
        let retriever = ContextRetriever::new(branches.clone(), roadmap.clone(), 10, 20);
        (branches, roadmap, retriever)
    }

    #[test]
    fn level_parsing() {
        assert_eq!("LOG".parse::<ContextLevel>().unwrap(), ContextLevel::Log);
        let err = "everything".parse::<ContextLevel>().unwrap_err();
        assert!(matches!(err, MemgitError::InvalidArgument(_)));
    }

    #[test]
    fn window_math() {
        let trace = "1\n2\n3\n4\n5\n";
        let w = log_window(trace, 2, 0);
        assert_eq!(w.lines, vec!["4", "5"]);
        assert!(w.has_earlier() && !w.has_later());

        let w = log_window(trace, 2, 1);
        assert_eq!(w.lines, vec!["3", "4"]);
        assert!(w.has_later());

        let w = log_window(trace, 50, 0);
        assert_eq!(w.lines.len(), 5);
        assert!(!w.has_earlier());

        let w = log_window(trace, 3, 10);
        assert!(w.lines.is_empty());
        assert_eq!((w.start, w.end), (0, 0));
    }

    #[test]
    fn branch_view_lists_last_commits() {
        let (branches, roadmap, _) = setup();
        let retriever = ContextRetriever::new(branches.clone(), roadmap.clone(), 2, 20);
        BranchEngine::new(branches.clone())
            .create("exp", "try things", "main")
            .unwrap();
        let engine = CommitEngine::new(branches, roadmap);
        for msg in ["one", "two", "three"] {
            engine.commit("exp", &CommitRequest::new(msg, msg)).unwrap();
        }

        let text = retriever
            .retrieve("exp", &ContextRequest::new(ContextLevel::Branch))
            .unwrap();
        assert!(text.contains("Purpose: try things"));
        assert!(text.contains("Commits: 3"));
        assert!(!text.contains(": one\n"));
        assert!(text.contains(": two\n"));
        assert!(text.trim_end().ends_with(": three"));
    }

    #[test]
    fn missing_branch_is_not_found() {
        let (_, _, retriever) = setup();
        for level in [ContextLevel::Branch, ContextLevel::Commits, ContextLevel::Metadata] {
            let err = retriever
                .retrieve("main", &ContextRequest::new(level).on_branch("ghost"))
                .unwrap_err();
            assert!(matches!(err, MemgitError::NotFound(_)), "{level}");
        }
    }

    #[test]
    fn commit_lookup_by_prefix() {
        let (branches, roadmap, retriever) = setup();
        let engine = CommitEngine::new(branches, roadmap);
        let first = engine
            .commit("main", &CommitRequest::new("A", "x"))
            .unwrap();
        engine.commit("main", &CommitRequest::new("B", "y")).unwrap();

        let text = retriever
            .retrieve("main", &ContextRequest::new(ContextLevel::Commit).commit("0001"))
            .unwrap();
        assert!(text.contains(&format!("## Commit {}", first.record.id)));
        assert!(text.contains("Message: A"));

        let err = retriever
            .retrieve("main", &ContextRequest::new(ContextLevel::Commit).commit("000"))
            .unwrap_err();
        assert!(matches!(err, MemgitError::AmbiguousMatch(_)));

        let err = retriever
            .retrieve("main", &ContextRequest::new(ContextLevel::Commit))
            .unwrap_err();
        assert!(matches!(err, MemgitError::InvalidArgument(_)));
    }

    #[test]
    fn roadmap_marks_active_branch() {
        let (branches, roadmap, retriever) = setup();
        roadmap.ensure_initialized(Some("ship it")).unwrap();
        let engine = BranchEngine::new(branches);
        engine.create("alpha", "a", "main").unwrap();
        engine.create("beta", "b", "alpha").unwrap();

        let text = retriever
            .retrieve("beta", &ContextRequest::new(ContextLevel::Roadmap))
            .unwrap();
        assert!(text.contains("- ship it"));
        assert!(text.contains("1.   alpha"));
        assert!(text.contains("2. * beta"));
    }

    #[test]
    fn empty_log_is_reported() {
        let (_, _, retriever) = setup();
        let text = retriever
            .retrieve("main", &ContextRequest::new(ContextLevel::Log))
            .unwrap();
        assert!(text.contains("is empty"));
    }
}
