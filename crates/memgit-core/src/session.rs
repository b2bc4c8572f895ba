//! The session handle: stores plus the active branch.
//!
//! Every operation runs against `Session::active_branch`, which is read from
//! the pointer document once at open and updated by create/switch.

use std::sync::Arc;

use chrono::Utc;
use memgit_state::fakes::MemoryDocumentStore;
use memgit_state::{
    BranchHeader, BranchMetadata, BranchStore, DocumentStore, FsDocumentStore, HistoryEntry,
    RoadmapStore, DEFAULT_BRANCH,
};
use tracing::{info, warn};

use crate::branch::{BranchCreated, BranchEngine};
use crate::commit::{resolve_purpose, CommitEngine, CommitOutcome, CommitRequest, MAIN_PURPOSE};
use crate::config::MemgitConfig;
use crate::context::{ContextRequest, ContextRetriever};
use crate::domain::{MemgitError, RecordType, Result};
use crate::legacy::{
    LegacyMemoryIndex, LegacyRecord, MemoryListing, RecallQuery, RecallResult, UpdateOutcome,
    UpdateRequest,
};
use crate::merge::{MergeEngine, MergeOptions, MergeOutcome};
use crate::obs::{self, OpSpan};
use crate::trace_log::{LogEntry, TraceLogger};

/// One row of [`Session::branches`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    pub name: String,
    pub active: bool,
}

pub struct Session {
    config: MemgitConfig,
    branches: BranchStore,
    roadmap: RoadmapStore,
    legacy: LegacyMemoryIndex,
    active: String,
}

impl Session {
    /// Open the filesystem-backed memory under `config.root`.
    pub fn open(config: MemgitConfig) -> Result<Self> {
        let docs: Arc<dyn DocumentStore> = Arc::new(FsDocumentStore::new(&config.root)?);
        let legacy: Arc<dyn DocumentStore> =
            Arc::new(FsDocumentStore::new(config.legacy_root())?);
        Self::with_stores(config, docs, legacy)
    }

    /// A session held entirely in memory.
    pub fn in_memory() -> Result<Self> {
        Self::with_stores(
            MemgitConfig::default(),
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryDocumentStore::new()),
        )
    }

    pub fn with_stores(
        config: MemgitConfig,
        docs: Arc<dyn DocumentStore>,
        legacy_docs: Arc<dyn DocumentStore>,
    ) -> Result<Self> {
        let branches = BranchStore::new(docs.clone());
        let mut session = Self {
            config,
            roadmap: RoadmapStore::new(docs),
            legacy: LegacyMemoryIndex::new(legacy_docs),
            branches,
            active: DEFAULT_BRANCH.to_string(),
        };
        session.ensure_main()?;

        let pointer = session.branches.read_active()?;
        if matches!(session.branches.exists(&pointer), Ok(true)) {
            session.active = pointer;
        } else {
            warn!(pointer = %pointer, "active branch missing; falling back to main");
            session.branches.write_active(DEFAULT_BRANCH)?;
        }
        Ok(session)
    }

    fn ensure_main(&self) -> Result<()> {
        if self.branches.exists(DEFAULT_BRANCH)? {
            return Ok(());
        }
        self.branches.ensure(DEFAULT_BRANCH)?;
        self.branches.write_history(
            DEFAULT_BRANCH,
            &[HistoryEntry::Created(BranchHeader {
                purpose: MAIN_PURPOSE.to_string(),
                created_at: Utc::now(),
            })],
        )?;
        if !self.branches.metadata_exists(DEFAULT_BRANCH)? {
            self.branches.write_metadata(
                DEFAULT_BRANCH,
                &BranchMetadata::new(DEFAULT_BRANCH, MAIN_PURPOSE, None),
            )?;
        }
        info!(branch = DEFAULT_BRANCH, "created default branch");
        Ok(())
    }

    pub fn active_branch(&self) -> &str {
        &self.active
    }

    pub fn config(&self) -> &MemgitConfig {
        &self.config
    }

    /// Create the roadmap and `main`. Safe to repeat; a goal given on an
    /// existing roadmap is added under its goals.
    pub fn init(&self, goal: Option<&str>) -> Result<String> {
        let _span = OpSpan::enter("init", &self.active);
        self.ensure_main()?;
        let goal = goal.map(str::trim).filter(|g| !g.is_empty());
        let created = self.roadmap.ensure_initialized(goal)?;
        let mut out = if created {
            "Initialized memory with a new roadmap.".to_string()
        } else {
            "Memory already initialized; roadmap kept.".to_string()
        };
        if let (false, Some(goal)) = (created, goal) {
            self.roadmap.add_goal(goal)?;
            out.push_str(&format!(" Added goal: {goal}"));
        }
        out.push_str(&format!("\nActive branch: {}", self.active));
        Ok(out)
    }

    pub fn commit(&self, req: &CommitRequest) -> Result<CommitOutcome> {
        let _span = OpSpan::enter("commit", &self.active);
        CommitEngine::new(self.branches.clone(), self.roadmap.clone()).commit(&self.active, req)
    }

    pub fn create_branch(&mut self, name: &str, purpose: &str) -> Result<BranchCreated> {
        let _span = OpSpan::enter("branch", &self.active);
        let created = BranchEngine::new(self.branches.clone()).create(name, purpose, &self.active)?;
        self.active = created.name.clone();
        Ok(created)
    }

    pub fn switch_branch(&mut self, name: &str) -> Result<()> {
        let _span = OpSpan::enter("switch", &self.active);
        BranchEngine::new(self.branches.clone()).switch(&self.active, name)?;
        self.active = name.to_string();
        Ok(())
    }

    /// Merge `source` into the active branch.
    pub fn merge(&self, source: &str, summary: &str) -> Result<MergeOutcome> {
        let _span = OpSpan::enter("merge", &self.active);
        MergeEngine::new(
            self.branches.clone(),
            self.roadmap.clone(),
            MergeOptions {
                inline_history: self.config.inline_merge_history,
            },
        )
        .merge(&self.active, source, summary)
    }

    pub fn context(&self, req: &ContextRequest) -> Result<String> {
        ContextRetriever::new(
            self.branches.clone(),
            self.roadmap.clone(),
            self.config.branch_log_limit,
            self.config.log_window,
        )
        .retrieve(&self.active, req)
    }

    /// Append to the active branch's trace log; returns lines written.
    pub fn log(&self, entry: &LogEntry) -> Result<usize> {
        TraceLogger::new(self.branches.clone()).log(&self.active, entry)
    }

    /// Upsert a free-form key in the active branch's metadata.
    pub fn set_metadata(&self, key: &str, value: &str) -> Result<BranchMetadata> {
        let key = key.trim();
        if key.is_empty() {
            return Err(MemgitError::InvalidArgument(
                "metadata key must not be empty".to_string(),
            ));
        }
        let mut meta = match self.branches.read_metadata(&self.active)? {
            Some(meta) => meta,
            None => {
                let history = self.branches.read_history(&self.active)?;
                BranchMetadata::new(&self.active, &resolve_purpose(&self.active, &history), None)
            }
        };
        meta.extra.insert(key.to_string(), value.to_string());
        self.branches.write_metadata(&self.active, &meta)?;
        Ok(meta)
    }

    pub fn branches(&self) -> Result<Vec<BranchInfo>> {
        Ok(self
            .branches
            .list()?
            .into_iter()
            .map(|name| BranchInfo {
                active: name == self.active,
                name,
            })
            .collect())
    }

    // -- flat record index ---------------------------------------------------

    fn mirror(&self, text: String) {
        if let Err(e) = self.log(&LogEntry::freeform(text)) {
            obs::emit_side_write_failed("trace mirror", &e);
        }
    }

    pub fn remember(&self, record: LegacyRecord) -> Result<LegacyRecord> {
        let record = self.legacy.remember(record)?;
        self.mirror(format!(
            "Remembered {} ({}): {}",
            record.record_type, record.scope, record.content
        ));
        Ok(record)
    }

    pub fn recall(&self, query: &RecallQuery) -> Result<RecallResult> {
        self.legacy.recall(query)
    }

    pub fn update_memory(&self, req: &UpdateRequest) -> Result<UpdateOutcome> {
        let outcome = self.legacy.update(req)?;
        if let UpdateOutcome::Updated { after, .. } = &outcome {
            self.mirror(format!(
                "Updated {} ({}): {}",
                after.record_type, after.scope, after.content
            ));
        }
        Ok(outcome)
    }

    pub fn forget(&self, scope: &str, record_type: RecordType, reason: &str) -> Result<usize> {
        let removed = self.legacy.forget(scope, record_type, reason)?;
        if removed > 0 {
            self.mirror(format!(
                "Forgot {removed} {record_type} memory(ies) in scope '{}': {reason}",
                scope.trim()
            ));
        }
        Ok(removed)
    }

    pub fn list_memories(&self) -> Result<MemoryListing> {
        self.legacy.list()
    }

    /// Default recall limit from the configuration.
    pub fn recall_query(&self) -> RecallQuery {
        RecallQuery::new(self.config.recall_limit)
    }
}
