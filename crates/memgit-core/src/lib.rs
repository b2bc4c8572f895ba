//! memgit Core Library
//!
//! Versioned agent memory: branches, commits, merges and trace logs over
//! plain documents, plus a flat typed record index with lexical recall.
//!
//! ## Layer 1 - Engine
//!
//! - `Session`: the handle every operation runs through
//! - `CommitEngine`, `BranchEngine`, `MergeEngine`: history mutations
//! - `ContextRetriever`: read-only views at six granularities
//! - `TraceLogger`: fine-grained notes between commits
//! - `LegacyMemoryIndex`: date-partitioned records with audit-logged deletes
//! - `tools`: the JSON tool-call boundary

pub mod branch;
pub mod commit;
pub mod config;
pub mod context;
pub mod domain;
pub mod legacy;
pub mod merge;
pub mod obs;
pub mod render;
pub mod session;
pub mod telemetry;
pub mod tools;
pub mod trace_log;

pub use branch::{BranchCreated, BranchEngine};
pub use commit::{fold, CommitEngine, CommitOutcome, CommitRequest, INITIAL_SUMMARY};
pub use config::MemgitConfig;
pub use context::{log_window, ContextLevel, ContextRequest, ContextRetriever, LogWindow};
pub use domain::{MemgitError, RecordType, Result};
pub use legacy::{
    AuditEntry, LegacyMemoryIndex, LegacyRecord, MemoryListing, RecallQuery, RecallResult,
    UpdateOutcome, UpdateRequest,
};
pub use merge::{MergeEngine, MergeOptions, MergeOutcome};
pub use session::{BranchInfo, Session};
pub use tools::{catalog, dispatch, ToolSpec};
pub use trace_log::{LogEntry, TraceLogger};

pub use memgit_state::{CommitId, HistoryEntry};

/// memgit version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
