//! memgit-state: document persistence for memgit
//!
//! This crate provides the persistence layer for versioned agent memory.
//! Everything is stored as whole text documents under a root directory; there
//! is no database and no locking.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: document layout, lenient decoding, atomic whole-document writes.
//!
//! ## Key Components
//!
//! - `DocumentStore`: read/replace/list text documents (filesystem or in-memory)
//! - `BranchStore`: per-branch history, trace log and metadata, plus the
//!   active-branch pointer
//! - `RoadmapStore`: the single cross-branch roadmap
//! - `HistoryEntry`: structured history records (created / commit / merge)

mod branch_store;
mod error;
pub mod fakes;
mod fs_store;
mod roadmap;
mod schema;
pub mod storage_traits;

pub use branch_store::{
    validate_branch_name, BranchStore, ACTIVE_BRANCH_DOC, BRANCHES_DIR, DEFAULT_BRANCH,
    HISTORY_DOC, METADATA_DOC, TRACE_DOC,
};
pub use error::StateError;
pub use fs_store::FsDocumentStore;
pub use roadmap::{RoadmapStore, ROADMAP_DOC};
pub use schema::{
    decode_history, encode_history_line, BranchHeader, BranchMetadata, CommitId, CommitRecord,
    HistoryEntry, MergeRecord,
};
pub use storage_traits::{doc_path, ContentDigest, DocumentStore, StorageResult};

/// Result type for memgit-state operations
pub type Result<T> = std::result::Result<T, StateError>;
