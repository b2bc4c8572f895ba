//! Flat record index kept alongside the branch engine.
//!
//! Records are typed (`decision`, `learning`, ...) and scoped, searched with
//! an occurrence-count lexical score, and never silently discarded: updates
//! and deletions leave a copy in the audit document.

pub mod index;
pub mod record;
pub mod search;

pub use index::{
    LegacyMemoryIndex, MemoryListing, RecallHit, RecallQuery, RecallResult, UpdateOutcome,
    UpdateRequest, AUDIT_DOC,
};
pub use record::{AuditEntry, LegacyRecord};
pub use search::{score, tokenize};
