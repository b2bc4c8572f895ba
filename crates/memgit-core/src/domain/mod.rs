//! Domain models for memgit.
//!
//! Canonical definitions shared by the engines:
//! - `MemgitError`: error taxonomy reported at the tool boundary
//! - `RecordType`: categories of flat index records

pub mod error;
pub mod record_type;

pub use error::{MemgitError, Result};
pub use record_type::RecordType;
