//! Branch creation and the active-branch pointer.

use chrono::Utc;
use memgit_state::{validate_branch_name, BranchHeader, BranchMetadata, BranchStore, HistoryEntry};

use crate::domain::{MemgitError, Result};
use crate::obs;

/// Result of creating a branch.
#[derive(Debug, Clone)]
pub struct BranchCreated {
    pub name: String,
    pub purpose: String,
    pub parent: String,
}

impl std::fmt::Display for BranchCreated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Created branch '{}' from '{}' and switched to it.\nPurpose: {}",
            self.name, self.parent, self.purpose
        )
    }
}

pub struct BranchEngine {
    branches: BranchStore,
}

impl BranchEngine {
    pub fn new(branches: BranchStore) -> Self {
        Self { branches }
    }

    /// Create `name` and point the active branch at it.
    ///
    /// The history starts with a creation header only; the first real commit
    /// gets the `"Initial commit"` summary like on any other branch.
    pub fn create(&self, name: &str, purpose: &str, parent: &str) -> Result<BranchCreated> {
        validate_branch_name(name)?;
        if self.branches.exists(name)? {
            return Err(MemgitError::InvalidArgument(format!(
                "branch '{name}' already exists; use switch"
            )));
        }
        let purpose = purpose.trim();
        let purpose = if purpose.is_empty() {
            crate::commit::default_purpose(name)
        } else {
            purpose.to_string()
        };

        self.branches.ensure(name)?;
        self.branches.write_history(
            name,
            &[HistoryEntry::Created(BranchHeader {
                purpose: purpose.clone(),
                created_at: Utc::now(),
            })],
        )?;
        self.branches.write_trace(name, "")?;
        self.branches
            .write_metadata(name, &BranchMetadata::new(name, &purpose, Some(parent)))?;
        self.branches.write_active(name)?;

        obs::emit_branch_created(name, parent);
        Ok(BranchCreated {
            name: name.to_string(),
            purpose,
            parent: parent.to_string(),
        })
    }

    /// Point the active branch at an existing branch.
    pub fn switch(&self, from: &str, to: &str) -> Result<()> {
        validate_branch_name(to)?;
        if !self.branches.exists(to)? {
            return Err(MemgitError::NotFound(format!("branch '{to}'")));
        }
        self.branches.write_active(to)?;
        obs::emit_branch_switched(from, to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memgit_state::fakes::MemoryDocumentStore;
    use std::sync::Arc;

    fn engine() -> (BranchStore, BranchEngine) {
        let branches = BranchStore::new(Arc::new(MemoryDocumentStore::new()));
        (branches.clone(), BranchEngine::new(branches))
    }

    #[test]
    fn create_writes_all_three_documents_and_switches() {
        let (branches, engine) = engine();
        let created = engine.create("exp", "test alt", "main").unwrap();
        assert_eq!(created.purpose, "test alt");
        assert!(branches.exists("exp").unwrap());
        assert_eq!(branches.read_trace("exp").unwrap(), "");
        assert_eq!(branches.read_active().unwrap(), "exp");

        let meta = branches.read_metadata("exp").unwrap().unwrap();
        assert_eq!(meta.name, "exp");
        assert_eq!(meta.parent.as_deref(), Some("main"));

        let history = branches.read_history("exp").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].recorded_purpose(), Some("test alt"));
    }

    #[test]
    fn create_refuses_to_overwrite() {
        let (_branches, engine) = engine();
        engine.create("exp", "one", "main").unwrap();
        let err = engine.create("exp", "two", "main").unwrap_err();
        assert!(matches!(err, MemgitError::InvalidArgument(_)));
    }

    #[test]
    fn blank_purpose_gets_default() {
        let (_branches, engine) = engine();
        assert_eq!(engine.create("exp", "  ", "main").unwrap().purpose, "Branch: exp");
    }

    #[test]
    fn switch_to_missing_branch_is_not_found() {
        let (branches, engine) = engine();
        let err = engine.switch("main", "ghost").unwrap_err();
        assert!(matches!(err, MemgitError::NotFound(_)));
        assert_eq!(branches.read_active().unwrap(), "main");
    }

    #[test]
    fn switch_requires_history_not_just_a_directory() {
        let (branches, engine) = engine();
        branches.ensure("half").unwrap();
        branches.write_trace("half", "x\n").unwrap();
        assert!(engine.switch("main", "half").is_err());
    }
}
