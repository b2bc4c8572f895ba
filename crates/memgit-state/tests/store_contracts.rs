//! Contract tests for DocumentStore, BranchStore and RoadmapStore.
//!
//! Every test runs against both the filesystem store and the in-memory fake;
//! any conforming implementation must pass these.

use std::sync::Arc;

use chrono::Utc;
use memgit_state::fakes::MemoryDocumentStore;
use memgit_state::{
    BranchHeader, BranchStore, CommitId, CommitRecord, DocumentStore, FsDocumentStore,
    HistoryEntry, RoadmapStore, StateError,
};

fn stores() -> Vec<(Option<tempfile::TempDir>, Arc<dyn DocumentStore>)> {
    let dir = tempfile::tempdir().unwrap();
    let fs = FsDocumentStore::new(dir.path()).unwrap();
    vec![
        (Some(dir), Arc::new(fs) as Arc<dyn DocumentStore>),
        (None, Arc::new(MemoryDocumentStore::new()) as Arc<dyn DocumentStore>),
    ]
}

// ===========================================================================
// DocumentStore contract tests
// ===========================================================================

#[test]
fn missing_documents_read_as_empty() {
    for (_guard, docs) in stores() {
        assert_eq!(docs.read("nope/never.log").unwrap(), "");
        assert!(!docs.exists("nope/never.log").unwrap());
    }
}

#[test]
fn write_replaces_and_append_concatenates() {
    for (_guard, docs) in stores() {
        docs.write("a/b.log", "v1").unwrap();
        docs.write("a/b.log", "v2").unwrap();
        docs.append("a/b.log", "+tail").unwrap();
        assert_eq!(docs.read("a/b.log").unwrap(), "v2+tail");
    }
}

#[test]
fn parent_components_are_rejected() {
    for (_guard, docs) in stores() {
        let err = docs.write("../escape.log", "x").unwrap_err();
        assert!(matches!(err, StateError::InvalidPath(_)));
    }
}

// ===========================================================================
// BranchStore contract tests
// ===========================================================================

#[test]
fn history_document_is_the_existence_witness() {
    for (_guard, docs) in stores() {
        let branches = BranchStore::new(docs);
        branches.ensure("exp").unwrap();
        branches.write_trace("exp", "notes\n").unwrap();
        assert!(!branches.exists("exp").unwrap());

        branches
            .append_history(
                "exp",
                &HistoryEntry::Created(BranchHeader {
                    purpose: "alt".to_string(),
                    created_at: Utc::now(),
                }),
            )
            .unwrap();
        assert!(branches.exists("exp").unwrap());
        assert_eq!(branches.list().unwrap(), vec!["exp".to_string()]);
    }
}

#[test]
fn history_survives_a_corrupt_line_in_the_middle() {
    for (_guard, docs) in stores() {
        let branches = BranchStore::new(docs.clone());
        let commit = |seq, msg: &str| {
            HistoryEntry::Commit(CommitRecord {
                id: CommitId::next(seq),
                message: msg.to_string(),
                ..Default::default()
            })
        };
        branches.append_history("main", &commit(1, "one")).unwrap();
        docs.append("branches/main/history.jsonl", "garbage line\n")
            .unwrap();
        branches.append_history("main", &commit(2, "two")).unwrap();

        let messages: Vec<String> = branches
            .read_history("main")
            .unwrap()
            .iter()
            .filter_map(|e| e.as_commit().map(|c| c.message.clone()))
            .collect();
        assert_eq!(messages, vec!["one".to_string(), "two".to_string()]);
    }
}

#[test]
fn active_pointer_persists_across_store_instances() {
    let dir = tempfile::tempdir().unwrap();
    {
        let docs = Arc::new(FsDocumentStore::new(dir.path()).unwrap());
        BranchStore::new(docs).write_active("exp").unwrap();
    }
    let raw = std::fs::read_to_string(dir.path().join("ACTIVE_BRANCH")).unwrap();
    assert_eq!(raw.trim(), "exp");

    std::fs::write(dir.path().join("ACTIVE_BRANCH"), "  exp  \n\n").unwrap();
    let docs = Arc::new(FsDocumentStore::new(dir.path()).unwrap());
    assert_eq!(BranchStore::new(docs).read_active().unwrap(), "exp");
}

#[test]
fn invalid_branch_names_never_touch_storage() {
    for (_guard, docs) in stores() {
        let branches = BranchStore::new(docs.clone());
        assert!(matches!(
            branches.ensure("../x"),
            Err(StateError::InvalidBranchName(_))
        ));
        assert!(docs.list("branches").unwrap().is_empty());
    }
}

#[test]
fn every_creatable_branch_is_listed() {
    for (_guard, docs) in stores() {
        let branches = BranchStore::new(docs);
        for hidden in [".tmpwork", ".scratch"] {
            assert!(matches!(
                branches.ensure(hidden),
                Err(StateError::InvalidBranchName(_))
            ));
        }
        for name in ["main", "tmpwork", "exp.tmp"] {
            branches
                .append_history(
                    name,
                    &HistoryEntry::Created(BranchHeader {
                        purpose: String::new(),
                        created_at: Utc::now(),
                    }),
                )
                .unwrap();
        }
        assert_eq!(
            branches.list().unwrap(),
            vec!["exp.tmp".to_string(), "main".to_string(), "tmpwork".to_string()]
        );
    }
}

// ===========================================================================
// RoadmapStore contract tests
// ===========================================================================

#[test]
fn roadmap_milestones_are_dated() {
    for (_guard, docs) in stores() {
        let roadmap = RoadmapStore::new(docs);
        roadmap.ensure_initialized(Some("remember things")).unwrap();
        roadmap.append_milestone("main: checkpoint").unwrap();
        let today = Utc::now().format("%Y-%m-%d").to_string();
        assert!(roadmap
            .read()
            .unwrap()
            .contains(&format!("- [{today}] main: checkpoint")));
    }
}
