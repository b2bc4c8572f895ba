//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryDocumentStore`, which satisfies the `DocumentStore`
//! contract without touching the filesystem.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::storage_traits::{validate_dir, validate_path, DocumentStore, StorageResult};

// ---------------------------------------------------------------------------
// MemoryDocumentStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Tree {
    docs: BTreeMap<String, String>,
    dirs: BTreeSet<String>,
}

/// In-memory document store backed by a `BTreeMap<path, content>`.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    tree: Mutex<Tree>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held.
    pub fn len(&self) -> usize {
        self.tree.lock().unwrap().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parent_dirs(path: &str) -> Vec<String> {
    let parts: Vec<&str> = path.split('/').collect();
    (1..parts.len()).map(|i| parts[..i].join("/")).collect()
}

impl DocumentStore for MemoryDocumentStore {
    fn read(&self, path: &str) -> StorageResult<String> {
        validate_path(path)?;
        let tree = self.tree.lock().unwrap();
        Ok(tree.docs.get(path).cloned().unwrap_or_default())
    }

    fn write(&self, path: &str, content: &str) -> StorageResult<()> {
        validate_path(path)?;
        let mut tree = self.tree.lock().unwrap();
        for dir in parent_dirs(path) {
            tree.dirs.insert(dir);
        }
        tree.docs.insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &str) -> StorageResult<bool> {
        validate_path(path)?;
        let tree = self.tree.lock().unwrap();
        Ok(tree.docs.contains_key(path))
    }

    fn ensure_dir(&self, path: &str) -> StorageResult<()> {
        validate_path(path)?;
        let mut tree = self.tree.lock().unwrap();
        for dir in parent_dirs(path) {
            tree.dirs.insert(dir);
        }
        tree.dirs.insert(path.to_string());
        Ok(())
    }

    fn list(&self, dir: &str) -> StorageResult<Vec<String>> {
        validate_dir(dir)?;
        let tree = self.tree.lock().unwrap();
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };
        let names: BTreeSet<String> = tree
            .docs
            .keys()
            .chain(tree.dirs.iter())
            .filter_map(|p| p.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .map(str::to_string)
            .collect();
        Ok(names.into_iter().collect())
    }
}
