use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::StateError;
use crate::storage_traits::{validate_dir, validate_path, DocumentStore, StorageResult};

/// Filesystem-backed document store.
///
/// Document `a/b/c.log` lives at `<root>/a/b/c.log`. Writes go to a temp file
/// in the target directory and are renamed into place, so a reader never
/// observes a half-written document.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    /// Create a new `FsDocumentStore` rooted at `root`. Creates `root` if needed.
    pub fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| StateError::io(root.display().to_string(), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        validate_path(path)?;
        Ok(path.split('/').fold(self.root.clone(), |acc, c| acc.join(c)))
    }
}

impl DocumentStore for FsDocumentStore {
    fn read(&self, path: &str) -> StorageResult<String> {
        let full = self.resolve(path)?;
        match fs::read_to_string(&full) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(StateError::io(path, e)),
        }
    }

    fn write(&self, path: &str, content: &str) -> StorageResult<()> {
        let full = self.resolve(path)?;
        let dir = full.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir).map_err(|e| StateError::io(path, e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StateError::io(path, e))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| StateError::io(path, e))?;
        tmp.persist(&full)
            .map_err(|e| StateError::io(path, e.error))?;

        debug!(path = %path, bytes = content.len(), "document written");
        Ok(())
    }

    fn exists(&self, path: &str) -> StorageResult<bool> {
        Ok(self.resolve(path)?.is_file())
    }

    fn ensure_dir(&self, path: &str) -> StorageResult<()> {
        let full = self.resolve(path)?;
        fs::create_dir_all(&full).map_err(|e| StateError::io(path, e))
    }

    fn list(&self, dir: &str) -> StorageResult<Vec<String>> {
        validate_dir(dir)?;
        let full = if dir.is_empty() {
            self.root.clone()
        } else {
            self.resolve(dir)?
        };
        let read_dir = match fs::read_dir(&full) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StateError::io(dir, e)),
        };

        let mut names = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| StateError::io(dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            // Skip temp files left behind by an interrupted write.
            if name.starts_with(".tmp") {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> (tempfile::TempDir, FsDocumentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_document_reads_empty() {
        let (_dir, store) = make_store();
        assert_eq!(store.read("branches/main/trace.log").unwrap(), "");
        assert!(!store.exists("branches/main/trace.log").unwrap());
    }

    #[test]
    fn write_then_read_roundtrip() {
        let (dir, store) = make_store();
        store.write("branches/main/trace.log", "hello\n").unwrap();
        assert_eq!(store.read("branches/main/trace.log").unwrap(), "hello\n");
        assert!(dir.path().join("branches").join("main").join("trace.log").is_file());
    }

    #[test]
    fn write_replaces_whole_document() {
        let (_dir, store) = make_store();
        store.write("roadmap.md", "first version, much longer").unwrap();
        store.write("roadmap.md", "second").unwrap();
        assert_eq!(store.read("roadmap.md").unwrap(), "second");
    }

    #[test]
    fn append_concatenates() {
        let (_dir, store) = make_store();
        store.append("a.log", "one\n").unwrap();
        store.append("a.log", "two\n").unwrap();
        assert_eq!(store.read("a.log").unwrap(), "one\ntwo\n");
    }

    #[test]
    fn exists_is_false_for_directories() {
        let (_dir, store) = make_store();
        store.ensure_dir("branches/exp").unwrap();
        assert!(!store.exists("branches/exp").unwrap());
        assert_eq!(store.list("branches").unwrap(), vec!["exp".to_string()]);
    }

    #[test]
    fn list_missing_dir_is_empty_and_sorted_otherwise() {
        let (_dir, store) = make_store();
        assert!(store.list("legacy").unwrap().is_empty());
        store.write("legacy/2026-01-02.log", "").unwrap();
        store.write("legacy/2026-01-01.log", "").unwrap();
        assert_eq!(
            store.list("legacy").unwrap(),
            vec!["2026-01-01.log".to_string(), "2026-01-02.log".to_string()]
        );
    }

    #[test]
    fn list_root_with_empty_dir() {
        let (_dir, store) = make_store();
        store.write("2026-03-01.log", "x").unwrap();
        store.write("deleted.log", "y").unwrap();
        assert_eq!(
            store.list("").unwrap(),
            vec!["2026-03-01.log".to_string(), "deleted.log".to_string()]
        );
    }

    #[test]
    fn escaping_paths_are_rejected() {
        let (_dir, store) = make_store();
        assert!(matches!(
            store.read("../outside"),
            Err(StateError::InvalidPath(_))
        ));
    }
}
