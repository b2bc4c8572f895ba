//! Runtime configuration for a memgit session.
//!
//! Sources, lowest to highest precedence:
//! 1. built-in defaults
//! 2. a TOML file (`memgit.toml` in the working directory, or an explicit path)
//! 3. environment variables (`MEMGIT_ROOT`, `MEMGIT_LEGACY_DIR`,
//!    `MEMGIT_INLINE_MERGE_HISTORY`)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{MemgitError, Result};

/// Default config file looked up in the working directory.
pub const CONFIG_FILE: &str = "memgit.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemgitConfig {
    /// Memory root holding the roadmap, pointer file and branches
    pub root: PathBuf,
    /// Flat record index directory (default: `<root>/legacy`)
    pub legacy_dir: Option<PathBuf>,
    /// Commits shown by the `branch` context level
    pub branch_log_limit: usize,
    /// Default trace-log window size
    pub log_window: usize,
    /// Default `recall` limit
    pub recall_limit: usize,
    /// Inline the full source history into merge entries
    pub inline_merge_history: bool,
}

impl Default for MemgitConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".memgit"),
            legacy_dir: None,
            branch_log_limit: 10,
            log_window: 20,
            recall_limit: 20,
            inline_merge_history: true,
        }
    }
}

impl MemgitConfig {
    /// Set a custom memory root
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Set a custom flat index directory
    pub fn with_legacy_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.legacy_dir = Some(dir.into());
        self
    }

    /// Directory of the flat record index.
    pub fn legacy_root(&self) -> PathBuf {
        self.legacy_dir
            .clone()
            .unwrap_or_else(|| self.root.join("legacy"))
    }

    /// Parse a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| MemgitError::Config(e.to_string()))
    }

    /// Resolve the configuration from file and environment.
    ///
    /// An explicit `path` must exist; without one, `memgit.toml` in the
    /// working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => Some(std::fs::read_to_string(p).map_err(|e| {
                MemgitError::Config(format!("cannot read {}: {e}", p.display()))
            })?),
            None => std::fs::read_to_string(CONFIG_FILE).ok(),
        };
        let config = match file {
            Some(text) => Self::from_toml_str(&text)?,
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay environment values obtained through `lookup`.
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(root) = lookup("MEMGIT_ROOT").filter(|v| !v.is_empty()) {
            self.root = PathBuf::from(root);
        }
        if let Some(dir) = lookup("MEMGIT_LEGACY_DIR").filter(|v| !v.is_empty()) {
            self.legacy_dir = Some(PathBuf::from(dir));
        }
        if let Some(flag) = lookup("MEMGIT_INLINE_MERGE_HISTORY") {
            self.inline_merge_history = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(MemgitError::Config(format!(
                        "MEMGIT_INLINE_MERGE_HISTORY must be a boolean, got {other:?}"
                    )))
                }
            };
        }
        Ok(self)
    }
}
