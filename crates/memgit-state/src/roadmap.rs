//! The single cross-branch roadmap document.

use std::sync::Arc;

use chrono::Utc;

use crate::storage_traits::DocumentStore;
use crate::Result;

pub const ROADMAP_DOC: &str = "roadmap.md";

const GOALS_HEADING: &str = "## Goals";
const MILESTONES_HEADING: &str = "## Milestones";

/// Roadmap: free-text sections plus an append-only `## Milestones` list.
#[derive(Clone)]
pub struct RoadmapStore {
    docs: Arc<dyn DocumentStore>,
}

impl RoadmapStore {
    pub fn new(docs: Arc<dyn DocumentStore>) -> Self {
        Self { docs }
    }

    pub fn exists(&self) -> Result<bool> {
        self.docs.exists(ROADMAP_DOC)
    }

    pub fn read(&self) -> Result<String> {
        self.docs.read(ROADMAP_DOC)
    }

    pub fn write(&self, content: &str) -> Result<()> {
        self.docs.write(ROADMAP_DOC, content)
    }

    /// Create the roadmap from the template if it does not exist yet.
    /// Returns `true` when a new document was written.
    pub fn ensure_initialized(&self, goal: Option<&str>) -> Result<bool> {
        if self.exists()? {
            return Ok(false);
        }
        let goal_line = match goal.map(str::trim).filter(|g| !g.is_empty()) {
            Some(g) => format!("- {g}\n"),
            None => String::new(),
        };
        self.write(&format!(
            "# Project Roadmap\n\n{GOALS_HEADING}\n\n{goal_line}\n{MILESTONES_HEADING}\n\n"
        ))?;
        Ok(true)
    }

    /// Add a goal line at the end of the Goals section.
    pub fn add_goal(&self, goal: &str) -> Result<()> {
        let doc = self.read()?;
        let line = format!("- {}\n", goal.trim());
        let updated = match doc.find(MILESTONES_HEADING) {
            Some(idx) => {
                let (head, tail) = doc.split_at(idx);
                let head = head.trim_end_matches('\n');
                format!("{head}\n{line}\n{tail}")
            }
            None => {
                let mut doc = doc;
                if !doc.is_empty() && !doc.ends_with('\n') {
                    doc.push('\n');
                }
                doc.push_str(&line);
                doc
            }
        };
        self.write(&updated)
    }

    /// Append `- [YYYY-MM-DD] <text>` to the milestone list.
    pub fn append_milestone(&self, text: &str) -> Result<()> {
        let mut doc = self.read()?;
        if !doc.contains(MILESTONES_HEADING) {
            if !doc.is_empty() && !doc.ends_with('\n') {
                doc.push('\n');
            }
            if !doc.is_empty() {
                doc.push('\n');
            }
            doc.push_str(MILESTONES_HEADING);
            doc.push_str("\n\n");
        } else if !doc.ends_with('\n') {
            doc.push('\n');
        }
        doc.push_str(&format!("- [{}] {}\n", Utc::now().format("%Y-%m-%d"), text));
        self.write(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::MemoryDocumentStore;

    fn roadmap() -> RoadmapStore {
        RoadmapStore::new(Arc::new(MemoryDocumentStore::new()))
    }

    #[test]
    fn initialize_once() {
        let r = roadmap();
        assert!(r.ensure_initialized(Some("ship v1")).unwrap());
        assert!(!r.ensure_initialized(Some("other")).unwrap());
        let doc = r.read().unwrap();
        assert!(doc.contains("- ship v1"));
        assert!(!doc.contains("other"));
    }

    #[test]
    fn milestones_append_in_order() {
        let r = roadmap();
        r.ensure_initialized(None).unwrap();
        r.append_milestone("main: first (0001-aaaa)").unwrap();
        r.append_milestone("Merged exp into main: ok").unwrap();
        let doc = r.read().unwrap();
        let first = doc.find("main: first").unwrap();
        let second = doc.find("Merged exp").unwrap();
        assert!(first < second);
        assert!(doc.lines().any(|l| l.starts_with("- [") && l.ends_with("main: first (0001-aaaa)")));
    }

    #[test]
    fn milestone_creates_heading_on_missing_roadmap() {
        let r = roadmap();
        r.append_milestone("x").unwrap();
        let doc = r.read().unwrap();
        assert!(doc.starts_with("## Milestones\n\n- ["));
    }

    #[test]
    fn goals_insert_before_milestones() {
        let r = roadmap();
        r.ensure_initialized(Some("one")).unwrap();
        r.append_milestone("m").unwrap();
        r.add_goal("two").unwrap();
        let doc = r.read().unwrap();
        let two = doc.find("- two").unwrap();
        let milestones = doc.find("## Milestones").unwrap();
        assert!(two < milestones);
        assert!(doc.find("- one").unwrap() < two);
    }
}
