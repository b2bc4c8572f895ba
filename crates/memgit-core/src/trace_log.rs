//! Fine-grained trace log entries between commits.

use chrono::{DateTime, Utc};
use memgit_state::BranchStore;

use crate::domain::{MemgitError, Result};
use crate::obs;
use crate::render::timestamp;

/// One trace entry. Freeform text wins over the structured triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Structured {
        observation: Option<String>,
        thought: Option<String>,
        action: Option<String>,
    },
    Freeform(String),
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl LogEntry {
    /// Build an entry from optional parts; at least one must be non-empty.
    pub fn from_parts(
        observation: Option<String>,
        thought: Option<String>,
        action: Option<String>,
        freeform: Option<String>,
    ) -> Result<Self> {
        if let Some(text) = non_empty(freeform) {
            return Ok(LogEntry::Freeform(text));
        }
        let (observation, thought, action) =
            (non_empty(observation), non_empty(thought), non_empty(action));
        if observation.is_none() && thought.is_none() && action.is_none() {
            return Err(MemgitError::InvalidArgument(
                "log entry needs freeform text or at least one of observation/thought/action"
                    .to_string(),
            ));
        }
        Ok(LogEntry::Structured {
            observation,
            thought,
            action,
        })
    }

    pub fn freeform(text: impl Into<String>) -> Self {
        LogEntry::Freeform(text.into())
    }

    /// Render with the timestamp on its own first line.
    pub fn render(&self, at: &DateTime<Utc>) -> String {
        let mut out = format!("[{}]\n", timestamp(at));
        match self {
            LogEntry::Freeform(text) => {
                out.push_str(text);
                out.push('\n');
            }
            LogEntry::Structured {
                observation,
                thought,
                action,
            } => {
                for (label, value) in [
                    ("Observation", observation),
                    ("Thought", thought),
                    ("Action", action),
                ] {
                    if let Some(v) = value {
                        out.push_str(&format!("{label}: {v}\n"));
                    }
                }
            }
        }
        out
    }
}

pub struct TraceLogger {
    branches: BranchStore,
}

impl TraceLogger {
    pub fn new(branches: BranchStore) -> Self {
        Self { branches }
    }

    /// Append `entry` to `branch`'s trace log, creating storage on demand.
    /// Returns the number of lines written.
    pub fn log(&self, branch: &str, entry: &LogEntry) -> Result<usize> {
        self.branches.ensure(branch)?;
        let text = entry.render(&Utc::now());
        let mut existing = self.branches.read_trace(branch)?;
        if !existing.is_empty() && !existing.ends_with('\n') {
            existing.push('\n');
        }
        existing.push_str(&text);
        self.branches.write_trace(branch, &existing)?;

        let lines = text.lines().count();
        obs::emit_trace_appended(branch, lines);
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memgit_state::fakes::MemoryDocumentStore;
    use std::sync::Arc;

    #[test]
    fn freeform_takes_precedence() {
        let e = LogEntry::from_parts(
            Some("saw".into()),
            None,
            None,
            Some("just a note".into()),
        )
        .unwrap();
        assert_eq!(e, LogEntry::Freeform("just a note".into()));
    }

    #[test]
    fn blank_freeform_falls_back_to_structured() {
        let e = LogEntry::from_parts(None, Some("hmm".into()), None, Some("   ".into())).unwrap();
        assert!(matches!(e, LogEntry::Structured { thought: Some(_), .. }));
    }

    #[test]
    fn empty_entry_is_rejected() {
        let err = LogEntry::from_parts(None, Some(" ".into()), None, None).unwrap_err();
        assert!(matches!(err, MemgitError::InvalidArgument(_)));
    }

    #[test]
    fn structured_render_only_present_parts() {
        let e = LogEntry::from_parts(Some("tests fail".into()), None, Some("rerun".into()), None)
            .unwrap();
        let text = e.render(&Utc::now());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('[') && lines[0].ends_with(']'));
        assert_eq!(lines[1], "Observation: tests fail");
        assert_eq!(lines[2], "Action: rerun");
    }

    #[test]
    fn log_creates_storage_and_appends() {
        let branches = BranchStore::new(Arc::new(MemoryDocumentStore::new()));
        let logger = TraceLogger::new(branches.clone());
        assert_eq!(logger.log("fresh", &LogEntry::freeform("one")).unwrap(), 2);
        logger.log("fresh", &LogEntry::freeform("two")).unwrap();
        let trace = branches.read_trace("fresh").unwrap();
        assert_eq!(trace.lines().count(), 4);
        assert!(trace.contains("one\n["));
        assert!(trace.ends_with("two\n"));
    }
}
