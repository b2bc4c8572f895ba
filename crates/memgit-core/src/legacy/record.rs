//! One-line `key=value` codec for flat memory records.
//!
//! ```text
//! timestamp=2026-10-18T09:12:44+00:00 type=decision scope="auth" content="use \"jwt\"" tags="api,security"
//! ```
//!
//! Quoted values escape `\`, `"`, newlines and carriage returns. Unknown keys are ignored on
//! read; lines missing a required key or with an unknown type are skipped.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{DateTime, SubsecRound, Utc};
use regex::Regex;

use crate::domain::RecordType;
use crate::render::timestamp;

fn field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(\w+)=(?:"((?:[^"\\]|\\.)*)"|(\S+))"#).expect("field pattern is valid")
    })
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

pub fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn parse_fields(line: &str) -> HashMap<String, String> {
    field_pattern()
        .captures_iter(line)
        .filter_map(|cap| {
            let key = cap.get(1)?.as_str().to_string();
            let value = match (cap.get(2), cap.get(3)) {
                (Some(quoted), _) => unescape(quoted.as_str()),
                (None, Some(bare)) => bare.as_str().to_string(),
                (None, None) => String::new(),
            };
            Some((key, value))
        })
        .collect()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// A flat memory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRecord {
    pub timestamp: DateTime<Utc>,
    pub record_type: RecordType,
    pub scope: String,
    pub content: String,
    pub issue: Option<String>,
    pub tags: Vec<String>,
}

impl LegacyRecord {
    pub fn new(record_type: RecordType, scope: &str, content: &str) -> Self {
        Self {
            // Second precision, so a stored record reads back equal.
            timestamp: Utc::now().trunc_subsecs(0),
            record_type,
            scope: scope.trim().to_string(),
            content: content.trim().to_string(),
            issue: None,
            tags: Vec::new(),
        }
    }

    pub fn with_issue(mut self, issue: Option<String>) -> Self {
        self.issue = issue.map(|i| i.trim().to_string()).filter(|i| !i.is_empty());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = normalize_tags(tags);
        self
    }

    pub fn to_line(&self) -> String {
        let mut line = format!(
            "timestamp={} type={} scope=\"{}\" content=\"{}\"",
            timestamp(&self.timestamp),
            self.record_type,
            escape(&self.scope),
            escape(&self.content)
        );
        if let Some(issue) = &self.issue {
            line.push_str(&format!(" issue=\"{}\"", escape(issue)));
        }
        if !self.tags.is_empty() {
            line.push_str(&format!(" tags=\"{}\"", escape(&self.tags.join(","))));
        }
        line
    }

    pub fn parse(line: &str) -> Option<Self> {
        Self::from_fields(&parse_fields(line))
    }

    fn from_fields(fields: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            timestamp: parse_timestamp(fields.get("timestamp")?)?,
            record_type: fields.get("type")?.parse().ok()?,
            scope: fields.get("scope")?.clone(),
            content: fields.get("content")?.clone(),
            issue: fields.get("issue").filter(|i| !i.is_empty()).cloned(),
            tags: fields
                .get("tags")
                .map(|t| normalize_tags(t.split(',').map(str::to_string).collect()))
                .unwrap_or_default(),
        })
    }
}

impl std::fmt::Display for LegacyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.timestamp.format("%Y-%m-%d"),
            self.record_type,
            self.scope,
            self.content
        )?;
        if let Some(issue) = &self.issue {
            write!(f, " [issue: {issue}]")?;
        }
        if !self.tags.is_empty() {
            write!(f, " [tags: {}]", self.tags.join(", "))?;
        }
        Ok(())
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// A record preserved at deletion or update time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub record: LegacyRecord,
    pub deleted_at: DateTime<Utc>,
    pub reason: String,
}

impl AuditEntry {
    pub fn new(record: LegacyRecord, reason: &str) -> Self {
        Self {
            record,
            deleted_at: Utc::now().trunc_subsecs(0),
            reason: reason.to_string(),
        }
    }

    pub fn to_line(&self) -> String {
        format!(
            "{} deleted_at={} reason=\"{}\"",
            self.record.to_line(),
            timestamp(&self.deleted_at),
            escape(&self.reason)
        )
    }

    pub fn parse(line: &str) -> Option<Self> {
        let fields = parse_fields(line);
        Some(Self {
            record: LegacyRecord::from_fields(&fields)?,
            deleted_at: parse_timestamp(fields.get("deleted_at")?)?,
            reason: fields.get("reason").cloned().unwrap_or_default(),
        })
    }
}
