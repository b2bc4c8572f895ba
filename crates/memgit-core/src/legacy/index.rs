//! Date-partitioned flat record store with lexical recall.
//!
//! Records live in `<YYYY-MM-DD>.log` documents named after their creation
//! day. Updates and deletions first copy the affected record into
//! `deleted.log`, then rewrite the owning document.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, OnceLock};

use chrono::Utc;
use memgit_state::DocumentStore;
use regex::Regex;
use tracing::{debug, warn};

use super::record::{AuditEntry, LegacyRecord};
use super::search::{score, tokenize};
use crate::domain::{MemgitError, RecordType, Result};
use crate::obs;

/// Audit document holding superseded and removed records.
pub const AUDIT_DOC: &str = "deleted.log";

fn date_doc_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}\.log$").expect("date pattern is valid"))
}

/// A record together with where it is stored.
#[derive(Debug, Clone)]
struct Located {
    doc: String,
    line: usize,
    record: LegacyRecord,
}

/// Filters for [`LegacyMemoryIndex::recall`].
#[derive(Debug, Clone)]
pub struct RecallQuery {
    pub scope: Option<String>,
    pub record_type: Option<RecordType>,
    pub query: Option<String>,
    pub limit: usize,
}

impl RecallQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            scope: None,
            record_type: None,
            query: None,
            limit,
        }
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = Some(record_type);
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecallHit {
    pub record: LegacyRecord,
    /// Present when the recall had a query
    pub score: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct RecallResult {
    pub hits: Vec<RecallHit>,
    /// Records in the index
    pub total: usize,
    /// Records left after scope/type/query filtering
    pub filtered: usize,
}

impl RecallResult {
    pub fn shown(&self) -> usize {
        self.hits.len()
    }
}

impl std::fmt::Display for RecallResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.hits.is_empty() {
            return write!(
                f,
                "No memories found ({} total, {} matched filters).",
                self.total, self.filtered
            );
        }
        writeln!(
            f,
            "Found {} memories (showing {} of {} total):",
            self.filtered,
            self.shown(),
            self.total
        )?;
        for (i, hit) in self.hits.iter().enumerate() {
            write!(f, "\n{}. {}", i + 1, hit.record)?;
            if let Some(score) = hit.score {
                write!(f, " (score {score})")?;
            }
        }
        Ok(())
    }
}

/// Arguments of [`LegacyMemoryIndex::update`].
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub scope: String,
    pub record_type: RecordType,
    pub content: String,
    pub query: Option<String>,
    pub issue: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    /// No record with this scope and type; nothing was written.
    NotFound { scope: String, record_type: RecordType },
    Updated {
        before: LegacyRecord,
        after: LegacyRecord,
    },
}

impl std::fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateOutcome::NotFound { scope, record_type } => write!(
                f,
                "No {record_type} memory found for scope '{scope}'. Use remember to create one."
            ),
            UpdateOutcome::Updated { before, after } => write!(
                f,
                "Updated {} memory in scope '{}'.\nOld: {}\nNew: {}",
                after.record_type, after.scope, before.content, after.content
            ),
        }
    }
}

/// Frequency summary of the index.
#[derive(Debug, Clone, Default)]
pub struct MemoryListing {
    pub total: usize,
    /// (scope, count, types seen in scope), most frequent first
    pub scopes: Vec<(String, usize, Vec<RecordType>)>,
    /// (type, count), most frequent first
    pub types: Vec<(RecordType, usize)>,
}

impl std::fmt::Display for MemoryListing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.total == 0 {
            return write!(f, "No memories stored yet.");
        }
        writeln!(f, "{} memories.", self.total)?;
        writeln!(f, "\nScopes:")?;
        for (scope, count, types) in &self.scopes {
            let types: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
            writeln!(f, "- {scope} ({count}): {}", types.join(", "))?;
        }
        write!(f, "\nTypes:")?;
        for (record_type, count) in &self.types {
            write!(f, "\n- {record_type} ({count})")?;
        }
        Ok(())
    }
}

fn by_frequency<K: Ord + Clone>(counts: &BTreeMap<K, usize>) -> Vec<(K, usize)> {
    let mut out: Vec<(K, usize)> = counts.iter().map(|(k, c)| (k.clone(), *c)).collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

fn scope_matches(filter: &str, scope: &str) -> bool {
    let filter = filter.trim().to_lowercase();
    let scope = scope.to_lowercase();
    scope == filter || scope.contains(&filter)
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MemgitError::InvalidArgument(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

pub struct LegacyMemoryIndex {
    docs: Arc<dyn DocumentStore>,
}

impl LegacyMemoryIndex {
    pub fn new(docs: Arc<dyn DocumentStore>) -> Self {
        Self { docs }
    }

    fn date_docs(&self) -> Result<Vec<String>> {
        Ok(self
            .docs
            .list("")?
            .into_iter()
            .filter(|name| date_doc_pattern().is_match(name))
            .collect())
    }

    /// Every parseable record, oldest first.
    fn load(&self) -> Result<Vec<Located>> {
        let mut out = Vec::new();
        for doc in self.date_docs()? {
            let content = self.docs.read(&doc)?;
            for (line, text) in content.lines().enumerate() {
                if text.trim().is_empty() {
                    continue;
                }
                match LegacyRecord::parse(text) {
                    Some(record) => out.push(Located {
                        doc: doc.clone(),
                        line,
                        record,
                    }),
                    None => debug!(doc = %doc, line = line + 1, "skipping unparseable record"),
                }
            }
        }
        Ok(out)
    }

    fn candidates(&self, scope: &str, record_type: RecordType) -> Result<Vec<Located>> {
        let scope = scope.trim();
        Ok(self
            .load()?
            .into_iter()
            .filter(|l| l.record.scope == scope && l.record.record_type == record_type)
            .collect())
    }

    fn audit(&self, entry: &AuditEntry) -> Result<()> {
        self.docs.append(AUDIT_DOC, &format!("{}\n", entry.to_line()))?;
        Ok(())
    }

    /// Rewrite `doc` with `replace` applied to each line number it names.
    fn rewrite(
        &self,
        doc: &str,
        mut replace: impl FnMut(usize, &str) -> Option<String>,
    ) -> Result<()> {
        let content = self.docs.read(doc)?;
        let mut out = String::with_capacity(content.len());
        for (i, line) in content.lines().enumerate() {
            if let Some(new_line) = replace(i, line) {
                if !new_line.is_empty() {
                    out.push_str(&new_line);
                    out.push('\n');
                }
            } else {
                out.push_str(line);
                out.push('\n');
            }
        }
        self.docs.write(doc, &out)?;
        Ok(())
    }

    /// Append a record to today's document.
    pub fn remember(&self, record: LegacyRecord) -> Result<LegacyRecord> {
        require("scope", &record.scope)?;
        require("content", &record.content)?;
        let doc = format!("{}.log", Utc::now().format("%Y-%m-%d"));
        self.docs.append(&doc, &format!("{}\n", record.to_line()))?;
        obs::emit_index_mutation("remember", &record.scope, record.record_type.as_str(), 1);
        Ok(record)
    }

    pub fn recall(&self, q: &RecallQuery) -> Result<RecallResult> {
        let mut records: Vec<LegacyRecord> =
            self.load()?.into_iter().map(|l| l.record).collect();
        let total = records.len();
        // Documents are day-ordered and lines append-ordered.
        records.reverse();

        let filtered: Vec<LegacyRecord> = records
            .into_iter()
            .filter(|r| match &q.scope {
                Some(scope) if !scope.trim().is_empty() => scope_matches(scope, &r.scope),
                _ => true,
            })
            .filter(|r| q.record_type.map_or(true, |t| r.record_type == t))
            .collect();

        let tokens = q.query.as_deref().map(tokenize).unwrap_or_default();
        let mut hits: Vec<RecallHit> = if tokens.is_empty() {
            filtered
                .into_iter()
                .map(|record| RecallHit {
                    record,
                    score: None,
                })
                .collect()
        } else {
            let mut scored: Vec<RecallHit> = filtered
                .into_iter()
                .map(|record| {
                    let s = score(&record, &tokens);
                    RecallHit {
                        record,
                        score: Some(s),
                    }
                })
                .filter(|hit| hit.score.unwrap_or(0) > 0)
                .collect();
            scored.sort_by(|a, b| b.score.cmp(&a.score));
            scored
        };

        let filtered = hits.len();
        hits.truncate(q.limit);
        Ok(RecallResult {
            hits,
            total,
            filtered,
        })
    }

    /// Replace the content of one record, keeping its timestamp.
    pub fn update(&self, req: &UpdateRequest) -> Result<UpdateOutcome> {
        require("scope", &req.scope)?;
        require("content", &req.content)?;
        let mut candidates = self.candidates(&req.scope, req.record_type)?;

        let located = match candidates.len() {
            0 => {
                return Ok(UpdateOutcome::NotFound {
                    scope: req.scope.trim().to_string(),
                    record_type: req.record_type,
                })
            }
            1 => candidates.remove(0),
            n => {
                let tokens = req.query.as_deref().map(tokenize).unwrap_or_default();
                if tokens.is_empty() {
                    return Err(MemgitError::AmbiguousMatch(format!(
                        "{n} {} memories in scope '{}'; pass a query to pick one",
                        req.record_type,
                        req.scope.trim()
                    )));
                }
                // First maximum in document order wins ties.
                let mut best: Option<(usize, Located)> = None;
                for candidate in candidates {
                    let s = score(&candidate.record, &tokens);
                    if s > 0 && best.as_ref().map_or(true, |(b, _)| s > *b) {
                        best = Some((s, candidate));
                    }
                }
                match best {
                    Some((_, located)) => located,
                    None => {
                        return Err(MemgitError::AmbiguousMatch(format!(
                            "{n} {} memories in scope '{}' and none match the query",
                            req.record_type,
                            req.scope.trim()
                        )))
                    }
                }
            }
        };

        let before = located.record.clone();
        let mut after = before.clone();
        after.content = req.content.trim().to_string();
        if req.issue.is_some() {
            after = after.with_issue(req.issue.clone());
        }
        if let Some(tags) = &req.tags {
            after = after.with_tags(tags.clone());
        }

        self.audit(&AuditEntry::new(
            before.clone(),
            &format!("Updated to: {}", after.content),
        ))?;
        let new_line = after.to_line();
        self.rewrite(&located.doc, |i, _| {
            (i == located.line).then(|| new_line.clone())
        })?;

        obs::emit_index_mutation("update", &after.scope, after.record_type.as_str(), 1);
        Ok(UpdateOutcome::Updated { before, after })
    }

    /// Remove every record with exactly this scope and type. Returns the
    /// number removed.
    pub fn forget(&self, scope: &str, record_type: RecordType, reason: &str) -> Result<usize> {
        require("scope", scope)?;
        let doomed = self.candidates(scope, record_type)?;
        if doomed.is_empty() {
            return Ok(0);
        }

        for located in &doomed {
            self.audit(&AuditEntry::new(located.record.clone(), reason))?;
        }
        let mut per_doc: BTreeMap<&str, BTreeSet<usize>> = BTreeMap::new();
        for located in &doomed {
            per_doc
                .entry(located.doc.as_str())
                .or_default()
                .insert(located.line);
        }
        for (doc, lines) in per_doc {
            self.rewrite(doc, |i, _| lines.contains(&i).then(String::new))?;
        }

        obs::emit_index_mutation("forget", scope.trim(), record_type.as_str(), doomed.len());
        Ok(doomed.len())
    }

    pub fn list(&self) -> Result<MemoryListing> {
        let records = self.load()?;
        let mut scope_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut scope_types: BTreeMap<String, BTreeSet<RecordType>> = BTreeMap::new();
        let mut type_counts: BTreeMap<RecordType, usize> = BTreeMap::new();
        for l in &records {
            *scope_counts.entry(l.record.scope.clone()).or_default() += 1;
            scope_types
                .entry(l.record.scope.clone())
                .or_default()
                .insert(l.record.record_type);
            *type_counts.entry(l.record.record_type).or_default() += 1;
        }

        let scopes = by_frequency(&scope_counts)
            .into_iter()
            .map(|(scope, count)| {
                let types = scope_types
                    .get(&scope)
                    .map(|set| set.iter().copied().collect())
                    .unwrap_or_default();
                (scope, count, types)
            })
            .collect();
        Ok(MemoryListing {
            total: records.len(),
            scopes,
            types: by_frequency(&type_counts),
        })
    }

    /// Parsed audit entries in the order they were written.
    pub fn audit_entries(&self) -> Result<Vec<AuditEntry>> {
        let content = self.docs.read(AUDIT_DOC)?;
        Ok(content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| {
                let parsed = AuditEntry::parse(l);
                if parsed.is_none() {
                    warn!(doc = AUDIT_DOC, "skipping unparseable audit line");
                }
                parsed
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memgit_state::fakes::MemoryDocumentStore;

    fn index() -> (Arc<MemoryDocumentStore>, LegacyMemoryIndex) {
        let docs = Arc::new(MemoryDocumentStore::new());
        (docs.clone(), LegacyMemoryIndex::new(docs))
    }

    fn remember(idx: &LegacyMemoryIndex, t: RecordType, scope: &str, content: &str) {
        idx.remember(LegacyRecord::new(t, scope, content)).unwrap();
    }

    fn update(scope: &str, content: &str, query: Option<&str>) -> UpdateRequest {
        UpdateRequest {
            scope: scope.to_string(),
            record_type: RecordType::Decision,
            content: content.to_string(),
            query: query.map(str::to_string),
            issue: None,
            tags: None,
        }
    }

    #[test]
    fn recall_without_query_is_newest_first() {
        let (_, idx) = index();
        remember(&idx, RecordType::Decision, "auth", "first");
        remember(&idx, RecordType::Decision, "auth", "second");
        let result = idx.recall(&RecallQuery::new(20)).unwrap();
        assert_eq!(result.hits[0].record.content, "second");
        assert_eq!((result.total, result.filtered, result.shown()), (2, 2, 2));
    }

    #[test]
    fn recall_filters_scope_by_substring_case_insensitively() {
        let (_, idx) = index();
        remember(&idx, RecordType::Decision, "Auth-Service", "a");
        remember(&idx, RecordType::Learning, "billing", "b");
        let result = idx.recall(&RecallQuery::new(20).scope("auth")).unwrap();
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.total, 2);
    }

    #[test]
    fn recall_ranks_by_score_and_drops_zero() {
        let (_, idx) = index();
        remember(&idx, RecordType::Learning, "db", "postgres vacuum");
        remember(&idx, RecordType::Learning, "db", "postgres postgres tuning");
        remember(&idx, RecordType::Learning, "ui", "buttons");
        let result = idx
            .recall(&RecallQuery::new(20).query("postgres"))
            .unwrap();
        assert_eq!(result.hits.len(), 2);
        assert_eq!(result.hits[0].record.content, "postgres postgres tuning");
        assert_eq!(result.hits[0].score, Some(2));
    }

    #[test]
    fn recall_limit_truncates_but_reports_filtered() {
        let (_, idx) = index();
        for i in 0..5 {
            remember(&idx, RecordType::Context, "s", &format!("n{i}"));
        }
        let result = idx.recall(&RecallQuery::new(2)).unwrap();
        assert_eq!((result.filtered, result.shown()), (5, 2));
    }

    #[test]
    fn update_single_match_rewrites_in_place() {
        let (_, idx) = index();
        remember(&idx, RecordType::Decision, "auth", "use sessions");
        let outcome = idx.update(&update("auth", "use jwt", None)).unwrap();
        assert!(matches!(outcome, UpdateOutcome::Updated { .. }));

        let all = idx.recall(&RecallQuery::new(20)).unwrap();
        assert_eq!(all.total, 1);
        assert_eq!(all.hits[0].record.content, "use jwt");

        let audit = idx.audit_entries().unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].record.content, "use sessions");
        assert_eq!(audit[0].reason, "Updated to: use jwt");
    }

    #[test]
    fn update_ambiguous_without_query_writes_nothing() {
        let (docs, idx) = index();
        remember(&idx, RecordType::Decision, "auth", "one");
        remember(&idx, RecordType::Decision, "auth", "two");
        let snapshot = |docs: &MemoryDocumentStore| -> Vec<(String, String)> {
            docs.list("")
                .unwrap()
                .into_iter()
                .map(|name| {
                    let body = docs.read(&name).unwrap();
                    (name, body)
                })
                .collect()
        };
        let before = snapshot(&docs);
        let err = idx.update(&update("auth", "three", None)).unwrap_err();
        assert!(matches!(err, MemgitError::AmbiguousMatch(_)));
        assert_eq!(snapshot(&docs), before);
        assert!(idx.audit_entries().unwrap().is_empty());
    }

    #[test]
    fn update_with_query_picks_best_and_rejects_no_match() {
        let (_, idx) = index();
        remember(&idx, RecordType::Decision, "auth", "token expiry one hour");
        remember(&idx, RecordType::Decision, "auth", "password hashing argon2");
        idx.update(&update("auth", "argon2id", Some("hashing")))
            .unwrap();
        let contents: Vec<String> = idx
            .recall(&RecallQuery::new(20))
            .unwrap()
            .hits
            .into_iter()
            .map(|h| h.record.content)
            .collect();
        assert!(contents.contains(&"argon2id".to_string()));
        assert!(contents.contains(&"token expiry one hour".to_string()));

        let err = idx
            .update(&update("auth", "x", Some("kubernetes")))
            .unwrap_err();
        assert!(matches!(err, MemgitError::AmbiguousMatch(_)));
    }

    #[test]
    fn update_missing_is_not_an_error() {
        let (_, idx) = index();
        let outcome = idx.update(&update("nowhere", "x", None)).unwrap();
        assert!(matches!(outcome, UpdateOutcome::NotFound { .. }));
    }

    #[test]
    fn forget_removes_and_audits_each_record() {
        let (_, idx) = index();
        remember(&idx, RecordType::Blocker, "ci", "flaky a");
        remember(&idx, RecordType::Blocker, "ci", "flaky b");
        remember(&idx, RecordType::Learning, "ci", "keep me");

        assert_eq!(idx.forget("ci", RecordType::Blocker, "resolved").unwrap(), 2);
        let left = idx
            .recall(&RecallQuery::new(20).scope("ci").record_type(RecordType::Blocker))
            .unwrap();
        assert!(left.hits.is_empty());
        assert_eq!(idx.recall(&RecallQuery::new(20)).unwrap().total, 1);

        let audit = idx.audit_entries().unwrap();
        assert_eq!(audit.len(), 2);
        assert!(audit.iter().all(|a| a.reason == "resolved"));
    }

    #[test]
    fn unparseable_lines_survive_rewrites() {
        let (docs, idx) = index();
        remember(&idx, RecordType::Decision, "auth", "old");
        let doc = idx.date_docs().unwrap().remove(0);
        docs.append(&doc, "garbage line\n").unwrap();

        idx.update(&update("auth", "new", None)).unwrap();
        assert!(docs.read(&doc).unwrap().contains("garbage line"));
    }

    #[test]
    fn list_sorts_by_frequency_then_name() {
        let (_, idx) = index();
        remember(&idx, RecordType::Decision, "b", "1");
        remember(&idx, RecordType::Learning, "b", "2");
        remember(&idx, RecordType::Decision, "a", "3");
        remember(&idx, RecordType::Decision, "c", "4");

        let listing = idx.list().unwrap();
        assert_eq!(listing.total, 4);
        let scopes: Vec<&str> = listing.scopes.iter().map(|s| s.0.as_str()).collect();
        assert_eq!(scopes, vec!["b", "a", "c"]);
        assert_eq!(listing.scopes[0].2, vec![RecordType::Decision, RecordType::Learning]);
        assert_eq!(listing.types[0], (RecordType::Decision, 3));
    }
}
