//! Lexical relevance scoring for flat records.

use super::record::LegacyRecord;

/// Lowercased whitespace tokens of `query`.
pub fn tokenize(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

/// Occurrence-count score of `tokens` against `record`.
///
/// Each token adds the number of non-overlapping occurrences in the record's
/// type, scope, content, issue and tags, plus 2 when it equals the scope or
/// the type outright.
pub fn score(record: &LegacyRecord, tokens: &[String]) -> usize {
    let scope = record.scope.to_lowercase();
    let record_type = record.record_type.as_str();
    let haystack = format!(
        "{} {} {} {} {}",
        record_type,
        scope,
        record.content.to_lowercase(),
        record.issue.as_deref().unwrap_or_default().to_lowercase(),
        record.tags.join(",").to_lowercase()
    );

    tokens
        .iter()
        .filter(|t| !t.is_empty())
        .map(|token| {
            let exact = if *token == scope || token == record_type { 2 } else { 0 };
            haystack.matches(token.as_str()).count() + exact
        })
        .sum()
}
