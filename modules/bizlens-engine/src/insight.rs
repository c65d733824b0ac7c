//! Insight post-processing: citation stripping, list normalization,
//! order-preserving dedup, and priority-proposal selection.
//!
//! Everything here operates on raw `serde_json::Value` lists because models
//! return a mix of plain strings and `{text: …}`-shaped objects; the
//! coercion rules live in one place instead of at every render site.

use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

use bizlens_common::{ProposalCategory, Proposals};

/// Display caps: 2 entries per quadrant tile, 4 per proposal card.
pub const QUADRANT_LIMIT: usize = 2;
pub const PROPOSAL_LIMIT: usize = 4;

static CITATION_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\[(?:D|N)\d+\]\s*").unwrap());
static SOURCE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\(출처:\s*\[[^\]]*\](?:\s*,\s*\[[^\]]*\])*\s*\)\s*").unwrap()
});
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static DOC_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[D\d+\]").unwrap());

/// Remove `[D#]`/`[N#]` evidence tags and `(출처: […])` suffixes from display
/// text. The tags stay meaningful inside the JSON contract; they are only
/// noise once a sentence reaches the screen.
pub fn strip_citations(text: &str) -> String {
    let without_tags = CITATION_TAG.replace_all(text, "");
    SOURCE_SUFFIX
        .replace_all(&without_tags, "")
        .trim()
        .to_string()
}

/// Coerce one heterogeneous list entry to display text. Objects resolve
/// through the ordered alias list text | summary | description; the first
/// alias producing non-empty text wins.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Object(map) => ["text", "summary", "description"]
            .iter()
            .filter_map(|key| map.get(*key))
            .map(value_to_text)
            .find(|s| !s.is_empty())
            .unwrap_or_default(),
        other => other.to_string().trim_matches('"').trim().to_string(),
    }
}

/// Coerce a heterogeneous list into trimmed strings, dropping empty and
/// literal "NULL" entries, capped at `limit`.
pub fn normalize_items(items: &[Value], limit: usize) -> Vec<String> {
    let mut out = Vec::new();
    for value in items {
        let text = value_to_text(value);
        if text.is_empty() || text.eq_ignore_ascii_case("null") {
            continue;
        }
        out.push(text);
        if out.len() >= limit {
            break;
        }
    }
    out
}

/// Normalize and citation-strip a list for display.
pub fn take_clean(items: &[Value], limit: usize) -> Vec<String> {
    normalize_items(items, limit)
        .iter()
        .map(|s| strip_citations(s))
        .collect()
}

/// Drop duplicate entries, preserving first-seen order. Duplicates are
/// detected after citation stripping, whitespace collapsing, removal of one
/// trailing period, and case folding; the first cleaned form is kept.
pub fn dedup_strip_refs(items: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let cleaned = CITATION_TAG.replace_all(item.trim(), "").trim().to_string();
        let collapsed = WHITESPACE.replace_all(&cleaned, " ").trim().to_string();
        let norm = collapsed
            .strip_suffix('.')
            .unwrap_or(&collapsed)
            .to_lowercase();
        if norm.is_empty() || !seen.insert(norm) {
            continue;
        }
        out.push(cleaned);
    }
    out
}

/// Pick the single priority proposal among the three competing categories.
///
/// Each category scores by its count of non-empty entries; the highest score
/// wins, ties resolving differentiation > cooperation > benchmarking. All
/// empty means no selection. The chosen list is cleaned and deduplicated,
/// then backfilled with remaining non-duplicate raw entries up to the
/// proposal cap so a heavily-deduplicated category still fills its card.
pub fn choose_priority_proposal(proposals: &Proposals) -> Option<(ProposalCategory, Vec<String>)> {
    let candidates = [
        (ProposalCategory::Differentiation, &proposals.differentiation),
        (ProposalCategory::Cooperation, &proposals.cooperation),
        (ProposalCategory::Benchmarking, &proposals.benchmarking),
    ];

    let score = |items: &[Value]| {
        items
            .iter()
            .filter(|v| !value_to_text(v).is_empty())
            .count()
    };

    let mut best: Option<(ProposalCategory, &Vec<Value>, usize)> = None;
    for (category, items) in candidates {
        let count = score(items);
        // strictly-greater keeps the earlier (higher-priority) category on ties
        if count > best.as_ref().map(|(_, _, c)| *c).unwrap_or(0) {
            best = Some((category, items, count));
        }
    }

    let (category, items, _) = best?;
    let mut summary = dedup_strip_refs(&take_clean(items, PROPOSAL_LIMIT));
    if summary.len() < PROPOSAL_LIMIT {
        for value in items {
            let raw = value_to_text(value);
            if raw.is_empty() || summary.iter().any(|s| s == &raw) {
                continue;
            }
            summary.push(raw);
            if summary.len() >= PROPOSAL_LIMIT {
                break;
            }
        }
    }
    Some((category, summary))
}

/// Clean the one-line strategy text: drop lines still carrying `[D#]` tags,
/// drop duplicate lines, and strip remaining citations.
pub fn clean_one_liner(text: &str) -> String {
    let mut seen = HashSet::new();
    let mut lines = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || DOC_TAG.is_match(line) {
            continue;
        }
        if seen.insert(line.to_string()) {
            lines.push(line);
        }
    }
    strip_citations(&lines.join("\n"))
}

/// Candidate keys under which models place the news-side summary.
const EXTERNAL_SUMMARY_KEYS: &[&str] = &[
    "news_summary",
    "external_summary",
    "summary_from_news",
    "summary_external",
    "external_insights",
];

/// Collect external (news) summary entries, scanning the candidate keys in
/// order and keeping every non-empty result.
pub fn external_summaries(data: &Value) -> Vec<String> {
    let mut out = Vec::new();
    for key in EXTERNAL_SUMMARY_KEYS {
        if let Some(Value::Array(items)) = data.get(key) {
            out.extend(take_clean(items, QUADRANT_LIMIT));
        }
    }
    out
}

/// Merge top-level strengths/weaknesses with the nested
/// `integrated_insights` variants (English and Korean keys), deduplicated.
pub fn merged_strengths_weaknesses(data: &Value) -> (Vec<String>, Vec<String>) {
    let take_at = |value: &Value, key: &str| match value.get(key) {
        Some(Value::Array(items)) => take_clean(items, QUADRANT_LIMIT),
        _ => Vec::new(),
    };
    let nested = |key_en: &str, key_ko: &str| {
        let Some(integrated) = data.get("integrated_insights") else {
            return Vec::new();
        };
        let primary = take_at(integrated, key_en);
        if primary.is_empty() {
            take_at(integrated, key_ko)
        } else {
            primary
        }
    };

    let mut strengths = take_at(data, "strengths");
    strengths.extend(nested("strengths", "강점"));
    let mut weaknesses = take_at(data, "weaknesses");
    weaknesses.extend(nested("weaknesses", "약점"));

    (dedup_strip_refs(&strengths), dedup_strip_refs(&weaknesses))
}
