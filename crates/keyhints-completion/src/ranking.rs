//! Relevancy scoring for omnibar suggestions.
//!
//! Scores combine three signals per query term: the term occurs anywhere,
//! it starts a word, and it is a whole word. Matching is case-insensitive
//! unless the term itself contains an uppercase letter ("smartcase").

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};

#[cfg(test)]
#[path = "ranking_tests.rs"]
mod tests;

/// Weight for a match anywhere in the text.
pub const MATCH_ANYWHERE: f64 = 1.0;
/// Additional weight for a match at the start of a word.
pub const MATCH_START_OF_WORD: f64 = 1.0;
/// Additional weight for a whole-word match.
pub const MATCH_WHOLE_WORD: f64 = 1.0;
/// Sum of the three weights; used for normalization.
pub const MAXIMUM_SCORE: f64 = MATCH_ANYWHERE + MATCH_START_OF_WORD + MATCH_WHOLE_WORD;
/// Scales recency so it breaks ties among weak matches without beating whole-word matches.
pub const RECENCY_CALIBRATOR: f64 = 2.0 / 3.0;

const ONE_MONTH_MS: f64 = 1000.0 * 60.0 * 60.0 * 24.0 * 30.0;

static NEVER_MATCH: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\s\S]").expect("valid regex"));

/// Compiled-regex cache keyed by the final pattern.
///
/// Cleared at the start of every aggregate query.
#[derive(Default)]
pub struct RegexpCache {
    cache: Mutex<HashMap<String, Regex>>,
}

/// Cache shared by every ranking call in the process.
pub static REGEXP_CACHE: Lazy<RegexpCache> = Lazy::new(RegexpCache::default);

impl RegexpCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Regex for `term` with metacharacters escaped, wrapped in the raw
    /// `prefix`/`suffix`. With `"\\b"` as prefix, "go" matches "google"
    /// but not "agog".
    pub fn get(&self, term: &str, prefix: &str, suffix: &str) -> Regex {
        let pattern = format!("{}{}{}", prefix, regex::escape(term), suffix);
        let mut cache = self.cache.lock();
        if let Some(re) = cache.get(&pattern) {
            return re.clone();
        }
        let re = RegexBuilder::new(&pattern)
            .case_insensitive(!has_upper_case(term))
            .build()
            .unwrap_or_else(|_| NEVER_MATCH.clone());
        cache.insert(pattern, re.clone());
        re
    }
}

pub fn has_upper_case(s: &str) -> bool {
    s.chars().any(char::is_uppercase)
}

/// Every term must match at least one of `things`.
pub fn matches(query_terms: &[String], things: &[&str]) -> bool {
    query_terms.iter().all(|term| {
        let re = REGEXP_CACHE.get(term, "", "");
        things.iter().any(|thing| re.is_match(thing))
    })
}

/// Score `term` against `text`: `(score in [0, 3], matched character count)`.
pub fn score_term(term: &str, text: &str) -> (f64, usize) {
    let anywhere = REGEXP_CACHE.get(term, "", "");
    let matched: usize = anywhere
        .find_iter(text)
        .map(|m| m.as_str().chars().count())
        .sum();
    if matched == 0 {
        return (0.0, 0);
    }

    let mut score = MATCH_ANYWHERE;
    if REGEXP_CACHE.get(term, r"\b", "").is_match(text) {
        score += MATCH_START_OF_WORD;
        if REGEXP_CACHE.get(term, r"\b", r"\b").is_match(text) {
            score += MATCH_WHOLE_WORD;
        }
    }
    (score, matched.min(text.chars().count()))
}

/// How well the query terms match `url` and `title`, in `[0, 1]`.
pub fn word_relevancy(query_terms: &[String], url: &str, title: Option<&str>) -> f64 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let title = title.filter(|t| !t.is_empty());

    let mut url_score = 0.0;
    let mut url_count = 0;
    let mut title_score = 0.0;
    let mut title_count = 0;
    for term in query_terms {
        let (s, c) = score_term(term, url);
        url_score += s;
        url_count += c;
        if let Some(title) = title {
            let (s, c) = score_term(term, title);
            title_score += s;
            title_count += c;
        }
    }

    let maximum_possible = MAXIMUM_SCORE * query_terms.len() as f64;

    url_score /= maximum_possible;
    url_score *= normalize_difference(url_count, url.chars().count());

    match title {
        Some(title) => {
            title_score /= maximum_possible;
            title_score *= normalize_difference(title_count, title.chars().count());
        }
        None => title_score = url_score,
    }

    // A long, noisy URL must not drag down a good title match.
    if url_score < title_score {
        url_score = title_score;
    }

    (url_score + title_score) / 2.0
}

/// Recency of `last_accessed_ms` relative to now.
pub fn recency_score(last_accessed_ms: i64) -> f64 {
    recency_score_at(last_accessed_ms, chrono::Utc::now().timestamp_millis())
}

/// Cubic decay over a 30-day window, scaled by [`RECENCY_CALIBRATOR`].
pub fn recency_score_at(last_accessed_ms: i64, now_ms: i64) -> f64 {
    let recency = (now_ms - last_accessed_ms) as f64;
    let remaining = (ONE_MONTH_MS - recency).max(0.0).min(ONE_MONTH_MS) / ONE_MONTH_MS;
    remaining * remaining * remaining * RECENCY_CALIBRATOR
}

/// `(max(a, b) - |a - b|) / max(a, b)`, in `[0, 1]`.
pub fn normalize_difference(a: usize, b: usize) -> f64 {
    let max = a.max(b);
    if max == 0 {
        return 0.0;
    }
    let diff = a.abs_diff(b);
    (max - diff) as f64 / max as f64
}
