//! Final ranking stage: score, sort, simplify URLs, de-duplicate and cap.

use std::collections::HashSet;
use std::time::Duration;

use keyhints_protocols::Suggestion;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;

use crate::simple_cache::SimpleCache;

struct StripRule {
    filter: Regex,
    replacements: Vec<Regex>,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid strip regex")
}

static STRIP_RULES: Lazy<Vec<StripRule>> = Lazy::new(|| {
    let google_params = "ei gws_rd url ved usg sa sig2 bih biw cd aqs ie sourceid es_sm";
    vec![
        // Parameters Google adds to search URLs that never identify the search.
        StripRule {
            filter: compile(r"^https?://www\.google\.(com|ca|com\.au|co\.uk|ie)/.*[&?]q="),
            replacements: google_params
                .split_whitespace()
                .map(|param| compile(&format!("&{param}=[^&]+")))
                .collect(),
        },
        // Maps records a history entry for every pan and zoom.
        StripRule {
            filter: compile(r"^https?://www\.google\.(com|ca|com\.au|co\.uk|ie)/maps/place/.*/@"),
            replacements: vec![compile("/@.*")],
        },
        StripRule {
            filter: compile("."),
            replacements: vec![compile("^https?://"), compile(r"\W+$")],
        },
    ]
});

static SIMPLIFIED: Lazy<Mutex<SimpleCache<String, String>>> =
    Lazy::new(|| Mutex::new(SimpleCache::new(Duration::from_secs(60 * 60), 300)));

/// Lowercased `url` without protocol, trailing punctuation and known tracking noise.
pub fn simplify_url(url: &str) -> String {
    let key = url.to_string();
    if let Some(hit) = SIMPLIFIED.lock().get(&key) {
        return hit;
    }

    let mut simplified = url.to_lowercase();
    for rule in STRIP_RULES.iter() {
        if rule.filter.is_match(&simplified) {
            for replacement in &rule.replacements {
                simplified = replacement.replace(&simplified, "").into_owned();
            }
        }
    }
    SIMPLIFIED.lock().set(key, simplified)
}

/// Key used for de-duplication: an explicit short URL, else the simplified URL.
pub fn dedup_key(suggestion: &Suggestion) -> String {
    match &suggestion.short_url {
        Some(short) => short.clone(),
        None => simplify_url(&suggestion.url),
    }
}

/// Rank `suggestions` and keep at most `max_results`, dropping later
/// duplicates among suggestions that take part in de-duplication.
pub fn prepare_suggestions(mut suggestions: Vec<Suggestion>, max_results: usize) -> Vec<Suggestion> {
    for suggestion in &suggestions {
        suggestion.compute_relevancy();
    }
    // Stable: equal scores keep their arrival order.
    suggestions.sort_by(|a, b| b.compute_relevancy().total_cmp(&a.compute_relevancy()));

    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(max_results.min(suggestions.len()));
    for suggestion in suggestions {
        let key = dedup_key(&suggestion);
        if suggestion.de_duplicate && seen.contains(&key) {
            continue;
        }
        if kept.len() == max_results {
            break;
        }
        seen.insert(key);
        kept.push(suggestion);
    }
    kept
}
