use std::sync::Arc;

use async_trait::async_trait;
use keyhints_protocols::{
    CompleterOutput, Completer, CompletionRequest, HistoryEntry, Suggestion, SuggestionKind,
};

use crate::history_cache::HistoryCache;
use crate::ranking::{matches, recency_score, word_relevancy};

/// Browsing history, ranked by text match with a recency lift.
pub struct HistoryCompleter {
    cache: Arc<HistoryCache>,
}

impl HistoryCompleter {
    pub fn new(cache: Arc<HistoryCache>) -> Self {
        Self { cache }
    }

    fn suggestion(entry: &HistoryEntry, query_terms: &[String]) -> Suggestion {
        let mut suggestion =
            Suggestion::new(SuggestionKind::History, entry.url.clone(), query_terms.to_vec())
                .with_title(entry.title.clone())
                .with_relevancy_fn(Arc::new(compute_relevancy));
        suggestion.last_visit_time = Some(entry.last_visit_time);
        suggestion
    }
}

/// Recency alone for empty queries; otherwise the word score, pulled up
/// (never down) by recency.
fn compute_relevancy(suggestion: &Suggestion) -> f64 {
    let recency = recency_score(suggestion.last_visit_time.unwrap_or_default());
    if suggestion.query_terms.is_empty() {
        return recency;
    }
    let word = word_relevancy(&suggestion.query_terms, &suggestion.url, Some(suggestion.title.as_str()));
    (word + recency.max(word)) / 2.0
}

#[async_trait]
impl Completer for HistoryCompleter {
    fn name(&self) -> &str {
        "history"
    }

    async fn filter(&self, request: &CompletionRequest) -> CompleterOutput {
        let terms = &request.query_terms;
        if terms.is_empty() && !request.seen_tab_to_open_completion_list {
            // Warm the cache for the next keystroke.
            let cache = self.cache.clone();
            tokio::spawn(async move {
                cache.use_history().await;
            });
            return CompleterOutput::empty();
        }

        let history = self.cache.use_history().await;
        let suggestions = history
            .iter()
            .filter(|entry| terms.is_empty() || matches(terms, &[entry.url.as_str(), entry.title.as_str()]))
            .map(|entry| Self::suggestion(entry, terms))
            .collect();
        CompleterOutput::new(suggestions)
    }

    async fn refresh(&self) {
        self.cache.use_history().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::StaticHistory;

    const HOUR_MS: i64 = 60 * 60 * 1000;

    fn completer() -> HistoryCompleter {
        let now = chrono::Utc::now().timestamp_millis();
        let history = StaticHistory(vec![
            HistoryEntry::new("history1.com", "history1", now - 23 * HOUR_MS),
            HistoryEntry::new("history2.com", "history2", now - 19 * HOUR_MS),
        ]);
        HistoryCompleter::new(Arc::new(HistoryCache::new(Arc::new(history), 100)))
    }

    fn urls(output: &CompleterOutput) -> Vec<&str> {
        output.suggestions.iter().map(|s| s.url.as_str()).collect()
    }

    #[tokio::test]
    async fn test_returns_matching_entries() {
        let out = completer().filter(&CompletionRequest::new("story1")).await;
        assert_eq!(urls(&out), ["history1.com"]);
    }

    #[tokio::test]
    async fn test_recent_entries_rank_higher() {
        let out = completer().filter(&CompletionRequest::new("hist")).await;
        let mut suggestions = out.suggestions;
        suggestions.sort_by(|a, b| b.compute_relevancy().total_cmp(&a.compute_relevancy()));
        let ranked: Vec<_> = suggestions.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(ranked, ["history2.com", "history1.com"]);
    }

    #[tokio::test]
    async fn test_refresh_loads_history() {
        let completer = completer();
        assert!(!completer.cache.is_loaded());
        completer.refresh().await;
        assert!(completer.cache.is_loaded());
    }

    #[tokio::test]
    async fn test_empty_query_shows_nothing() {
        let out = completer().filter(&CompletionRequest::new("")).await;
        assert!(out.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_tab_on_empty_query_lists_by_recency() {
        let mut request = CompletionRequest::new("");
        request.seen_tab_to_open_completion_list = true;
        let out = completer().filter(&request).await;
        assert_eq!(out.suggestions.len(), 2);
        let newer = &out.suggestions[1];
        let older = &out.suggestions[0];
        assert!(newer.compute_relevancy() > older.compute_relevancy());
    }
}
