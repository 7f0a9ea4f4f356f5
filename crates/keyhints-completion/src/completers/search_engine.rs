use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use keyhints_config::parse_search_engines;
use keyhints_protocols::{
    CompleterOutput, Completer, CompletionRequest, Suggestion, SuggestionFilter, SuggestionKind,
    UserSearchEngine,
};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use regex::Regex;
use tracing::debug;

use crate::ranking::{matches, word_relevancy};
use crate::search::CompletionSearch;
use crate::url_utils::{create_search_url, extract_query};

#[cfg(test)]
#[path = "search_engine_tests.rs"]
mod tests;

static FINISHED_FIRST_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S\s").expect("valid regex"));

const PRIMARY_RELEVANCY: f64 = 2.0;

/// Completions seen for earlier keystrokes, in first-seen order.
type PreviousSuggestions = Arc<Mutex<Vec<Suggestion>>>;

/// Custom search engines selected by a leading keyword, e.g. `w rust`.
pub struct SearchEngineCompleter {
    search: Arc<CompletionSearch>,
    engines: RwLock<Arc<HashMap<String, UserSearchEngine>>>,
    default_search_url: RwLock<String>,
    previous: PreviousSuggestions,
}

impl SearchEngineCompleter {
    pub fn new(search: Arc<CompletionSearch>, default_search_url: impl Into<String>) -> Self {
        Self {
            search,
            engines: RwLock::new(Arc::new(HashMap::new())),
            default_search_url: RwLock::new(default_search_url.into()),
            previous: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace the engine table from the user's search-engine text.
    pub fn set_search_engines(&self, config_text: &str) {
        let parsed = parse_search_engines(config_text);
        debug!(engines = parsed.keyword_to_engine.len(), "search engines updated");
        *self.engines.write() = Arc::new(parsed.keyword_to_engine);
    }

    pub fn set_default_search_url(&self, search_url: impl Into<String>) {
        *self.default_search_url.write() = search_url.into();
    }

    pub fn search_engines(&self) -> Arc<HashMap<String, UserSearchEngine>> {
        self.engines.read().clone()
    }

    fn previous_matching(&self, query_terms: &[String]) -> Vec<Suggestion> {
        if query_terms.is_empty() {
            return Vec::new();
        }
        self.previous
            .lock()
            .iter()
            .filter(|s| matches(query_terms, &[s.title.as_str()]))
            .map(|s| {
                let mut s = s.clone();
                s.reset_relevancy(query_terms.to_vec());
                s
            })
            .collect()
    }
}

/// Calibrated against the other completers; depends on the title (the
/// search terms) only.
fn compute_relevancy(suggestion: &Suggestion) -> f64 {
    let title = suggestion.title.as_str();
    Suggestion::boost_relevancy_score(
        0.5,
        0.7 * word_relevancy(&suggestion.query_terms, title, Some(title)),
    )
}

/// Builds completion suggestions and remembers them for later keystrokes.
struct SuggestionMaker {
    engine: UserSearchEngine,
    query_terms: Vec<String>,
    previous: PreviousSuggestions,
    count: usize,
}

impl SuggestionMaker {
    fn make(&mut self, completion: String) -> Suggestion {
        self.count += 1;
        let url = create_search_url(&completion, &self.engine.url);
        let mut suggestion =
            Suggestion::new(SuggestionKind::CustomSearch, url.clone(), self.query_terms.clone())
                .with_title(completion.clone())
                .with_relevancy_fn(Arc::new(compute_relevancy));
        if self.count == 1 {
            suggestion = suggestion.with_relevancy(1.0);
        }
        suggestion.description = Some(self.engine.description.clone());
        suggestion.search_url = Some(self.engine.url.clone());
        suggestion.insert_text = Some(completion);
        suggestion.highlight_terms = false;

        let mut previous = self.previous.lock();
        match previous.iter_mut().find(|s| s.url == url) {
            Some(existing) => *existing = suggestion.clone(),
            None => previous.push(suggestion.clone()),
        }
        suggestion
    }

    fn make_all(&mut self, completions: Vec<String>) -> Vec<Suggestion> {
        completions.into_iter().map(|c| self.make(c)).collect()
    }
}

#[async_trait]
impl Completer for SearchEngineCompleter {
    fn name(&self) -> &str {
        "search-engines"
    }

    /// `w rust` selects the engine with keyword `w` and drops the keyword;
    /// `w` alone does not.
    fn preprocess_request(&self, request: &mut CompletionRequest) {
        let engines = self.search_engines();
        request.search_engines = Some(engines.clone());

        let Some(keyword) = request.query_terms.first().cloned() else {
            return;
        };
        let Some(engine) = engines.get(&keyword) else {
            return;
        };
        if request.query_terms.len() > 1 || FINISHED_FIRST_WORD.is_match(&request.query) {
            request.query_terms.remove(0);
            request.keyword = Some(keyword);
            request.engine = Some(engine.clone());
        }
    }

    async fn filter(&self, request: &CompletionRequest) -> CompleterOutput {
        let Some(engine) = request.engine.clone() else {
            return CompleterOutput::empty();
        };
        let query_terms = request.query_terms.clone();
        let search_url = engine.url.clone();

        // Keep results this engine produced, or could have produced.
        let filter_terms = query_terms.clone();
        let filter_url = search_url.clone();
        let filter: SuggestionFilter = Arc::new(move |suggestions: Vec<Suggestion>| -> Vec<Suggestion> {
            suggestions
                .into_iter()
                .filter_map(|mut suggestion| {
                    if suggestion.is_search_suggestion {
                        return Some(suggestion);
                    }
                    let terms = extract_query(&filter_url, &suggestion.url)?;
                    if !matches(&filter_terms, &[terms.as_str()]) {
                        return None;
                    }
                    suggestion.url = create_search_url(&terms, &filter_url);
                    Some(suggestion)
                })
                .collect()
        });

        let mut primary = Suggestion::new(
            SuggestionKind::Search,
            create_search_url(&query_terms.join(" "), &search_url),
            query_terms.clone(),
        )
        .with_title(query_terms.join(" "))
        .with_relevancy(PRIMARY_RELEVANCY);
        primary.description = Some(engine.description.clone());
        primary.search_url = Some(search_url.clone());
        primary.auto_select = true;
        primary.highlight_terms = false;
        primary.is_search_suggestion = true;
        primary.is_primary_suggestion = true;

        if query_terms.is_empty() {
            return CompleterOutput::new(vec![primary]).with_filter(filter);
        }

        let mut suggestions = self.previous_matching(&query_terms);
        suggestions.push(primary);

        let mut maker = SuggestionMaker {
            engine,
            query_terms: query_terms.clone(),
            previous: self.previous.clone(),
            count: 0,
        };

        if !self.search.have_completion_engine(&search_url) {
            return CompleterOutput::new(suggestions).with_filter(filter);
        }
        if let Some(cached) = self.search.complete_cached(&search_url, &query_terms) {
            suggestions.extend(maker.make_all(cached));
            return CompleterOutput::new(suggestions).with_filter(filter);
        }

        let search = self.search.clone();
        let continuation = async move {
            let completions = search.complete(&search_url, &query_terms).await;
            debug!(count = completions.len(), "fetched search completions");
            maker.make_all(completions)
        }
        .boxed();

        CompleterOutput::new(suggestions)
            .with_filter(filter)
            .with_continuation(continuation)
    }

    async fn refresh(&self) {
        self.previous.lock().clear();
    }

    fn cancel(&self) {
        self.search.cancel();
    }

    /// Mark history and bookmark results that are really searches, so
    /// editing them re-enters the engine's search mode.
    fn post_process_suggestions(&self, request: &CompletionRequest, suggestions: &mut [Suggestion]) {
        let Some(engines) = &request.search_engines else {
            return;
        };
        let mut candidates: Vec<(Option<String>, String)> = engines
            .values()
            .map(|e| (Some(e.keyword.clone()), e.url.clone()))
            .collect();
        candidates.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        candidates.push((None, self.default_search_url.read().clone()));

        for suggestion in suggestions.iter_mut() {
            if suggestion.is_search_suggestion || suggestion.insert_text.is_some() {
                continue;
            }
            for (keyword, search_url) in &candidates {
                let Some(text) = extract_query(search_url, &suggestion.url) else {
                    continue;
                };
                if text.is_empty() {
                    continue;
                }
                if suggestion.title.is_empty() {
                    suggestion.title = text.clone();
                }
                suggestion.insert_text = Some(text);
                suggestion.custom_search_mode = keyword.clone();
                break;
            }
        }
    }
}
