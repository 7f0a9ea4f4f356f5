//! Fetches search-query completions from the engine matching a search URL.
//!
//! Requests are debounced while the user types, identical in-flight
//! requests are shared, and results (including failures) are cached.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use keyhints_config::CompletionConfig;
use keyhints_protocols::CompletionError;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use tracing::{debug, warn};

use crate::engines::{CompletionEngine, builtin_engines, lookup_engine};
use crate::simple_cache::SimpleCache;
use crate::url_utils::{has_javascript_prefix, is_url};

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;

static PREFIX_TERMS: Lazy<Regex> = Lazy::new(|| Regex::new(r"=.+\+%s").expect("valid regex"));

type InTransit = Shared<BoxFuture<'static, Option<Vec<String>>>>;

/// Terms embedded in a search URL of the form `...=abc+def+%s`.
pub fn prefix_terms(search_url: &str) -> Option<String> {
    if !PREFIX_TERMS.is_match(search_url) {
        return None;
    }
    let head = search_url.split("+%s").next().unwrap_or_default();
    let terms = head.rsplit('=').next().unwrap_or_default();
    Some(terms.replace('+', " "))
}

#[derive(Debug, Clone)]
struct RecentQuery {
    search_url: String,
    query: String,
    suggestions: Vec<String>,
}

/// Completion lookups shared by every search completer.
pub struct CompletionSearch {
    client: reqwest::Client,
    engines: Vec<Arc<CompletionEngine>>,
    config: CompletionConfig,
    completion_cache: Mutex<SimpleCache<String, Vec<String>>>,
    engine_cache: Mutex<HashMap<String, Arc<CompletionEngine>>>,
    in_transit: Mutex<HashMap<String, InTransit>>,
    most_recent: Mutex<Option<RecentQuery>>,
    request_id: AtomicU64,
}

impl CompletionSearch {
    pub fn new(config: CompletionConfig) -> Self {
        Self::with_engines(builtin_engines(), config)
    }

    pub fn with_engines(engines: Vec<Arc<CompletionEngine>>, config: CompletionConfig) -> Self {
        let cache = SimpleCache::new(
            Duration::from_secs(config.cache_expiry_secs),
            config.cache_capacity,
        );
        Self {
            client: reqwest::Client::new(),
            engines,
            config,
            completion_cache: Mutex::new(cache),
            engine_cache: Mutex::new(HashMap::new()),
            in_transit: Mutex::new(HashMap::new()),
            most_recent: Mutex::new(None),
            request_id: AtomicU64::new(0),
        }
    }

    pub fn engines(&self) -> &[Arc<CompletionEngine>] {
        &self.engines
    }

    /// Engine serving `search_url`, memoized per URL.
    pub fn lookup_engine(&self, search_url: &str) -> Option<Arc<CompletionEngine>> {
        if let Some(engine) = self.engine_cache.lock().get(search_url) {
            return Some(engine.clone());
        }
        let engine = lookup_engine(&self.engines, search_url)?;
        self.engine_cache
            .lock()
            .insert(search_url.to_string(), engine.clone());
        Some(engine)
    }

    /// True when a real (non-catch-all) engine serves `search_url`.
    pub fn have_completion_engine(&self, search_url: &str) -> bool {
        self.lookup_engine(search_url)
            .is_some_and(|engine| !engine.is_dummy())
    }

    /// Abandon any request still waiting out the debounce delay.
    pub fn cancel(&self) {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(request_id = id, "completion search cancelled");
    }

    fn cache_key(search_url: &str, query_terms: &[String]) -> String {
        serde_json::json!([search_url, query_terms]).to_string()
    }

    fn is_completable(&self, query: &str, query_terms: &[String]) -> bool {
        if query.chars().count() < self.config.min_query_length {
            return false;
        }
        if query_terms.len() == 1 && is_url(query) {
            return false;
        }
        !has_javascript_prefix(query)
    }

    /// Completions available without a network request, if any.
    pub fn complete_cached(&self, search_url: &str, query_terms: &[String]) -> Option<Vec<String>> {
        let query = query_terms.join(" ").to_lowercase();
        if !self.is_completable(&query, query_terms) {
            return Some(Vec::new());
        }

        let key = Self::cache_key(search_url, query_terms);
        if let Some(hit) = self.completion_cache.lock().get(&key) {
            return Some(hit);
        }

        // Typing further into a query whose every suggestion still contains
        // the new text needs no new request. Empty results qualify too, which
        // stops hopeless requests while the user keeps typing.
        let recent = self.most_recent.lock().clone();
        if let Some(recent) = recent {
            if recent.search_url == search_url
                && query.starts_with(&recent.query)
                && recent.suggestions.iter().all(|s| s.contains(&query))
            {
                debug!(query = %recent.query, "reusing previous completions");
                return Some(self.completion_cache.lock().set(key, recent.suggestions));
            }
        }
        None
    }

    /// Completions for `query_terms` against the engine serving `search_url`.
    /// Resolves to nothing when superseded, unsupported or failed.
    pub async fn complete(self: &Arc<Self>, search_url: &str, query_terms: &[String]) -> Vec<String> {
        if let Some(cached) = self.complete_cached(search_url, query_terms) {
            return cached;
        }
        let Some(engine) = self.lookup_engine(search_url).filter(|e| !e.is_dummy()) else {
            return Vec::new();
        };

        let request_id = self.request_id.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(self.config.debounce_ms)).await;
        if self.request_id.load(Ordering::SeqCst) != request_id {
            debug!(request_id, "completion request superseded");
            return Vec::new();
        }

        let key = Self::cache_key(search_url, query_terms);
        let query = query_terms.join(" ").to_lowercase();
        let fetch = self.in_transit_fetch(&key, engine, search_url, query_terms, &query);
        let fetched = fetch.await;
        self.in_transit.lock().remove(&key);

        let suggestions = match fetched {
            Some(suggestions) => {
                *self.most_recent.lock() = Some(RecentQuery {
                    search_url: search_url.to_string(),
                    query: query.clone(),
                    suggestions: suggestions.clone(),
                });
                self.completion_cache.lock().set(key, suggestions)
            }
            None => {
                let expiry = Duration::from_secs(self.config.failure_cache_secs);
                self.completion_cache
                    .lock()
                    .set_with_expiry(key, Vec::new(), expiry)
            }
        };

        if self.request_id.load(Ordering::SeqCst) != request_id {
            return Vec::new();
        }
        suggestions
    }

    fn in_transit_fetch(
        &self,
        key: &str,
        engine: Arc<CompletionEngine>,
        search_url: &str,
        query_terms: &[String],
        query: &str,
    ) -> InTransit {
        let mut in_transit = self.in_transit.lock();
        if let Some(fetch) = in_transit.get(key) {
            return fetch.clone();
        }

        let client = self.client.clone();
        let timeout = Duration::from_millis(self.config.request_timeout_ms);
        let prefix = prefix_terms(search_url);
        let mut terms: Vec<String> = Vec::new();
        if let Some(prefix) = &prefix {
            terms.extend(prefix.split(' ').map(str::to_string));
        }
        terms.extend(query_terms.iter().cloned());
        let query = query.to_string();

        let fetch = async move {
            let url = engine.url_for(&terms)?;
            match fetch_suggestions(&client, &engine, &url, timeout).await {
                Ok(suggestions) => {
                    let suggestions = match &prefix {
                        Some(prefix) => {
                            let prefix = format!("{prefix} ");
                            suggestions
                                .into_iter()
                                .filter_map(|s| s.strip_prefix(&prefix).map(str::to_string))
                                .collect()
                        }
                        None => suggestions,
                    };
                    debug!(engine = %engine.name, %url, "fetched completions");
                    Some(
                        suggestions
                            .into_iter()
                            .map(|s| s.to_lowercase())
                            .filter(|s| *s != query)
                            .collect(),
                    )
                }
                Err(e) => {
                    warn!(engine = %engine.name, %url, error = %e, "completion fetch failed");
                    None
                }
            }
        }
        .boxed()
        .shared();

        in_transit.insert(key.to_string(), fetch.clone());
        fetch
    }
}

async fn fetch_suggestions(
    client: &reqwest::Client,
    engine: &CompletionEngine,
    url: &str,
    timeout: Duration,
) -> Result<Vec<String>, CompletionError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout(timeout.as_millis() as u64)
            } else {
                CompletionError::Http(e.to_string())
            }
        })?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(CompletionError::Status(status.as_u16()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| CompletionError::Http(e.to_string()))?;
    engine.parse(&body)
}
