//! Completer protocol definitions.
//!
//! A completer is one asynchronous suggestion source. The aggregator fans a
//! request out to every completer, waits for all of them, then ranks the merged
//! list.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::suggestion::Suggestion;
use crate::types::UserSearchEngine;

#[cfg(test)]
#[path = "completer_tests.rs"]
mod tests;

/// Filter applied to the merged list from every completer.
pub type SuggestionFilter = Arc<dyn Fn(Vec<Suggestion>) -> Vec<Suggestion> + Send + Sync>;

/// Deferred extra suggestions, e.g. a network completion lookup.
pub type Continuation = BoxFuture<'static, Vec<Suggestion>>;

/// An omnibar query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub query: String,
    pub query_terms: Vec<String>,
    /// Completer source name, e.g. "omni", "tabs", "bookmarks".
    pub name: String,
    /// The user opened the list with Tab on an empty query.
    #[serde(default)]
    pub seen_tab_to_open_completion_list: bool,
    /// Keyword of the custom search engine selected by preprocessing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<UserSearchEngine>,
    /// All configured engines, attached during preprocessing.
    #[serde(skip)]
    pub search_engines: Option<Arc<HashMap<String, UserSearchEngine>>>,
}

impl CompletionRequest {
    /// Build a request, splitting the query on whitespace.
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        let query_terms = query.split_whitespace().map(str::to_string).collect();
        Self {
            query,
            query_terms,
            name: "omni".to_string(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// True once a custom search engine keyword has been recognised.
    pub fn is_custom_search(&self) -> bool {
        self.engine.is_some()
    }
}

/// One delivery of ranked results.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionResponse {
    pub results: Vec<Suggestion>,
    /// False when a continuation may still add results.
    pub may_cache_results: bool,
}

/// What a completer hands back for one request.
#[derive(Default)]
pub struct CompleterOutput {
    pub suggestions: Vec<Suggestion>,
    pub filter: Option<SuggestionFilter>,
    pub continuation: Option<Continuation>,
}

impl CompleterOutput {
    pub fn new(suggestions: Vec<Suggestion>) -> Self {
        Self {
            suggestions,
            filter: None,
            continuation: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: SuggestionFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_continuation(mut self, continuation: Continuation) -> Self {
        self.continuation = Some(continuation);
        self
    }
}

impl fmt::Debug for CompleterOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompleterOutput")
            .field("suggestions", &self.suggestions.len())
            .field("has_filter", &self.filter.is_some())
            .field("has_continuation", &self.continuation.is_some())
            .finish()
    }
}

/// An asynchronous suggestion source.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Stable identifier, used by the kernel registry.
    fn name(&self) -> &str;

    /// Give the completer a chance to rewrite the request before any filtering.
    fn preprocess_request(&self, _request: &mut CompletionRequest) {}

    /// Produce suggestions for the request.
    async fn filter(&self, request: &CompletionRequest) -> CompleterOutput;

    /// Reload any backing data.
    async fn refresh(&self) {}

    /// Abandon outstanding asynchronous work.
    fn cancel(&self) {}

    /// Enrich the final, capped list.
    fn post_process_suggestions(&self, _request: &CompletionRequest, _suggestions: &mut [Suggestion]) {}
}
