//! Omnibar suggestion definitions.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::hint::TabId;

#[cfg(test)]
#[path = "suggestion_tests.rs"]
mod tests;

/// Scoring closure evaluated at most once per suggestion.
pub type RelevancyFn = Arc<dyn Fn(&Suggestion) -> f64 + Send + Sync>;

/// Which source produced a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionKind {
    Bookmark,
    History,
    Tab,
    Domain,
    Search,
    CustomSearch,
}

/// One ranked omnibar candidate.
#[derive(Clone, Serialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub query_terms: Vec<String>,
    pub url: String,
    pub title: String,
    /// Display/dedup form used instead of `url` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_url: Option<String>,
    /// Engine description for custom-search suggestions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_search_mode: Option<String>,
    /// Last-visit time for history-backed scoring, in epoch milliseconds.
    #[serde(skip)]
    pub last_visit_time: Option<i64>,
    pub is_search_suggestion: bool,
    pub is_primary_suggestion: bool,
    pub de_duplicate: bool,
    pub auto_select: bool,
    pub highlight_terms: bool,
    #[serde(skip)]
    relevancy: OnceCell<f64>,
    #[serde(skip)]
    relevancy_fn: Option<RelevancyFn>,
}

impl Suggestion {
    pub fn new(kind: SuggestionKind, url: impl Into<String>, query_terms: Vec<String>) -> Self {
        Self {
            kind,
            query_terms,
            url: url.into(),
            title: String::new(),
            short_url: None,
            description: None,
            tab_id: None,
            search_url: None,
            insert_text: None,
            custom_search_mode: None,
            last_visit_time: None,
            is_search_suggestion: false,
            is_primary_suggestion: false,
            de_duplicate: true,
            auto_select: false,
            highlight_terms: true,
            relevancy: OnceCell::new(),
            relevancy_fn: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Fix the relevancy up front; the scoring closure is never consulted.
    pub fn with_relevancy(mut self, relevancy: f64) -> Self {
        self.relevancy = OnceCell::with_value(relevancy);
        self
    }

    pub fn with_relevancy_fn(mut self, f: RelevancyFn) -> Self {
        self.relevancy_fn = Some(f);
        self
    }

    pub fn with_tab_id(mut self, tab_id: TabId) -> Self {
        self.tab_id = Some(tab_id);
        self
    }

    pub fn with_de_duplicate(mut self, de_duplicate: bool) -> Self {
        self.de_duplicate = de_duplicate;
        self
    }

    /// Relevancy score, computed on first use and cached afterwards.
    pub fn compute_relevancy(&self) -> f64 {
        *self.relevancy.get_or_init(|| match &self.relevancy_fn {
            Some(f) => f(self),
            None => 0.0,
        })
    }

    /// The cached relevancy, if it has been computed.
    pub fn relevancy(&self) -> Option<f64> {
        self.relevancy.get().copied()
    }

    /// Forget the cached score so it is recomputed against new query terms.
    pub fn reset_relevancy(&mut self, query_terms: Vec<String>) {
        self.query_terms = query_terms;
        self.relevancy = OnceCell::new();
    }

    /// URL used for display and deduplication.
    pub fn dedup_url(&self) -> &str {
        self.short_url.as_deref().unwrap_or(&self.url)
    }

    /// Raise `score` towards 1 by `factor` of the remaining distance.
    pub fn boost_relevancy_score(factor: f64, score: f64) -> f64 {
        if score < 1.0 {
            score + factor * (1.0 - score)
        } else {
            score
        }
    }
}

impl fmt::Debug for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suggestion")
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("title", &self.title)
            .field("relevancy", &self.relevancy.get())
            .field("de_duplicate", &self.de_duplicate)
            .finish()
    }
}
