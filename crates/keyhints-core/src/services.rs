//! Shared browsing state owned by the kernel.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use keyhints_completion::{
    BookmarkSource, DomainCompleter, HistoryCache, HistorySource, SearchEngineCompleter,
    StaticBookmarks, StaticHistory, StaticTabs, TabRecency, TabSource,
};
use keyhints_config::{ExclusionRule, ExclusionRules, MemorySettingsStore, UrlStatus};
use keyhints_protocols::{SettingsChange, SettingsStore};

use crate::events::BrowserEvent;

/// Where history, bookmarks and open tabs come from.
#[derive(Clone)]
pub struct BrowserSources {
    pub history: Arc<dyn HistorySource>,
    pub bookmarks: Arc<dyn BookmarkSource>,
    pub tabs: Arc<dyn TabSource>,
}

impl Default for BrowserSources {
    fn default() -> Self {
        Self {
            history: Arc::new(StaticHistory::default()),
            bookmarks: Arc::new(StaticBookmarks::default()),
            tabs: Arc::new(StaticTabs::default()),
        }
    }
}

impl BrowserSources {
    pub fn with_history(mut self, history: Arc<dyn HistorySource>) -> Self {
        self.history = history;
        self
    }

    pub fn with_bookmarks(mut self, bookmarks: Arc<dyn BookmarkSource>) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    pub fn with_tabs(mut self, tabs: Arc<dyn TabSource>) -> Self {
        self.tabs = tabs;
        self
    }
}

pub(crate) struct Services {
    pub settings: Arc<MemorySettingsStore>,
    pub tab_recency: Arc<TabRecency>,
    pub history_cache: Arc<HistoryCache>,
    pub domains: Arc<DomainCompleter>,
    pub search_engines: Arc<SearchEngineCompleter>,
    pub exclusions: RwLock<ExclusionRules>,
}

impl Services {
    pub fn url_status(&self, url: &str) -> UrlStatus {
        self.exclusions.read().is_enabled_for_url(url)
    }

    /// Update browsing state for one event. Tab removal in the hint bus is
    /// handled by the kernel.
    pub fn apply_event(&self, event: &BrowserEvent) {
        match event {
            BrowserEvent::TabActivated { tab_id } => self.tab_recency.register(*tab_id),
            BrowserEvent::TabRemoved { tab_id } => self.tab_recency.deregister(*tab_id),
            BrowserEvent::TabReplaced { removed, added } => {
                self.tab_recency.replace(*removed, *added)
            }
            BrowserEvent::PageVisited { entry } => {
                self.history_cache.on_page_visited(entry.clone());
                self.domains.on_page_visited(entry.clone());
            }
            BrowserEvent::VisitRemoved { removal } => {
                self.history_cache.on_visit_removed(removal);
                self.domains.on_visit_removed(removal);
            }
        }
    }

    /// Push a changed setting into the services that cache it.
    pub fn apply_setting(&self, change: &SettingsChange) {
        let value = change
            .value
            .clone()
            .or_else(|| self.settings.get(&change.key))
            .unwrap_or(Value::Null);
        match change.key.as_str() {
            "search_engines" => match value.as_str() {
                Some(text) => self.search_engines.set_search_engines(text),
                None => warn!("search_engines must be a string"),
            },
            "search_url" => match value.as_str() {
                Some(url) => self.search_engines.set_default_search_url(url),
                None => warn!("search_url must be a string"),
            },
            "exclusion_rules" => match serde_json::from_value::<Vec<ExclusionRule>>(value) {
                Ok(rules) => self.exclusions.write().set_rules(rules),
                Err(e) => warn!("ignoring bad exclusion rules: {}", e),
            },
            key => debug!(key, "setting has no live consumer"),
        }
    }
}
