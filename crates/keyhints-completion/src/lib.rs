//! # KeyHints Completion
//!
//! Omnibar completion: fuzzy ranking, the multi-source aggregator, the
//! individual completers and search-engine completion lookups.
//!
//! ## Core Items
//!
//! - [`MultiCompleter`] - Runs completers together, one query at a time
//! - [`ranking`] - Word relevancy and recency scoring
//! - [`CompletionSearch`] - Debounced, cached search-engine completions
//! - [`TabRecency`] / [`HistoryCache`] - Shared browsing state

pub mod completers;
pub mod engines;
pub mod history_cache;
pub mod multi_completer;
pub mod prepare;
pub mod ranking;
pub mod search;
pub mod simple_cache;
pub mod sources;
pub mod tab_recency;
pub mod url_utils;

pub use completers::{
    BookmarkCompleter, DomainCompleter, HistoryCompleter, SearchEngineCompleter, TabCompleter,
};
pub use engines::{CompletionEngine, EngineExample, ResponseFormat, builtin_engines};
pub use history_cache::HistoryCache;
pub use multi_completer::{MultiCompleter, ResponseReceiver};
pub use prepare::{prepare_suggestions, simplify_url};
pub use search::CompletionSearch;
pub use sources::{
    BookmarkSource, HistorySource, StaticBookmarks, StaticHistory, StaticTabs, TabSource,
};
pub use tab_recency::TabRecency;
