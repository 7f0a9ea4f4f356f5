//! Suggestion sources.

mod bookmarks;
mod domains;
mod history;
mod search_engine;
mod tabs;

pub use bookmarks::{BookmarkCompleter, FlatBookmark, flatten_bookmarks};
pub use domains::{DomainCompleter, parse_domain_and_scheme};
pub use history::HistoryCompleter;
pub use search_engine::SearchEngineCompleter;
pub use tabs::TabCompleter;
