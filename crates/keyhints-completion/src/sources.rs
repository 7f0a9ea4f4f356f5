//! Seams to the browser's history, bookmark and tab stores.

use async_trait::async_trait;
use keyhints_protocols::{BookmarkNode, CompletionError, HistoryEntry, TabInfo};

/// Browsing history provider.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Up to `max_results` entries, in any order.
    async fn search(&self, max_results: usize) -> Result<Vec<HistoryEntry>, CompletionError>;
}

/// Bookmark tree provider.
#[async_trait]
pub trait BookmarkSource: Send + Sync {
    async fn tree(&self) -> Result<Vec<BookmarkNode>, CompletionError>;
}

/// Open-tab provider.
#[async_trait]
pub trait TabSource: Send + Sync {
    async fn tabs(&self) -> Result<Vec<TabInfo>, CompletionError>;
}

/// In-memory history, e.g. loaded from an export file.
#[derive(Debug, Clone, Default)]
pub struct StaticHistory(pub Vec<HistoryEntry>);

#[async_trait]
impl HistorySource for StaticHistory {
    async fn search(&self, max_results: usize) -> Result<Vec<HistoryEntry>, CompletionError> {
        Ok(self.0.iter().take(max_results).cloned().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticBookmarks(pub Vec<BookmarkNode>);

#[async_trait]
impl BookmarkSource for StaticBookmarks {
    async fn tree(&self) -> Result<Vec<BookmarkNode>, CompletionError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticTabs(pub Vec<TabInfo>);

#[async_trait]
impl TabSource for StaticTabs {
    async fn tabs(&self) -> Result<Vec<TabInfo>, CompletionError> {
        Ok(self.0.clone())
    }
}
