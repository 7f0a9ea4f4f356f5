//! Plain data records shared between the settings, completion and kernel crates.

use serde::{Deserialize, Serialize};

use crate::hint::TabId;

/// One entry of the user's custom search-engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSearchEngine {
    pub keyword: String,
    /// Search URL template containing `%s`.
    pub url: String,
    pub description: String,
}

/// A browsing-history record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Epoch milliseconds.
    #[serde(default)]
    pub last_visit_time: i64,
}

impl HistoryEntry {
    pub fn new(url: impl Into<String>, title: impl Into<String>, last_visit_time: i64) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            last_visit_time,
        }
    }
}

/// Removal notification for history entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitRemoval {
    All,
    Urls(Vec<String>),
}

/// A node of the bookmark tree; folders have children and no URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkNode {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BookmarkNode>,
}

impl BookmarkNode {
    pub fn link(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: Some(url.into()),
            children: Vec::new(),
        }
    }

    pub fn folder(title: impl Into<String>, children: Vec<BookmarkNode>) -> Self {
        Self {
            title: title.into(),
            url: None,
            children,
        }
    }
}

/// An open browser tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    pub url: String,
    #[serde(default)]
    pub title: String,
}
