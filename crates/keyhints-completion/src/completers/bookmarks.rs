use std::sync::Arc;

use async_trait::async_trait;
use keyhints_protocols::{
    BookmarkNode, CompleterOutput, Completer, CompletionRequest, Suggestion, SuggestionKind,
};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::ranking::{matches, word_relevancy};
use crate::sources::BookmarkSource;
use crate::url_utils::has_javascript_prefix;

const FOLDER_SEPARATOR: &str = "/";

/// Browser-provided root folders left out of bookmark paths.
const IGNORED_TOP_LEVEL: &[&str] = &["Other Bookmarks", "Mobile Bookmarks", "Bookmarks Bar"];

/// A bookmark (or folder) with its folder path resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatBookmark {
    pub title: String,
    pub url: Option<String>,
    /// e.g. `/Work/Rust/The Book`.
    pub path_and_title: String,
    pub short_url: Option<String>,
}

/// Depth-first, parents before children.
pub fn flatten_bookmarks(tree: &[BookmarkNode]) -> Vec<FlatBookmark> {
    let mut out = Vec::new();
    for node in tree {
        flatten_into(node, "", &mut out);
    }
    out
}

fn flatten_into(node: &BookmarkNode, parent_path: &str, out: &mut Vec<FlatBookmark>) {
    let skip_title = node.title.is_empty()
        || (parent_path.is_empty() && IGNORED_TOP_LEVEL.contains(&node.title.as_str()));
    let path_and_title = if skip_title {
        parent_path.to_string()
    } else {
        format!("{parent_path}{FOLDER_SEPARATOR}{}", node.title)
    };

    let short_url = node
        .url
        .as_deref()
        .filter(|url| has_javascript_prefix(url))
        .map(|_| "javascript:...".to_string());

    out.push(FlatBookmark {
        title: node.title.clone(),
        url: node.url.clone(),
        path_and_title: path_and_title.clone(),
        short_url,
    });
    for child in &node.children {
        flatten_into(child, &path_and_title, out);
    }
}

/// Bookmarks; a term starting with `/` switches matching to folder paths.
pub struct BookmarkCompleter {
    source: Arc<dyn BookmarkSource>,
    bookmarks: RwLock<Option<Arc<Vec<FlatBookmark>>>>,
}

impl BookmarkCompleter {
    pub fn new(source: Arc<dyn BookmarkSource>) -> Self {
        Self {
            source,
            bookmarks: RwLock::new(None),
        }
    }

    async fn load(&self) -> Arc<Vec<FlatBookmark>> {
        let tree = match self.source.tree().await {
            Ok(tree) => tree,
            Err(e) => {
                warn!(error = %e, "failed to load bookmarks");
                Vec::new()
            }
        };
        let bookmarks: Vec<FlatBookmark> = flatten_bookmarks(&tree)
            .into_iter()
            .filter(|b| b.url.is_some())
            .collect();
        debug!(bookmarks = bookmarks.len(), "bookmarks loaded");
        let bookmarks = Arc::new(bookmarks);
        *self.bookmarks.write() = Some(bookmarks.clone());
        bookmarks
    }

    async fn bookmarks(&self) -> Arc<Vec<FlatBookmark>> {
        let loaded = self.bookmarks.read().clone();
        match loaded {
            Some(bookmarks) => bookmarks,
            None => self.load().await,
        }
    }
}

fn compute_relevancy(suggestion: &Suggestion) -> f64 {
    word_relevancy(
        &suggestion.query_terms,
        suggestion.dedup_url(),
        Some(suggestion.title.as_str()),
    )
}

#[async_trait]
impl Completer for BookmarkCompleter {
    fn name(&self) -> &str {
        "bookmarks"
    }

    async fn filter(&self, request: &CompletionRequest) -> CompleterOutput {
        let terms = &request.query_terms;
        if terms.is_empty() {
            return CompleterOutput::empty();
        }
        let use_path = terms.iter().any(|t| t.starts_with(FOLDER_SEPARATOR));
        let bookmarks = self.bookmarks().await;

        let suggestions = bookmarks
            .iter()
            .filter_map(|bookmark| {
                let url = bookmark.url.as_deref()?;
                let title = if use_path { &bookmark.path_and_title } else { &bookmark.title };
                let shown_url = bookmark.short_url.as_deref().unwrap_or(url);
                if !matches(terms, &[shown_url, title.as_str()]) {
                    return None;
                }
                let mut suggestion = Suggestion::new(SuggestionKind::Bookmark, url, terms.clone())
                    .with_title(title.clone())
                    .with_de_duplicate(bookmark.short_url.is_none())
                    .with_relevancy_fn(Arc::new(compute_relevancy));
                suggestion.short_url = bookmark.short_url.clone();
                Some(suggestion)
            })
            .collect();
        CompleterOutput::new(suggestions)
    }

    async fn refresh(&self) {
        self.load().await;
    }
}
