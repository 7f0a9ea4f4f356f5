//! URL-sorted cache of browsing history.

use std::cmp::Ordering;
use std::sync::Arc;

use keyhints_protocols::{HistoryEntry, VisitRemoval};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::sources::HistorySource;

#[cfg(test)]
#[path = "history_cache_tests.rs"]
mod tests;

/// Index of `target` in `entries` (sorted by `compare`), or the index it
/// would be inserted at.
pub fn binary_search<T, F>(target: &T, entries: &[T], compare: F) -> usize
where
    F: Fn(&T, &T) -> Ordering,
{
    let mut low = 0;
    let mut high = entries.len();
    while low < high {
        let mid = low + (high - low) / 2;
        match compare(&entries[mid], target) {
            Ordering::Less => low = mid + 1,
            Ordering::Greater => high = mid,
            Ordering::Equal => return mid,
        }
    }
    low
}

fn by_url(a: &HistoryEntry, b: &HistoryEntry) -> Ordering {
    a.url.cmp(&b.url)
}

/// Loads history once, then tracks visits and removals.
///
/// Readers get a shared snapshot; writers copy on write.
pub struct HistoryCache {
    source: Arc<dyn HistorySource>,
    size: usize,
    history: RwLock<Option<Arc<Vec<HistoryEntry>>>>,
    load_lock: Mutex<()>,
}

impl HistoryCache {
    pub fn new(source: Arc<dyn HistorySource>, size: usize) -> Self {
        Self {
            source,
            size,
            history: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.history.read().is_some()
    }

    /// The cached history, loading it from the source on first use.
    pub async fn use_history(&self) -> Arc<Vec<HistoryEntry>> {
        if let Some(history) = self.history.read().clone() {
            return history;
        }

        let _guard = self.load_lock.lock().await;
        if let Some(history) = self.history.read().clone() {
            return history;
        }

        let mut entries = match self.source.search(self.size).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "failed to load history");
                Vec::new()
            }
        };
        entries.sort_by(by_url);
        entries.dedup_by(|a, b| a.url == b.url);
        entries.truncate(self.size);
        debug!(entries = entries.len(), "history loaded");

        let history = Arc::new(entries);
        *self.history.write() = Some(history.clone());
        history
    }

    /// Record a visit, replacing any existing entry for the URL.
    pub fn on_page_visited(&self, entry: HistoryEntry) {
        let mut guard = self.history.write();
        let Some(history) = guard.as_mut() else {
            return;
        };
        let history = Arc::make_mut(history);
        let index = binary_search(&entry, history, by_url);
        if history.get(index).is_some_and(|existing| existing.url == entry.url) {
            history[index] = entry;
        } else {
            history.insert(index, entry);
        }
    }

    pub fn on_visit_removed(&self, removal: &VisitRemoval) {
        let mut guard = self.history.write();
        let Some(history) = guard.as_mut() else {
            return;
        };
        let history = Arc::make_mut(history);
        match removal {
            VisitRemoval::All => history.clear(),
            VisitRemoval::Urls(urls) => {
                for url in urls {
                    let probe = HistoryEntry::new(url.clone(), "", 0);
                    let index = binary_search(&probe, history, by_url);
                    if history.get(index).is_some_and(|existing| &existing.url == url) {
                        history.remove(index);
                    }
                }
            }
        }
    }
}
