//! Tab activation order.

use std::collections::{HashMap, HashSet};

use keyhints_protocols::TabId;
use parking_lot::RwLock;
use tracing::debug;

#[derive(Debug)]
struct RecencyState {
    counter: u64,
    tab_to_counter: HashMap<TabId, u64>,
}

/// Associates each tab with the counter value of its latest activation.
///
/// The active tab always holds the maximum counter. Written only by tab
/// events; read by the tab completer.
#[derive(Debug)]
pub struct TabRecency {
    state: RwLock<RecencyState>,
}

impl Default for TabRecency {
    fn default() -> Self {
        Self::new()
    }
}

impl TabRecency {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RecencyState {
                counter: 1,
                tab_to_counter: HashMap::new(),
            }),
        }
    }

    /// Record that `tab_id` became active.
    pub fn register(&self, tab_id: TabId) {
        let mut state = self.state.write();
        state.counter += 1;
        let counter = state.counter;
        state.tab_to_counter.insert(tab_id, counter);
        debug!(tab_id, counter, "tab activated");
    }

    pub fn deregister(&self, tab_id: TabId) {
        self.state.write().tab_to_counter.remove(&tab_id);
    }

    /// A tab was swapped for another (prerender, discard).
    pub fn replace(&self, removed: TabId, added: TabId) {
        self.deregister(removed);
        self.register(added);
    }

    /// Recently active tabs score higher; the current tab scores 0.
    pub fn recency_score(&self, tab_id: TabId) -> f64 {
        let state = self.state.read();
        let tab_counter = state.tab_to_counter.get(&tab_id).copied();
        if tab_counter == Some(state.counter) {
            return 0.0;
        }
        tab_counter.unwrap_or(1) as f64 / state.counter as f64
    }

    /// Known tabs, most recently active first.
    pub fn tabs_by_recency(&self) -> Vec<TabId> {
        let state = self.state.read();
        let mut tabs: Vec<(TabId, u64)> = state
            .tab_to_counter
            .iter()
            .map(|(tab, counter)| (*tab, *counter))
            .collect();
        tabs.sort_by(|a, b| b.1.cmp(&a.1));
        tabs.into_iter().map(|(tab, _)| tab).collect()
    }

    /// Copy of the tab-to-counter table, for persistence.
    pub fn snapshot(&self) -> HashMap<TabId, u64> {
        self.state.read().tab_to_counter.clone()
    }

    /// Reload a persisted table, keeping only tabs that are still open.
    pub fn restore(&self, saved: HashMap<TabId, u64>, open_tabs: &[TabId]) {
        let open: HashSet<TabId> = open_tabs.iter().copied().collect();
        let mut state = self.state.write();
        let max_saved = saved.values().copied().max().unwrap_or(0);
        if state.counter < max_saved {
            state.counter = max_saved;
        }
        state.tab_to_counter = saved
            .into_iter()
            .filter(|(tab, _)| open.contains(tab))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_tab_scores_zero() {
        let recency = TabRecency::new();
        recency.register(1);
        recency.register(2);
        assert_eq!(recency.recency_score(2), 0.0);
        assert!(recency.recency_score(1) > 0.0);
    }

    #[test]
    fn test_more_recent_scores_higher() {
        let recency = TabRecency::new();
        for tab in [1, 2, 3, 4] {
            recency.register(tab);
        }
        assert!(recency.recency_score(3) > recency.recency_score(2));
        assert!(recency.recency_score(2) > recency.recency_score(1));
    }

    #[test]
    fn test_unknown_tab_scores_minimum() {
        let recency = TabRecency::new();
        recency.register(1);
        recency.register(2);
        // counter is 3
        assert!((recency.recency_score(99) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_tabs_by_recency() {
        let recency = TabRecency::new();
        for tab in [10, 20, 30] {
            recency.register(tab);
        }
        recency.register(10);
        assert_eq!(recency.tabs_by_recency(), vec![10, 30, 20]);
    }

    #[test]
    fn test_deregister_and_replace() {
        let recency = TabRecency::new();
        recency.register(1);
        recency.register(2);
        recency.deregister(1);
        assert_eq!(recency.tabs_by_recency(), vec![2]);

        recency.replace(2, 3);
        assert_eq!(recency.tabs_by_recency(), vec![3]);
        assert_eq!(recency.recency_score(3), 0.0);
    }

    #[test]
    fn test_restore_drops_closed_tabs() {
        let recency = TabRecency::new();
        let saved = HashMap::from([(1, 5), (2, 9), (3, 7)]);
        recency.restore(saved, &[1, 2]);
        assert_eq!(recency.tabs_by_recency(), vec![2, 1]);
        assert_eq!(recency.recency_score(2), 0.0);

        recency.register(1);
        assert_eq!(recency.snapshot().get(&1), Some(&10));
    }
}
