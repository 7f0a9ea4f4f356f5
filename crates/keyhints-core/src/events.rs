//! Browser events the kernel reacts to.

use serde::{Deserialize, Serialize};

use keyhints_protocols::{HistoryEntry, TabId, VisitRemoval};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BrowserEvent {
    /// The user switched to a tab.
    TabActivated { tab_id: TabId },
    TabRemoved { tab_id: TabId },
    /// A tab was swapped for another, e.g. by prerendering.
    TabReplaced { removed: TabId, added: TabId },
    PageVisited { entry: HistoryEntry },
    VisitRemoved { removal: VisitRemoval },
}

impl BrowserEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BrowserEvent::TabActivated { .. } => "tab_activated",
            BrowserEvent::TabRemoved { .. } => "tab_removed",
            BrowserEvent::TabReplaced { .. } => "tab_replaced",
            BrowserEvent::PageVisited { .. } => "page_visited",
            BrowserEvent::VisitRemoved { .. } => "visit_removed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_names() {
        assert_eq!(BrowserEvent::TabActivated { tab_id: 1 }.name(), "tab_activated");
        assert_eq!(
            BrowserEvent::TabReplaced { removed: 1, added: 2 }.name(),
            "tab_replaced"
        );
    }

    #[test]
    fn test_event_from_json() {
        let event: BrowserEvent = serde_json::from_value(json!({
            "event": "page_visited",
            "entry": {"url": "https://tokio.rs/", "title": "Tokio", "last_visit_time": 5}
        }))
        .unwrap();
        assert_eq!(
            event,
            BrowserEvent::PageVisited {
                entry: HistoryEntry::new("https://tokio.rs/", "Tokio", 5)
            }
        );
    }
}
