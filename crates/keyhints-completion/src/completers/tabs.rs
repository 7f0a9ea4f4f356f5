use std::sync::Arc;

use async_trait::async_trait;
use keyhints_protocols::{CompleterOutput, Completer, CompletionRequest, Suggestion, SuggestionKind};
use tracing::warn;

use crate::ranking::{matches, word_relevancy};
use crate::sources::TabSource;
use crate::tab_recency::TabRecency;

/// Open tabs. Never de-duplicated against other sources.
pub struct TabCompleter {
    source: Arc<dyn TabSource>,
    recency: Arc<TabRecency>,
}

impl TabCompleter {
    pub fn new(source: Arc<dyn TabSource>, recency: Arc<TabRecency>) -> Self {
        Self { source, recency }
    }
}

#[async_trait]
impl Completer for TabCompleter {
    fn name(&self) -> &str {
        "tabs"
    }

    async fn filter(&self, request: &CompletionRequest) -> CompleterOutput {
        let tabs = match self.source.tabs().await {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!(error = %e, "failed to query tabs");
                return CompleterOutput::empty();
            }
        };

        let terms = &request.query_terms;
        let suggestions = tabs
            .into_iter()
            .filter(|tab| matches(terms, &[tab.url.as_str(), tab.title.as_str()]))
            .map(|tab| {
                let recency = self.recency.clone();
                Suggestion::new(SuggestionKind::Tab, tab.url, terms.clone())
                    .with_title(tab.title)
                    .with_tab_id(tab.id)
                    .with_de_duplicate(false)
                    .with_relevancy_fn(Arc::new(move |s: &Suggestion| {
                        if s.query_terms.is_empty() {
                            s.tab_id.map(|id| recency.recency_score(id)).unwrap_or_default()
                        } else {
                            word_relevancy(&s.query_terms, &s.url, Some(s.title.as_str()))
                        }
                    }))
            })
            .collect();
        CompleterOutput::new(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::StaticTabs;
    use keyhints_protocols::TabInfo;

    fn completer(recency: Arc<TabRecency>) -> TabCompleter {
        let tabs = StaticTabs(vec![
            TabInfo { id: 1, url: "tab1.com".into(), title: "tab1".into() },
            TabInfo { id: 2, url: "tab2.com".into(), title: "tab2".into() },
            TabInfo { id: 3, url: "tab3.com".into(), title: "tab3".into() },
        ]);
        TabCompleter::new(Arc::new(tabs), recency)
    }

    #[tokio::test]
    async fn test_returns_matching_tabs() {
        let out = completer(Arc::new(TabRecency::new()))
            .filter(&CompletionRequest::new("tab2"))
            .await;
        assert_eq!(out.suggestions.len(), 1);
        assert_eq!(out.suggestions[0].url, "tab2.com");
        assert_eq!(out.suggestions[0].tab_id, Some(2));
        assert!(!out.suggestions[0].de_duplicate);
    }

    #[tokio::test]
    async fn test_empty_query_ranks_by_recency() {
        let recency = Arc::new(TabRecency::new());
        recency.register(1);
        recency.register(3);
        recency.register(2);

        let out = completer(recency).filter(&CompletionRequest::new("")).await;
        let score = |id| {
            out.suggestions
                .iter()
                .find(|s| s.tab_id == Some(id))
                .map(|s| s.compute_relevancy())
                .unwrap_or(-1.0)
        };
        assert_eq!(score(2), 0.0);
        assert!(score(3) > score(1));
    }
}
