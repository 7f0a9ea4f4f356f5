use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use keyhints_protocols::{
    CompleterOutput, Completer, CompletionRequest, HistoryEntry, Suggestion, SuggestionKind,
    VisitRemoval,
};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;

use crate::history_cache::HistoryCache;
use crate::ranking::{recency_score, word_relevancy};
use crate::url_utils::{has_chrome_prefix, has_full_url_prefix};

/// Whitespace after a word: the user has moved past the first term.
static FINISHED_FIRST_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S\s").expect("valid regex"));

const DOMAIN_RELEVANCY: f64 = 2.0;

/// `scheme://host` of `url`, for URLs worth offering as domains.
pub fn parse_domain_and_scheme(url: &str) -> Option<String> {
    if !has_full_url_prefix(url) || has_chrome_prefix(url) {
        return None;
    }
    Some(url.splitn(4, '/').take(3).collect::<Vec<_>>().join("/"))
}

#[derive(Debug, Clone)]
struct DomainSlot {
    entry: HistoryEntry,
    reference_count: usize,
}

/// Offers the single best-matching domain while the first word is typed.
///
/// The domain table is built from history on first use, then kept current
/// from visit and removal events.
pub struct DomainCompleter {
    cache: Arc<HistoryCache>,
    domains: RwLock<Option<BTreeMap<String, DomainSlot>>>,
}

impl DomainCompleter {
    pub fn new(cache: Arc<HistoryCache>) -> Self {
        Self {
            cache,
            domains: RwLock::new(None),
        }
    }

    async fn populate(&self) {
        if self.domains.read().is_some() {
            return;
        }
        let history = self.cache.use_history().await;
        let mut domains = BTreeMap::new();
        for entry in history.iter() {
            add_visit(&mut domains, entry.clone());
        }
        let mut guard = self.domains.write();
        if guard.is_none() {
            *guard = Some(domains);
        }
    }

    pub fn on_page_visited(&self, entry: HistoryEntry) {
        if let Some(domains) = self.domains.write().as_mut() {
            add_visit(domains, entry);
        }
    }

    pub fn on_visit_removed(&self, removal: &VisitRemoval) {
        let mut guard = self.domains.write();
        let Some(domains) = guard.as_mut() else {
            return;
        };
        match removal {
            VisitRemoval::All => domains.clear(),
            VisitRemoval::Urls(urls) => {
                for url in urls {
                    let Some(domain) = parse_domain_and_scheme(url) else {
                        continue;
                    };
                    if let Some(slot) = domains.get_mut(&domain) {
                        slot.reference_count = slot.reference_count.saturating_sub(1);
                        if slot.reference_count == 0 {
                            domains.remove(&domain);
                        }
                    }
                }
            }
        }
    }

    fn best_domain(&self, query_terms: &[String]) -> Option<String> {
        let guard = self.domains.read();
        let domains = guard.as_ref()?;
        let needle = query_terms.first()?;

        let mut scored: Vec<(&String, f64)> = domains
            .iter()
            .filter(|(domain, _)| domain.contains(needle.as_str()))
            .map(|(domain, slot)| {
                let recency = recency_score(slot.entry.last_visit_time);
                let word = word_relevancy(query_terms, domain, None);
                (domain, (word + recency.max(word)) / 2.0)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.first().map(|(domain, _)| (*domain).clone())
    }
}

fn add_visit(domains: &mut BTreeMap<String, DomainSlot>, entry: HistoryEntry) {
    let Some(domain) = parse_domain_and_scheme(&entry.url) else {
        return;
    };
    let slot = domains.entry(domain).or_insert_with(|| DomainSlot {
        entry: entry.clone(),
        reference_count: 0,
    });
    // Each domain points at its most recent visit.
    if slot.entry.last_visit_time < entry.last_visit_time {
        slot.entry = entry;
    }
    slot.reference_count += 1;
}

#[async_trait]
impl Completer for DomainCompleter {
    fn name(&self) -> &str {
        "domains"
    }

    async fn filter(&self, request: &CompletionRequest) -> CompleterOutput {
        if request.query_terms.len() != 1 || FINISHED_FIRST_WORD.is_match(&request.query) {
            return CompleterOutput::empty();
        }
        self.populate().await;

        match self.best_domain(&request.query_terms) {
            Some(domain) => CompleterOutput::new(vec![
                Suggestion::new(SuggestionKind::Domain, domain, request.query_terms.clone())
                    .with_relevancy(DOMAIN_RELEVANCY),
            ]),
            None => CompleterOutput::empty(),
        }
    }

    async fn refresh(&self) {
        self.populate().await;
    }
}
