use super::*;
use crate::sources::StaticHistory;

fn entry(url: &str, t: i64) -> HistoryEntry {
    HistoryEntry::new(url, "", t)
}

fn urls(history: &[HistoryEntry]) -> Vec<&str> {
    history.iter().map(|e| e.url.as_str()).collect()
}

fn cache(entries: Vec<HistoryEntry>) -> HistoryCache {
    HistoryCache::new(Arc::new(StaticHistory(entries)), 100)
}

#[test]
fn test_binary_search() {
    let cmp = |a: &i32, b: &i32| a.cmp(b);
    let values = [10, 20, 30, 40, 50];
    assert_eq!(binary_search(&30, &values, cmp), 2);
    assert_eq!(binary_search(&10, &values, cmp), 0);
    assert_eq!(binary_search(&5, &values, cmp), 0);
    assert_eq!(binary_search(&35, &values, cmp), 3);
    assert_eq!(binary_search(&60, &values, cmp), 5);
    assert_eq!(binary_search(&1, &[], cmp), 0);
}

#[tokio::test]
async fn test_use_history_sorts_by_url() {
    let cache = cache(vec![entry("c.com", 1), entry("a.com", 2), entry("b.com", 3)]);
    assert!(!cache.is_loaded());
    let history = cache.use_history().await;
    assert_eq!(urls(&history), ["a.com", "b.com", "c.com"]);
    assert!(cache.is_loaded());
}

#[tokio::test]
async fn test_page_visited_replaces_or_inserts() {
    let cache = cache(vec![entry("a.com", 1), entry("c.com", 1)]);
    cache.use_history().await;

    cache.on_page_visited(entry("b.com", 5));
    cache.on_page_visited(entry("a.com", 9));

    let history = cache.use_history().await;
    assert_eq!(urls(&history), ["a.com", "b.com", "c.com"]);
    assert_eq!(history[0].last_visit_time, 9);
}

#[tokio::test]
async fn test_snapshot_is_stable_across_writes() {
    let cache = cache(vec![entry("a.com", 1)]);
    let before = cache.use_history().await;
    cache.on_page_visited(entry("z.com", 2));
    assert_eq!(before.len(), 1);
    assert_eq!(cache.use_history().await.len(), 2);
}

#[tokio::test]
async fn test_visit_removed() {
    let cache = cache(vec![entry("a.com", 1), entry("b.com", 1), entry("c.com", 1)]);
    cache.use_history().await;

    cache.on_visit_removed(&VisitRemoval::Urls(vec!["b.com".into(), "missing.com".into()]));
    assert_eq!(urls(&cache.use_history().await), ["a.com", "c.com"]);

    cache.on_visit_removed(&VisitRemoval::All);
    assert!(cache.use_history().await.is_empty());
}

#[tokio::test]
async fn test_events_before_load_are_ignored() {
    let cache = cache(vec![entry("a.com", 1)]);
    cache.on_page_visited(entry("b.com", 1));
    assert_eq!(urls(&cache.use_history().await), ["a.com"]);
}
