use super::*;
use crate::engines::ResponseFormat;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_URL: &str = "https://search.test/?q=%s";

fn terms(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn search_for(server: &MockServer) -> Arc<CompletionSearch> {
    let engine = CompletionEngine::new(
        "test",
        Some(format!("{}/complete?q=%s", server.uri()).as_str()),
        &[r"^https://search\.test/"],
        ResponseFormat::OpenSearch,
    );
    let dummy = CompletionEngine::new("dummy", None, &["."], ResponseFormat::Empty);
    let config = CompletionConfig {
        debounce_ms: 10,
        request_timeout_ms: 1000,
        ..Default::default()
    };
    Arc::new(CompletionSearch::with_engines(
        vec![Arc::new(engine), Arc::new(dummy)],
        config,
    ))
}

#[test]
fn test_prefix_terms() {
    assert_eq!(
        prefix_terms("https://www.google.com/search?q=javascript+%s").as_deref(),
        Some("javascript")
    );
    assert_eq!(
        prefix_terms("https://www.google.com/search?q=map+of+%s").as_deref(),
        Some("map of")
    );
    assert_eq!(prefix_terms("https://www.google.com/search?q=%s"), None);
}

#[tokio::test]
async fn test_uncompletable_queries() {
    let server = MockServer::start().await;
    let search = search_for(&server);

    assert_eq!(search.complete_cached(SEARCH_URL, &terms(&["abc"])), Some(vec![]));
    assert_eq!(search.complete_cached(SEARCH_URL, &terms(&["example.com"])), Some(vec![]));
    assert_eq!(
        search.complete_cached(SEARCH_URL, &terms(&["javascript:alert(1)"])),
        Some(vec![])
    );
    assert_eq!(search.complete_cached(SEARCH_URL, &terms(&["rust", "lang"])), None);
}

#[tokio::test]
async fn test_have_completion_engine() {
    let server = MockServer::start().await;
    let search = search_for(&server);
    assert!(search.have_completion_engine(SEARCH_URL));
    assert!(!search.have_completion_engine("https://elsewhere.test/?q=%s"));
}

#[tokio::test]
async fn test_fetches_lowercases_and_drops_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/complete"))
        .and(query_param("q", "rust t"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"["rust t", ["Rust Traits", "rust t", "rust tutorial"]]"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let search = search_for(&server);
    let query = terms(&["rust", "t"]);
    let results = search.complete(SEARCH_URL, &query).await;
    assert_eq!(results, vec!["rust traits", "rust tutorial"]);

    // Served from the cache; the mock expects a single request.
    assert_eq!(search.complete(SEARCH_URL, &query).await, results);
    assert_eq!(search.complete_cached(SEARCH_URL, &query), Some(results));
}

#[tokio::test]
async fn test_failure_yields_nothing_and_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/complete"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let search = search_for(&server);
    let query = terms(&["broken", "engine"]);
    assert!(search.complete(SEARCH_URL, &query).await.is_empty());
    assert!(search.complete(SEARCH_URL, &query).await.is_empty());
}

#[tokio::test]
async fn test_malformed_body_yields_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let search = search_for(&server);
    assert!(search.complete(SEARCH_URL, &terms(&["some", "query"])).await.is_empty());
}

#[tokio::test]
async fn test_newer_request_supersedes_debounced_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"["q", ["second query result"]]"#))
        .expect(1)
        .mount(&server)
        .await;

    let search = search_for(&server);
    let first_terms = terms(&["first", "query"]);
    let second_terms = terms(&["second", "query"]);
    let (first, second) = tokio::join!(
        search.complete(SEARCH_URL, &first_terms),
        search.complete(SEARCH_URL, &second_terms),
    );
    assert!(first.is_empty());
    assert_eq!(second, vec!["second query result"]);
}

#[tokio::test]
async fn test_cancel_drops_pending_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"["q", ["never"]]"#))
        .expect(0)
        .mount(&server)
        .await;

    let search = search_for(&server);
    let canceller = search.clone();
    let query = terms(&["pending", "query"]);
    let (results, ()) = tokio::join!(search.complete(SEARCH_URL, &query), async move {
        tokio::time::sleep(Duration::from_millis(2)).await;
        canceller.cancel();
    });
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_extended_query_reuses_previous_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/complete"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"["q", ["rust tutorial", "rust tutorials"]]"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let search = search_for(&server);
    search.complete(SEARCH_URL, &terms(&["rust", "t"])).await;

    assert_eq!(
        search.complete_cached(SEARCH_URL, &terms(&["rust", "tut"])),
        Some(vec!["rust tutorial".to_string(), "rust tutorials".to_string()])
    );
    assert_eq!(search.complete_cached(SEARCH_URL, &terms(&["rust", "x"])), None);
}

#[tokio::test]
async fn test_prefixed_search_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/complete"))
        .and(query_param("q", "learn rust now"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"["learn rust now", ["learn rust now fast", "rust now", "learn rusty"]]"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let search = search_for(&server);
    let results = search
        .complete("https://search.test/?q=learn+%s", &terms(&["rust", "now"]))
        .await;
    assert_eq!(results, vec!["rust now fast", "rusty"]);
}
