//! `keyhints complete`: rank suggestions over exported browser data.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::de::DeserializeOwned;
use tracing::info;

use keyhints_completion::{StaticBookmarks, StaticHistory, StaticTabs};
use keyhints_config::Settings;
use keyhints_core::{BrowserEvent, BrowserSources, Kernel};
use keyhints_hints::RecordingActivator;
use keyhints_protocols::{BookmarkNode, CompletionRequest, HistoryEntry, Suggestion, TabInfo};

pub(crate) struct Sources {
    pub history: Option<PathBuf>,
    pub bookmarks: Option<PathBuf>,
    pub tabs: Option<PathBuf>,
}

fn read_json<T: DeserializeOwned + Default>(path: Option<&Path>) -> anyhow::Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

pub(crate) async fn run(
    settings: Settings,
    sources: Sources,
    name: &str,
    query: &str,
    json: bool,
) -> anyhow::Result<()> {
    let history: Vec<HistoryEntry> = read_json(sources.history.as_deref())?;
    let bookmarks: Vec<BookmarkNode> = read_json(sources.bookmarks.as_deref())?;
    let tabs: Vec<TabInfo> = read_json(sources.tabs.as_deref())?;
    info!(
        history = history.len(),
        bookmarks = bookmarks.len(),
        tabs = tabs.len(),
        "loaded browser data"
    );

    let wait = Duration::from_millis(settings.completion.request_timeout_ms) + Duration::from_secs(1);
    let tab_ids: Vec<_> = tabs.iter().map(|t| t.id).collect();
    let browser = BrowserSources::default()
        .with_history(Arc::new(StaticHistory(history)))
        .with_bookmarks(Arc::new(StaticBookmarks(bookmarks)))
        .with_tabs(Arc::new(StaticTabs(tabs)));
    let kernel = Kernel::new(settings, browser, Arc::new(RecordingActivator::new()))?;
    kernel.start().await?;
    for tab_id in tab_ids {
        kernel.dispatch(BrowserEvent::TabActivated { tab_id });
    }

    let mut request = CompletionRequest::new(query).with_name(name);
    request.seen_tab_to_open_completion_list = query.trim().is_empty();
    let mut receiver = kernel.complete(request)?;

    // Later deliveries extend earlier ones; keep the last.
    let mut results: Vec<Suggestion> = Vec::new();
    while let Ok(Some(response)) = tokio::time::timeout(wait, receiver.recv()).await {
        results = response.results;
    }
    kernel.stop().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }
    if results.is_empty() {
        println!("No suggestions.");
        return Ok(());
    }
    for (rank, suggestion) in results.iter().enumerate() {
        println!(
            "{:>2}. [{:?}] {:.3}  {}",
            rank + 1,
            suggestion.kind,
            suggestion.relevancy().unwrap_or_default(),
            suggestion.short_url.as_deref().unwrap_or(&suggestion.url),
        );
        if !suggestion.title.is_empty() {
            println!("      {}", suggestion.title);
        }
    }
    Ok(())
}
